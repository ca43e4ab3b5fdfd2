// 單一心動週期的 MFCC
// 音框置中 (兩側補 n_fft / 2 個零)，週期 Hann 窗；Slaney mel 濾波器組
// 對數功率下限為最大值減 80 dB，正交 DCT-II 取前 n_mfcc 列
use crate::domain::model::FeatureSettings;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

const AMIN: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;

fn log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    let min_log_mel = MIN_LOG_HZ / F_SP;
    if hz >= MIN_LOG_HZ {
        min_log_mel + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    let min_log_mel = MIN_LOG_HZ / F_SP;
    if mel >= min_log_mel {
        MIN_LOG_HZ * (log_step() * (mel - min_log_mel)).exp()
    } else {
        F_SP * mel
    }
}

/// 在 mel 刻度上 fmin 到 fmax 之間等距的 n 個頻率
pub fn mel_frequencies(n: usize, fmin: f64, fmax: f64) -> Vec<f64> {
    let lo = hz_to_mel(fmin);
    let hi = hz_to_mel(fmax);
    if n < 2 {
        return vec![mel_to_hz(lo); n];
    }
    (0..n)
        .map(|i| mel_to_hz(lo + (hi - lo) * i as f64 / (n - 1) as f64))
        .collect()
}

fn mel_filter_bank(sample_rate: f64, n_fft: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate / n_fft as f64)
        .collect();
    let mel_f = mel_frequencies(n_mels + 2, 0.0, sample_rate / 2.0);

    (0..n_mels)
        .map(|i| {
            let lower_width = mel_f[i + 1] - mel_f[i];
            let upper_width = mel_f[i + 2] - mel_f[i + 1];
            let enorm = 2.0 / (mel_f[i + 2] - mel_f[i]);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - mel_f[i]) / lower_width;
                    let upper = (mel_f[i + 2] - f) / upper_width;
                    lower.min(upper).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}

fn dct_matrix(n_mfcc: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let m = n_mels as f64;
    (0..n_mfcc)
        .map(|k| {
            let scale = if k == 0 { (1.0 / m).sqrt() } else { (2.0 / m).sqrt() };
            (0..n_mels)
                .map(|n| scale * (PI * k as f64 * (2 * n + 1) as f64 / (2.0 * m)).cos())
                .collect()
        })
        .collect()
}

pub struct MfccExtractor {
    settings: FeatureSettings,
    window: Vec<f64>,
    mel_basis: Vec<Vec<f64>>,
    dct: Vec<Vec<f64>>,
    fft: Arc<dyn Fft<f64>>,
}

impl MfccExtractor {
    pub fn new(settings: &FeatureSettings, sample_rate: u32) -> Self {
        let n_fft = settings.n_fft;
        let window = (0..n_fft)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n_fft as f64).cos())
            .collect();

        let mut planner = FftPlanner::<f64>::new();

        Self {
            settings: settings.clone(),
            window,
            mel_basis: mel_filter_bank(f64::from(sample_rate), n_fft, settings.n_mels),
            dct: dct_matrix(settings.n_mfcc, settings.n_mels),
            fft: planner.plan_fft_forward(n_fft),
        }
    }

    pub fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    fn power_frames(&self, y: &[f64]) -> Vec<Vec<f64>> {
        let n_fft = self.settings.n_fft;
        let hop = self.settings.hop_length;
        let pad = n_fft / 2;
        let n_frames = 1 + y.len() / hop;
        let n_bins = n_fft / 2 + 1;

        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
        let mut frames = Vec::with_capacity(n_frames);

        for frame in 0..n_frames {
            // 樣本位置 = frame * hop - pad，超出範圍以 0 補齊
            let start = (frame * hop) as isize - pad as isize;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = start + i as isize;
                let sample = if idx >= 0 && (idx as usize) < y.len() {
                    y[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.fft.process(&mut buffer);
            frames.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
        }

        frames
    }

    /// 對數 mel 頻譜，每個音框一個 n_mels 向量
    pub fn log_mel_frames(&self, y: &[f64]) -> Vec<Vec<f64>> {
        let mut frames: Vec<Vec<f64>> = self
            .power_frames(y)
            .iter()
            .map(|power| {
                self.mel_basis
                    .iter()
                    .map(|filter| {
                        let energy: f64 = filter.iter().zip(power).map(|(w, p)| w * p).sum();
                        10.0 * energy.max(AMIN).log10()
                    })
                    .collect()
            })
            .collect();

        let max_db = frames
            .iter()
            .flatten()
            .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let floor = max_db - TOP_DB;
        for value in frames.iter_mut().flatten() {
            *value = value.max(floor);
        }

        frames
    }

    // n_mfcc 列，每個音框一欄
    pub fn mfcc(&self, y: &[f64]) -> Vec<Vec<f64>> {
        let log_mel = self.log_mel_frames(y);
        self.dct
            .iter()
            .map(|basis| {
                log_mel
                    .iter()
                    .map(|frame| basis.iter().zip(frame).map(|(b, v)| b * v).sum())
                    .collect()
            })
            .collect()
    }

    /// 攤平成 n_mfcc * max_frames 的特徵向量，多的音框截掉、不足補零
    pub fn extract(&self, cycle: &[f64]) -> Vec<f64> {
        let max_frames = self.settings.max_frames;
        let mut features = Vec::with_capacity(self.settings.feature_len());

        for row in self.mfcc(cycle) {
            let used = row.len().min(max_frames);
            features.extend_from_slice(&row[..used]);
            features.resize(features.len() + max_frames - used, 0.0);
        }

        features
    }
}
