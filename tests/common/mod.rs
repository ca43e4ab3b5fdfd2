#![allow(dead_code)]

use cardio_etl::adapters::encode_wav_mono;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// 預設設定下的特徵長度 (13 × 260)
pub const FEATURE_LEN: usize = 13 * 260;

/// S1 每 1.1 秒一次、S2 落後 0.5 秒的合成心音
pub fn heartbeat_samples(beats: usize, seconds: f64, sample_rate: u32) -> Vec<f32> {
    let fs = f64::from(sample_rate);
    let n = (seconds * fs) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / fs;
            let mut v = 0.0;
            for k in 0..beats {
                for (offset, amplitude) in [(0.0, 1.0), (0.5, 0.7)] {
                    let center = 0.3 + k as f64 * 1.1 + offset;
                    let envelope = (-(t - center).powi(2) / (2.0 * 0.02 * 0.02)).exp();
                    v += amplitude * envelope * (2.0 * PI * 80.0 * t).sin();
                }
            }
            (0.6 * v) as f32
        })
        .collect()
}

pub fn heartbeat_wav(beats: usize, seconds: f64, sample_rate: u32) -> Vec<u8> {
    encode_wav_mono(&heartbeat_samples(beats, seconds, sample_rate), sample_rate).unwrap()
}

/// 一秒鐘只有一個心音
pub fn single_beat_wav() -> Vec<u8> {
    let samples: Vec<f32> = heartbeat_samples(1, 1.0, 1000)
        .into_iter()
        .enumerate()
        // 去掉 S2
        .map(|(i, v)| if i > 600 { 0.0 } else { v })
        .collect();
    encode_wav_mono(&samples, 1000).unwrap()
}

/// 寫出零權重的 logistic 模型與恆等 scaler，機率固定為 sigmoid(intercept)
pub fn write_model_files(dir: &Path, intercept: f64) -> (PathBuf, PathBuf) {
    let model_path = dir.join("heart_model.json");
    let scaler_path = dir.join("scaler.json");

    let model = serde_json::json!({
        "type": "logistic",
        "weights": vec![0.0; FEATURE_LEN],
        "intercept": intercept,
    });
    let scaler = serde_json::json!({
        "mean": vec![0.0; FEATURE_LEN],
        "scale": vec![1.0; FEATURE_LEN],
    });

    std::fs::write(&model_path, model.to_string()).unwrap();
    std::fs::write(&scaler_path, scaler.to_string()).unwrap();
    (model_path, scaler_path)
}
