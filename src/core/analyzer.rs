use crate::domain::model::{
    AnalysisOutcome, AnalysisReport, AnalysisSettings, CycleWindow, PatientInfo, Recommendation,
    Recording, RenderedCharts, RiskLevel,
};
use crate::domain::ports::Classifier;
use crate::domain::services::{classify_heart_rate, cycle_label, grade_probability, recommendations};
use crate::dsp::{
    find_peaks, hilbert_envelope, mean, normalize_peak, resample, BandPassFilter, MfccExtractor,
    PeakOptions,
};
use crate::render::{self, WaveformInput};
use crate::utils::error::{AnalysisError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// 依報告顯示的心率 (小數一位) 給建議
fn report_recommendations(risk: RiskLevel, heart_rate: f64) -> Vec<Recommendation> {
    recommendations(risk, round_to(heart_rate, 1))
}

/// 峰值偵測的中間結果
#[derive(Debug, Clone)]
pub struct BeatDetection {
    pub filtered: Vec<f64>,
    pub envelope: Vec<f64>,
    pub peaks: Vec<usize>,
    pub sample_rate: u32,
}

impl BeatDetection {
    pub fn rr_intervals(&self) -> Vec<f64> {
        let fs = f64::from(self.sample_rate);
        self.peaks
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64 / fs)
            .collect()
    }

    pub fn heart_rate(&self) -> f64 {
        let rr = self.rr_intervals();
        let mean_rr = mean(&rr);
        if mean_rr <= 0.0 {
            return 0.0;
        }
        60.0 / mean_rr
    }

    /// 第 i 個週期從 peaks[i] 到 peaks[i + 2]
    pub fn cycle_bounds(&self) -> Vec<(usize, usize)> {
        self.peaks.windows(3).map(|w| (w[0], w[2])).collect()
    }
}

pub struct HeartSoundAnalyzer<C: Classifier> {
    settings: AnalysisSettings,
    classifier: C,
    filter: BandPassFilter,
    mfcc: MfccExtractor,
}

impl<C: Classifier> HeartSoundAnalyzer<C> {
    pub fn new(settings: AnalysisSettings, classifier: C) -> Result<Self> {
        settings.validate()?;

        let signal = &settings.signal;
        let fs = f64::from(signal.target_sample_rate);
        let filter =
            BandPassFilter::butterworth(signal.lowcut_hz, signal.highcut_hz, fs, signal.filter_order)?;

        let expected = settings.features.feature_len();
        if let Some(found) = classifier.n_features() {
            if found != expected {
                return Err(AnalysisError::FeatureMismatch { expected, found });
            }
        }

        let mfcc = MfccExtractor::new(&settings.features, signal.target_sample_rate);

        Ok(Self {
            settings,
            classifier,
            filter,
            mfcc,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// 峰值最小間距 (樣本數)，無條件進位
    pub fn min_peak_distance(&self) -> usize {
        let fs = f64::from(self.settings.signal.target_sample_rate);
        (self.settings.detection.min_peak_distance_seconds * fs)
            .ceil()
            .max(1.0) as usize
    }

    /// 重新取樣、正規化、帶通濾波後找出心音峰值
    pub fn detect_beats(&self, recording: &Recording) -> Result<BeatDetection> {
        recording.check_sample_rate()?;
        let target = self.settings.signal.target_sample_rate;
        let samples = if recording.sample_rate == target {
            recording.samples.clone()
        } else {
            tracing::debug!(
                "Resampling {} from {} Hz to {} Hz",
                recording.source,
                recording.sample_rate,
                target
            );
            resample(&recording.samples, recording.sample_rate, target)?
        };

        let normalized = normalize_peak(&samples)?;
        let filtered = self.filter.filtfilt(&normalized);
        let envelope = hilbert_envelope(&filtered);

        let detection = &self.settings.detection;
        let peaks = find_peaks(
            &envelope,
            &PeakOptions {
                height: Some(mean(&envelope) * detection.height_factor),
                distance: Some(self.min_peak_distance()),
            },
        );

        tracing::debug!("Detected {} peaks in {}", peaks.len(), recording.source);

        if peaks.len() < detection.min_peaks {
            return Err(AnalysisError::InsufficientBeats {
                found: peaks.len(),
                required: detection.min_peaks,
            });
        }

        Ok(BeatDetection {
            filtered,
            envelope,
            peaks,
            sample_rate: target,
        })
    }

    /// 每個心動週期的異常機率
    pub fn score_cycles(&self, detection: &BeatDetection) -> Result<Vec<f64>> {
        detection
            .cycle_bounds()
            .into_iter()
            .map(|(start, end)| {
                let features = self.mfcc.extract(&detection.filtered[start..end]);
                self.classifier.predict_proba(&features)
            })
            .collect()
    }

    pub fn analyze(&self, recording: &Recording) -> Result<AnalysisOutcome> {
        self.analyze_with_patient(recording, None)
    }

    pub fn analyze_with_patient(
        &self,
        recording: &Recording,
        patient: Option<PatientInfo>,
    ) -> Result<AnalysisOutcome> {
        let detection = self.detect_beats(recording)?;
        let probabilities = self.score_cycles(&detection)?;

        let probability = probabilities.iter().copied().fold(0.0, f64::max);
        let grade = grade_probability(probability);
        let risk = grade.risk_level();
        let heart_rate = detection.heart_rate();
        let hr_status = classify_heart_rate(heart_rate);

        let fs = f64::from(detection.sample_rate);
        let duration = detection.filtered.len() as f64 / fs;
        let spans: Vec<(f64, f64)> = detection
            .cycle_bounds()
            .into_iter()
            .map(|(start, end)| (start as f64 / fs, end as f64 / fs))
            .collect();

        let cycles = spans
            .iter()
            .zip(&probabilities)
            .enumerate()
            .map(|(index, (&(start, end), &p))| CycleWindow {
                index,
                start_seconds: round_to(start, 3),
                end_seconds: round_to(end, 3),
                probability: round_to(p, 3),
                label: cycle_label(p).to_string(),
            })
            .collect();

        let charts = RenderedCharts {
            waveform_svg: render::render_waveform(&WaveformInput {
                signal: &detection.filtered,
                sample_rate: detection.sample_rate,
                peaks: &detection.peaks,
                probabilities: &probabilities,
                heart_rate,
                hr_status,
            }),
            timeline_svg: render::render_timeline(&spans, &probabilities, duration),
        };

        tracing::info!(
            "💓 {}: {} (p={:.3}), {:.1} BPM, {} cycles",
            recording.source,
            grade.label(),
            probability,
            heart_rate,
            probabilities.len()
        );

        let report = AnalysisReport {
            prediction: grade.label().to_string(),
            probability: round_to(probability, 3),
            heart_rate: round_to(heart_rate, 1),
            hr_status: hr_status.label().to_string(),
            risk_level: risk,
            num_cycles: probabilities.len(),
            images: vec![
                render::to_base64(&charts.waveform_svg),
                render::to_base64(&charts.timeline_svg),
            ],
            image_mime: render::SVG_MIME.to_string(),
            cycles,
            rr_intervals: detection
                .rr_intervals()
                .into_iter()
                .map(|rr| round_to(rr, 3))
                .collect(),
            duration_seconds: round_to(recording.duration_seconds(), 3),
            sample_rate: recording.sample_rate,
            recommendations: report_recommendations(risk, heart_rate),
            source: recording.source.clone(),
            analyzed_at: Utc::now(),
            patient: patient.filter(|p| !p.is_empty()),
        };

        Ok(AnalysisOutcome { report, charts })
    }
}
