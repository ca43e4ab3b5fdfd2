use crate::utils::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 可接受的原始取樣率 (Hz)
pub const MIN_SAMPLE_RATE: u32 = 1_000;
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// 單聲道錄音，樣本範圍約在 [-1, 1]
#[derive(Debug, Clone)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub source: String,
}

impl Recording {
    pub fn new(samples: Vec<f32>, sample_rate: u32, source: impl Into<String>) -> Self {
        Self {
            samples,
            sample_rate,
            source: source.into(),
        }
    }

    /// 取樣率過低會讓重新取樣的輸出暴增
    pub fn check_sample_rate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(AnalysisError::UnsupportedSampleRate {
                rate: self.sample_rate,
                min: MIN_SAMPLE_RATE,
                max: MAX_SAMPLE_RATE,
            });
        }
        Ok(())
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub target_sample_rate: u32,
    pub lowcut_hz: f64,
    pub highcut_hz: f64,
    pub filter_order: usize,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            target_sample_rate: 1000,
            lowcut_hz: 25.0,
            highcut_hz: 400.0,
            filter_order: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub min_peak_distance_seconds: f64,
    pub height_factor: f64,
    pub min_peaks: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            min_peak_distance_seconds: 0.4,
            height_factor: 1.2,
            min_peaks: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub n_mfcc: usize,
    pub max_frames: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
}

impl FeatureSettings {
    /// 攤平後的特徵向量長度
    pub fn feature_len(&self) -> usize {
        self.n_mfcc * self.max_frames
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            n_mfcc: 13,
            max_frames: 260,
            n_fft: 512,
            hop_length: 128,
            n_mels: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub signal: SignalSettings,
    pub detection: DetectionSettings,
    pub features: FeatureSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartRateStatus {
    SevereBradycardia,
    MildBradycardia,
    Normal,
    MildTachycardia,
    ModerateTachycardia,
    SevereTachycardia,
}

impl HeartRateStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SevereBradycardia => "Severe Bradycardia",
            Self::MildBradycardia => "Mild Bradycardia",
            Self::Normal => "Normal Heart Rate",
            Self::MildTachycardia => "Mild Tachycardia",
            Self::ModerateTachycardia => "Moderate Tachycardia",
            Self::SevereTachycardia => "Severe Tachycardia",
        }
    }

    /// 圖表上心率框的底色
    pub fn color(&self) -> &'static str {
        match self {
            Self::SevereBradycardia | Self::ModerateTachycardia => "red",
            Self::MildBradycardia | Self::MildTachycardia => "orange",
            Self::Normal => "green",
            Self::SevereTachycardia => "darkred",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundGrade {
    Normal,
    Borderline,
    MildAbnormality,
    SevereAbnormality,
}

impl SoundGrade {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal Heart Sound",
            Self::Borderline => "Murmur / Borderline",
            Self::MildAbnormality => "Mild Abnormality",
            Self::SevereAbnormality => "Severe Abnormality",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Self::Normal => RiskLevel::Low,
            Self::Borderline => RiskLevel::Medium,
            Self::MildAbnormality => RiskLevel::High,
            Self::SevereAbnormality => RiskLevel::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleWindow {
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub probability: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub icon: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl PatientInfo {
    pub fn is_empty(&self) -> bool {
        self.patient_id.is_none() && self.age.is_none() && self.gender.is_none()
    }
}

/// `/analyze` 回應與 report.json 的格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub prediction: String,
    pub probability: f64,
    pub heart_rate: f64,
    pub hr_status: String,
    pub risk_level: RiskLevel,
    pub num_cycles: usize,
    pub images: Vec<String>,
    pub image_mime: String,
    pub cycles: Vec<CycleWindow>,
    pub rr_intervals: Vec<f64>,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub recommendations: Vec<Recommendation>,
    pub source: String,
    pub analyzed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientInfo>,
}

/// 圖表原始內容（SVG 文件）
#[derive(Debug, Clone)]
pub struct RenderedCharts {
    pub waveform_svg: String,
    pub timeline_svg: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub charts: RenderedCharts,
}
