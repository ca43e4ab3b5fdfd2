// 純函式的判讀規則：心率分級、異常機率分級與建議事項

use crate::domain::model::{AnalysisSettings, HeartRateStatus, Recommendation, RiskLevel, SoundGrade};
use crate::utils::error::{AnalysisError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};

/// 異常機率低於此值視為正常
pub const NORMAL_THRESHOLD: f64 = 0.30;
/// 雜音 / 邊界區間上限
pub const MURMUR_THRESHOLD: f64 = 0.45;
/// 輕度異常區間上限
pub const MILD_THRESHOLD: f64 = 0.60;

pub fn classify_heart_rate(bpm: f64) -> HeartRateStatus {
    if bpm < 50.0 {
        HeartRateStatus::SevereBradycardia
    } else if bpm < 60.0 {
        HeartRateStatus::MildBradycardia
    } else if bpm <= 100.0 {
        HeartRateStatus::Normal
    } else if bpm <= 120.0 {
        HeartRateStatus::MildTachycardia
    } else if bpm <= 150.0 {
        HeartRateStatus::ModerateTachycardia
    } else {
        HeartRateStatus::SevereTachycardia
    }
}

pub fn grade_probability(probability: f64) -> SoundGrade {
    if probability < NORMAL_THRESHOLD {
        SoundGrade::Normal
    } else if probability < MURMUR_THRESHOLD {
        SoundGrade::Borderline
    } else if probability < MILD_THRESHOLD {
        SoundGrade::MildAbnormality
    } else {
        SoundGrade::SevereAbnormality
    }
}

/// 時間軸上單一心動週期的標籤
pub fn cycle_label(probability: f64) -> &'static str {
    if probability < NORMAL_THRESHOLD {
        "Normal"
    } else if probability < MURMUR_THRESHOLD {
        "Murmur / Borderline"
    } else {
        "Abnormal"
    }
}

pub fn is_murmur(probability: f64) -> bool {
    probability > MURMUR_THRESHOLD
}

fn rec(icon: &str, text: &str) -> Recommendation {
    Recommendation {
        icon: icon.to_string(),
        text: text.to_string(),
    }
}

pub fn recommendations(risk: RiskLevel, bpm: f64) -> Vec<Recommendation> {
    let mut items = match risk {
        RiskLevel::Low => vec![
            rec(
                "✅",
                "Heart sounds appear normal. Continue regular monitoring and maintain a healthy lifestyle.",
            ),
            rec(
                "💪",
                "Regular exercise and a balanced diet can help maintain cardiovascular health.",
            ),
        ],
        RiskLevel::Medium => vec![
            rec(
                "⚠️",
                "Borderline findings detected. Schedule a follow-up examination with a cardiologist.",
            ),
            rec(
                "🩺",
                "Additional diagnostic tests such as echocardiography may be recommended.",
            ),
            rec(
                "📋",
                "Monitor symptoms such as chest pain, shortness of breath, or palpitations.",
            ),
        ],
        RiskLevel::High => vec![
            rec(
                "🚨",
                "Abnormal findings detected. Immediate consultation with a cardiologist is recommended.",
            ),
            rec(
                "🏥",
                "Comprehensive cardiac evaluation including ECG, echo, and stress test may be required.",
            ),
            rec(
                "👨‍⚕️",
                "Do not delay medical consultation. Early intervention improves outcomes significantly.",
            ),
        ],
        RiskLevel::Critical => vec![
            rec(
                "🆘",
                "URGENT: Severe abnormalities detected. Seek immediate medical attention.",
            ),
            rec(
                "🚑",
                "Contact emergency services or visit the nearest emergency department immediately.",
            ),
            rec(
                "⏰",
                "This is a medical emergency. Do not wait for symptoms to worsen.",
            ),
        ],
    };

    if bpm < 60.0 {
        items.push(rec(
            "🐌",
            "Bradycardia detected (slow heart rate). May require evaluation for underlying causes.",
        ));
    } else if bpm > 100.0 {
        items.push(rec(
            "⚡",
            "Tachycardia detected (fast heart rate). Monitor for anxiety, fever, or cardiac conditions.",
        ));
    }

    items
}

impl Validate for AnalysisSettings {
    fn validate(&self) -> Result<()> {
        let signal = &self.signal;
        validate_range(
            "signal.target_sample_rate",
            signal.target_sample_rate,
            100,
            192_000,
        )?;
        validate_range("signal.filter_order", signal.filter_order, 1, 10)?;

        let nyquist = f64::from(signal.target_sample_rate) / 2.0;
        if signal.lowcut_hz <= 0.0 || signal.lowcut_hz >= signal.highcut_hz {
            return Err(AnalysisError::InvalidConfigValueError {
                field: "signal.lowcut_hz".to_string(),
                value: signal.lowcut_hz.to_string(),
                reason: format!("Must be positive and below highcut ({})", signal.highcut_hz),
            });
        }
        if signal.highcut_hz >= nyquist {
            return Err(AnalysisError::InvalidConfigValueError {
                field: "signal.highcut_hz".to_string(),
                value: signal.highcut_hz.to_string(),
                reason: format!("Must be below the Nyquist frequency ({} Hz)", nyquist),
            });
        }

        let detection = &self.detection;
        validate_range(
            "detection.min_peak_distance_seconds",
            detection.min_peak_distance_seconds,
            0.0,
            5.0,
        )?;
        validate_range("detection.height_factor", detection.height_factor, 0.0, 100.0)?;
        validate_positive_number("detection.min_peaks", detection.min_peaks, 3)?;

        let features = &self.features;
        validate_positive_number("features.n_mfcc", features.n_mfcc, 1)?;
        validate_positive_number("features.max_frames", features.max_frames, 1)?;
        validate_positive_number("features.hop_length", features.hop_length, 1)?;
        validate_positive_number("features.n_mels", features.n_mels, features.n_mfcc)?;
        if features.n_fft < 2 || !features.n_fft.is_power_of_two() {
            return Err(AnalysisError::InvalidConfigValueError {
                field: "features.n_fft".to_string(),
                value: features.n_fft.to_string(),
                reason: "Must be a power of two".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_rate_boundaries() {
        assert_eq!(classify_heart_rate(49.9), HeartRateStatus::SevereBradycardia);
        assert_eq!(classify_heart_rate(50.0), HeartRateStatus::MildBradycardia);
        assert_eq!(classify_heart_rate(60.0), HeartRateStatus::Normal);
        assert_eq!(classify_heart_rate(100.0), HeartRateStatus::Normal);
        assert_eq!(classify_heart_rate(100.1), HeartRateStatus::MildTachycardia);
        assert_eq!(classify_heart_rate(120.0), HeartRateStatus::MildTachycardia);
        assert_eq!(classify_heart_rate(150.0), HeartRateStatus::ModerateTachycardia);
        assert_eq!(classify_heart_rate(151.0), HeartRateStatus::SevereTachycardia);
    }

    #[test]
    fn test_probability_grades() {
        assert_eq!(grade_probability(0.0), SoundGrade::Normal);
        assert_eq!(grade_probability(0.30), SoundGrade::Borderline);
        assert_eq!(grade_probability(0.45), SoundGrade::MildAbnormality);
        assert_eq!(grade_probability(0.60), SoundGrade::SevereAbnormality);
        assert_eq!(grade_probability(0.60).risk_level(), RiskLevel::Critical);
    }

    #[test]
    fn test_cycle_labels_and_murmur() {
        assert_eq!(cycle_label(0.1), "Normal");
        assert_eq!(cycle_label(0.4), "Murmur / Borderline");
        assert_eq!(cycle_label(0.45), "Abnormal");
        // 0.45 在時間軸上已是異常，但波形圖上尚未標為雜音
        assert!(!is_murmur(0.45));
        assert!(is_murmur(0.46));
    }

    #[test]
    fn test_recommendations_by_risk_and_rate() {
        assert_eq!(recommendations(RiskLevel::Low, 75.0).len(), 2);
        assert_eq!(recommendations(RiskLevel::Medium, 75.0).len(), 3);

        let slow = recommendations(RiskLevel::Low, 45.0);
        assert_eq!(slow.len(), 3);
        assert!(slow[2].text.starts_with("Bradycardia"));

        let fast = recommendations(RiskLevel::Critical, 130.0);
        assert_eq!(fast.len(), 4);
        assert!(fast[0].text.starts_with("URGENT"));
        assert!(fast[3].text.starts_with("Tachycardia"));
    }

    #[test]
    fn test_settings_validation() {
        assert!(AnalysisSettings::default().validate().is_ok());

        let mut settings = AnalysisSettings::default();
        settings.signal.highcut_hz = 500.0;
        assert!(settings.validate().is_err());

        let mut settings = AnalysisSettings::default();
        settings.signal.lowcut_hz = 450.0;
        assert!(settings.validate().is_err());

        let mut settings = AnalysisSettings::default();
        settings.features.n_fft = 500;
        assert!(settings.validate().is_err());

        let mut settings = AnalysisSettings::default();
        settings.detection.min_peaks = 2;
        assert!(settings.validate().is_err());
    }
}
