use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Audio decode error: {0}")]
    AudioDecodeError(#[from] hound::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Remote source returned HTTP {status} for {url}")]
    RemoteSourceError { url: String, status: u16 },

    #[error("Recording contains no signal")]
    EmptySignal,

    #[error("Unsupported sample rate {rate} Hz (supported: {min}-{max} Hz)")]
    UnsupportedSampleRate { rate: u32, min: u32, max: u32 },

    #[error("Not enough heart beats detected ({found} peaks, need {required})")]
    InsufficientBeats { found: usize, required: usize },

    #[error("Model error: {message}")]
    ModelError { message: String },

    #[error("Feature length mismatch: expected {expected}, got {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Signal,
    Model,
    Network,
    Storage,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// CLI 的退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Low => 0,      // 警告，但成功
            Self::Medium => 2,   // 可重試
            Self::High => 1,     // 輸入或處理錯誤
            Self::Critical => 3, // 系統錯誤
        }
    }
}

impl AnalysisError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::ModelError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::AudioDecodeError(_) | Self::UnsupportedSampleRate { .. } => ErrorCategory::Input,
            Self::EmptySignal | Self::InsufficientBeats { .. } | Self::ProcessingError { .. } => {
                ErrorCategory::Signal
            }
            Self::ModelError { .. } | Self::FeatureMismatch { .. } => ErrorCategory::Model,
            Self::HttpError(_) | Self::RemoteSourceError { .. } => ErrorCategory::Network,
            Self::IoError(_) => ErrorCategory::Storage,
            Self::ZipError(_) | Self::CsvError(_) | Self::SerializationError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常可以重試
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Signal => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Model | ErrorCategory::Storage | ErrorCategory::Output => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 錯誤是否來自使用者提供的資料（而非系統本身）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Input | ErrorCategory::Signal
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InsufficientBeats { .. } => {
                "Record at least a few seconds of heart sound with the stethoscope held still"
            }
            Self::EmptySignal => "The recording is silent; check the microphone and recording level",
            Self::AudioDecodeError(_) => "Provide an uncompressed WAV file (PCM or 32-bit float)",
            Self::UnsupportedSampleRate { .. } => {
                "Re-export the recording at a common rate such as 4000, 8000 or 44100 Hz"
            }
            Self::HttpError(_) | Self::RemoteSourceError { .. } => {
                "Check that the remote URL is reachable and retry"
            }
            Self::ModelError { .. } => "Verify the model and scaler JSON files were exported correctly",
            Self::FeatureMismatch { .. } => {
                "The feature settings must match the ones the model was trained with"
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration value and run again",
            Self::IoError(_) => "Check that the path exists and is writable",
            Self::ZipError(_) | Self::CsvError(_) | Self::SerializationError(_) => {
                "Check free disk space and permissions on the output directory"
            }
            Self::ProcessingError { .. } => "Try a cleaner or longer recording",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InsufficientBeats { .. } => "Not enough heart beats detected".to_string(),
            Self::EmptySignal => "The recording contains no audible signal".to_string(),
            Self::AudioDecodeError(_) => "The audio file could not be read".to_string(),
            Self::ModelError { .. } | Self::FeatureMismatch { .. } => {
                "The classification model could not be used".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_beats_is_client_error() {
        let err = AnalysisError::InsufficientBeats {
            found: 1,
            required: 3,
        };
        assert_eq!(err.category(), ErrorCategory::Signal);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.is_client_error());
        assert_eq!(err.user_friendly_message(), "Not enough heart beats detected");
    }

    #[test]
    fn test_unsupported_sample_rate_is_input_error() {
        let err = AnalysisError::UnsupportedSampleRate {
            rate: 1,
            min: 1_000,
            max: 384_000,
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.is_client_error());
        assert!(err.user_friendly_message().contains("1 Hz"));
    }

    #[test]
    fn test_model_errors_are_critical() {
        let err = AnalysisError::FeatureMismatch {
            expected: 3380,
            found: 10,
        };
        assert_eq!(err.category(), ErrorCategory::Model);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AnalysisError = io.into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(err.to_string().contains("missing"));
    }
}
