pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{AnalysisSettings, PatientInfo};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_location, validate_non_empty_string, validate_one_of,
    validate_path, Validate,
};
#[cfg(feature = "clap")]
use clap::Parser;
use serde::{Deserialize, Serialize};

/// load 階段支援的輸出格式
pub const OUTPUT_FORMATS: [&str; 3] = ["json", "csv", "svg"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(Parser))]
#[cfg_attr(feature = "clap", command(name = "cardio-etl"))]
#[cfg_attr(
    feature = "clap",
    command(about = "Analyze a heart sound recording and write a report")
)]
pub struct CliConfig {
    /// WAV 檔路徑或 http(s) URL
    #[cfg_attr(feature = "clap", arg(long))]
    pub input: String,

    #[cfg_attr(feature = "clap", arg(long, default_value = "./output"))]
    pub output_path: String,

    #[cfg_attr(feature = "clap", arg(long, default_value = "models/heart_model.json"))]
    pub model: String,

    #[cfg_attr(feature = "clap", arg(long, default_value = "models/scaler.json"))]
    pub scaler: String,

    #[cfg_attr(
        feature = "clap",
        arg(long, value_delimiter = ',', default_value = "json,csv,svg")
    )]
    pub formats: Vec<String>,

    /// 將所有輸出打包成此 ZIP 檔名
    #[cfg_attr(feature = "clap", arg(long))]
    pub bundle: Option<String>,

    #[cfg_attr(feature = "clap", arg(long, default_value = "30"))]
    pub timeout_seconds: u64,

    #[cfg_attr(feature = "clap", arg(long))]
    pub patient_id: Option<String>,

    #[cfg_attr(feature = "clap", arg(long))]
    pub age: Option<u32>,

    #[cfg_attr(feature = "clap", arg(long))]
    pub gender: Option<String>,

    #[cfg_attr(feature = "clap", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "clap", arg(long, help = "Log CPU and memory usage per phase"))]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn input(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn model_path(&self) -> &str {
        &self.model
    }

    fn scaler_path(&self) -> &str {
        &self.scaler
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn settings(&self) -> AnalysisSettings {
        AnalysisSettings::default()
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn patient(&self) -> Option<PatientInfo> {
        let patient = PatientInfo {
            patient_id: self.patient_id.clone(),
            age: self.age,
            gender: self.gender.clone(),
        };
        (!patient.is_empty()).then_some(patient)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_location("input", &self.input)?;
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("model", &self.model)?;
        validate_non_empty_string("scaler", &self.scaler)?;
        validate_one_of("formats", &self.formats, &OUTPUT_FORMATS)?;
        if let Some(bundle) = &self.bundle {
            validate_file_extensions("bundle", std::slice::from_ref(bundle), &["zip"])?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "clap"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_flags() {
        let config = CliConfig::try_parse_from([
            "cardio-etl",
            "--input",
            "recordings/a.wav",
            "--formats",
            "json,svg",
            "--bundle",
            "out.zip",
            "--age",
            "61",
        ])
        .unwrap();

        assert_eq!(config.formats, vec!["json", "svg"]);
        assert_eq!(config.bundle_filename(), Some("out.zip"));
        assert_eq!(config.timeout_seconds(), 30);
        assert_eq!(config.patient().unwrap().age, Some(61));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_unknown_format() {
        let mut config =
            CliConfig::try_parse_from(["cardio-etl", "--input", "https://example.com/a.wav"])
                .unwrap();
        assert!(config.patient().is_none());
        assert!(config.validate().is_ok());

        config.formats.push("png".to_string());
        assert!(config.validate().is_err());

        config.formats.pop();
        config.bundle = Some("out.tar".to_string());
        assert!(config.validate().is_err());
    }
}
