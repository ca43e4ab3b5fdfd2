use crate::core::ConfigProvider;
use crate::domain::model::{AnalysisSettings, PatientInfo};
use crate::utils::error::{AnalysisError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_location, validate_non_empty_string, validate_one_of,
    validate_path, validate_positive_number, validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use super::OUTPUT_FORMATS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub model: ModelConfig,
    pub load: LoadConfig,
    /// [signal] / [detection] / [features]，未設定時使用預設值
    #[serde(flatten)]
    pub analysis: AnalysisSettings,
    pub monitoring: Option<MonitoringConfig>,
    pub patient: Option<PatientInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_path: String,
    pub scaler_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

/// HTTP 服務設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
    pub upload_dir: String,
    pub max_upload_mb: usize,
    pub json_logs: bool,
    /// 分析後保留上傳檔，預設刪除
    pub keep_uploads: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: "uploads".to_string(),
            max_upload_mb: 25,
            json_logs: false,
            keep_uploads: false,
        }
    }
}

impl Validate for ServerSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.address", &self.address)?;
        validate_path("server.upload_dir", &self.upload_dir)?;
        validate_range("server.max_upload_mb", self.max_upload_mb, 1, 1024)?;
        Ok(())
    }
}

/// `cardio-server --config` 使用的設定檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub model: ModelConfig,
    #[serde(flatten)]
    pub analysis: AnalysisSettings,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AnalysisError::IoError)?;
        parse_toml(&content)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.server.validate()?;
        validate_path("model.model_path", &self.model.model_path)?;
        validate_path("model.scaler_path", &self.model.scaler_path)?;
        self.analysis.validate()
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

/// 替換環境變數 (例如 ${MODEL_DIR})；未定義的變數保持原樣
pub fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let processed = substitute_env_vars(content);
    toml::from_str(&processed).map_err(|e| AnalysisError::ConfigValidationError {
        field: "toml_parsing".to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AnalysisError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_location("source.input", &self.source.input)?;
        if let Some(timeout) = self.source.timeout_seconds {
            validate_positive_number("source.timeout_seconds", timeout as usize, 1)?;
        }

        validate_path("model.model_path", &self.model.model_path)?;
        validate_path("model.scaler_path", &self.model.scaler_path)?;

        validate_path("load.output_path", &self.load.output_path)?;
        validate_one_of("load.output_formats", &self.load.output_formats, &OUTPUT_FORMATS)?;
        if let Some(compression) = self.load.compression.as_ref().filter(|c| c.enabled) {
            validate_file_extensions(
                "load.compression.filename",
                std::slice::from_ref(&compression.filename),
                &["zip"],
            )?;
        }

        self.analysis.validate()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input(&self) -> &str {
        &self.source.input
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn model_path(&self) -> &str {
        &self.model.model_path
    }

    fn scaler_path(&self) -> &str {
        &self.model.scaler_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    fn settings(&self) -> AnalysisSettings {
        self.analysis.clone()
    }

    fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(30)
    }

    fn patient(&self) -> Option<PatientInfo> {
        self.patient.clone().filter(|p| !p.is_empty())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
