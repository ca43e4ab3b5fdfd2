use crate::utils::error::{AnalysisError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AnalysisError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 輸入可以是本機路徑或 http(s) URL
pub fn validate_location(field_name: &str, location: &str) -> Result<()> {
    if is_remote(location) {
        validate_url(field_name, location)
    } else {
        validate_path(field_name, location)
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(extension.to_ascii_lowercase().as_str()) {
                return Err(AnalysisError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(AnalysisError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: "File has no extension or invalid filename".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_one_of(field_name: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    for value in values {
        if !allowed.contains(&value.as_str()) {
            return Err(AnalysisError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.clone(),
                reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
            });
        }
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AnalysisError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("source.input", "https://example.com/a.wav").is_ok());
        assert!(validate_url("source.input", "http://example.com").is_ok());
        assert!(validate_url("source.input", "").is_err());
        assert!(validate_url("source.input", "invalid-url").is_err());
        assert!(validate_url("source.input", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_location() {
        assert!(validate_location("input", "./recordings/a.wav").is_ok());
        assert!(validate_location("input", "https://example.com/a.wav").is_ok());
        assert!(validate_location("input", "").is_err());
        assert!(validate_location("input", "https://").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("detection.min_peaks", 3, 3).is_ok());
        assert!(validate_positive_number("detection.min_peaks", 2, 3).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["beat.wav".to_string(), "BEAT.WAV".to_string()];
        assert!(validate_file_extensions("audio", &files, &["wav"]).is_ok());

        let invalid_files = vec!["beat.mp3".to_string()];
        assert!(validate_file_extensions("audio", &invalid_files, &["wav"]).is_err());

        let no_extension = vec!["beat".to_string()];
        assert!(validate_file_extensions("audio", &no_extension, &["wav"]).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        let formats = vec!["json".to_string(), "svg".to_string()];
        assert!(validate_one_of("load.output_formats", &formats, &["json", "csv", "svg"]).is_ok());

        let bad = vec!["png".to_string()];
        assert!(validate_one_of("load.output_formats", &bad, &["json", "csv", "svg"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("signal.lowcut_hz", 25.0, 0.1, 1000.0).is_ok());
        assert!(validate_range("signal.lowcut_hz", 0.0, 0.1, 1000.0).is_err());
    }
}
