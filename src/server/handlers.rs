use super::state::AppState;
use crate::adapters::decode_wav;
use crate::domain::model::PatientInfo;
use crate::utils::error::AnalysisError;
use crate::utils::validation::validate_file_extensions;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// 秒
    uptime: u64,
    analyses: u64,
}

pub(super) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(super) async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.uptime_seconds(),
        analyses: state.analyses(),
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// 頁面預期心跳不足時仍是 200 並在 body 帶 error
fn analysis_error(err: &AnalysisError) -> Response {
    let status = match err {
        AnalysisError::InsufficientBeats { .. } => StatusCode::OK,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("❌ Analysis failed: {}", err);
    } else {
        tracing::warn!("⚠️ Rejected recording: {}", err);
    }

    error_body(status, err.user_friendly_message())
}

/// 只保留安全字元，並加上時間前綴避免覆蓋
pub fn upload_file_name(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() {
        "recording.wav"
    } else {
        cleaned
    };

    format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S_%3f"), cleaned)
}

#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    audio: Option<Vec<u8>>,
    patient: PatientInfo,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                form.file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| e.body_text())?;
                form.audio = Some(bytes.to_vec());
            }
            "patient_id" | "age" | "gender" => {
                let value = field.text().await.map_err(|e| e.body_text())?;
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "patient_id" => form.patient.patient_id = Some(value.to_string()),
                    "gender" => form.patient.gender = Some(value.to_string()),
                    _ => {
                        let age = value
                            .parse::<u32>()
                            .map_err(|_| format!("Invalid age: {}", value))?;
                        form.patient.age = Some(age);
                    }
                }
            }
            other => tracing::debug!("Ignoring form field: {}", other),
        }
    }

    Ok(form)
}

pub(super) async fn analyze(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(message) => return error_body(StatusCode::BAD_REQUEST, message),
    };

    let Some(audio) = form.audio.filter(|a| !a.is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "No audio file uploaded");
    };
    let original = form.file_name.unwrap_or_else(|| "recording.wav".to_string());
    if validate_file_extensions("audio", std::slice::from_ref(&original), &["wav"]).is_err() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Unsupported audio format, upload a WAV file",
        );
    }

    let path: PathBuf = state.upload_dir().join(upload_file_name(&original));
    if let Err(e) = save_upload(&path, &audio).await {
        return analysis_error(&e);
    }
    tracing::info!("📁 Saved upload {} ({} bytes)", path.display(), audio.len());

    let patient = (!form.patient.is_empty()).then_some(form.patient);
    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let recording = decode_wav(&audio, &original)?;
        worker.analyzer().analyze_with_patient(&recording, patient)
    })
    .await;

    if !state.keep_uploads() {
        discard_upload(&path).await;
    }

    match result {
        Ok(Ok(outcome)) => {
            state.record_analysis();
            Json(outcome.report).into_response()
        }
        Ok(Err(e)) => analysis_error(&e),
        Err(e) => {
            tracing::error!("❌ Analysis task failed: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Analysis task failed")
        }
    }
}

async fn save_upload(path: &Path, data: &[u8]) -> crate::utils::error::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}

async fn discard_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("⚠️ Could not remove upload {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_file_name_is_sanitized() {
        let name = upload_file_name("../../etc/pass wd.wav");
        assert!(name.ends_with("_pass_wd.wav"));
        assert!(!name.contains('/'));

        let name = upload_file_name("..");
        assert!(name.ends_with("_recording.wav"));

        let name = upload_file_name(".hidden.WAV");
        assert!(name.ends_with("_hidden.WAV"));
    }

    #[test]
    fn test_error_status_mapping() {
        let beats = AnalysisError::InsufficientBeats {
            found: 2,
            required: 3,
        };
        assert_eq!(analysis_error(&beats).status(), StatusCode::OK);
        assert_eq!(
            analysis_error(&AnalysisError::EmptySignal).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            analysis_error(&AnalysisError::model("broken")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
