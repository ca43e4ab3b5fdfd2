#![cfg(feature = "server")]

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use cardio_etl::config::toml_config::ServerSettings;
use cardio_etl::server::Server;
use cardio_etl::HeartSoundModel;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn test_server(dir: &TempDir, intercept: f64) -> TestServer {
    build_server(dir, intercept, true)
}

fn build_server(dir: &TempDir, intercept: f64, keep_uploads: bool) -> TestServer {
    let (model, scaler) = common::write_model_files(dir.path(), intercept);
    let model = HeartSoundModel::load(model, scaler).unwrap();

    let settings = ServerSettings {
        address: "127.0.0.1".to_string(),
        upload_dir: dir.path().join("uploads").to_str().unwrap().to_string(),
        keep_uploads,
        ..ServerSettings::default()
    };
    let server = Server::builder()
        .settings(settings)
        .model(Arc::new(model))
        .build()
        .unwrap();

    TestServer::new(server.router()).unwrap()
}

fn wav_part(data: Vec<u8>, name: &str) -> Part {
    Part::bytes(data).file_name(name).mime_type("audio/wav")
}

#[tokio::test]
async fn test_health_reports_version_and_disables_caching() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir, -2.0);

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("cache-control"),
        "no-store, no-cache, must-revalidate"
    );

    let body: Value = response.json();
    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["analyses"], 0);
}

#[tokio::test]
async fn test_index_serves_upload_page() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir, -2.0);

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"name="audio""#));
    assert!(html.contains("/analyze"));
}

#[tokio::test]
async fn test_analyze_returns_report_and_saves_upload() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir, -2.0);

    let form = MultipartForm::new()
        .add_part("audio", wav_part(common::heartbeat_wav(5, 6.0, 1000), "My Heart.wav"))
        .add_text("patient_id", "P-9")
        .add_text("age", "47")
        .add_text("gender", "");
    let response = server.post("/analyze").multipart(form).await;
    response.assert_status_ok();

    let report: Value = response.json();
    assert_eq!(report["prediction"], "Normal Heart Sound");
    assert_eq!(report["risk_level"], "low");
    assert_eq!(report["num_cycles"], 8);
    assert_eq!(report["image_mime"], "image/svg+xml");
    assert_eq!(report["patient"]["patient_id"], "P-9");
    assert_eq!(report["patient"]["age"], 47);
    assert!(report["patient"].get("gender").is_none());

    let saved: Vec<String> = std::fs::read_dir(dir.path().join("uploads"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].ends_with("_My_Heart.wav"));

    let health: Value = server.get("/health").await.json();
    assert_eq!(health["analyses"], 1);
}

fn uploaded_files(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path().join("uploads"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_uploads_are_removed_after_analysis_by_default() {
    let dir = TempDir::new().unwrap();
    let server = build_server(&dir, -2.0, false);

    let form = MultipartForm::new()
        .add_part("audio", wav_part(common::heartbeat_wav(5, 6.0, 1000), "heart.wav"));
    server.post("/analyze").multipart(form).await.assert_status_ok();
    assert_eq!(uploaded_files(&dir), 0);

    let form = MultipartForm::new().add_part("audio", wav_part(common::single_beat_wav(), "short.wav"));
    server.post("/analyze").multipart(form).await.assert_status_ok();
    assert_eq!(uploaded_files(&dir), 0);
}

#[tokio::test]
async fn test_one_hertz_recording_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = build_server(&dir, -2.0, false);

    let samples = vec![0.25_f32; 20_000];
    let wav = cardio_etl::adapters::encode_wav_mono(&samples, 1).unwrap();
    let form = MultipartForm::new().add_part("audio", wav_part(wav, "slow.wav"));
    let response = server.post("/analyze").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported sample rate 1 Hz"));

    let health: Value = server.get("/health").await.json();
    assert_eq!(health["analyses"], 0);
}

#[tokio::test]
async fn test_insufficient_beats_is_reported_in_body() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir, -2.0);

    let form = MultipartForm::new().add_part("audio", wav_part(common::single_beat_wav(), "short.wav"));
    let response = server.post("/analyze").multipart(form).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["error"], "Not enough heart beats detected");
}

#[tokio::test]
async fn test_rejects_bad_uploads() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir, -2.0);

    let form = MultipartForm::new().add_part("audio", wav_part(b"ID3...".to_vec(), "song.mp3"));
    let response = server.post("/analyze").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("WAV"));

    let form = MultipartForm::new().add_text("patient_id", "P-1");
    let response = server.post("/analyze").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No audio file uploaded");

    let form = MultipartForm::new().add_part("audio", wav_part(b"garbage".to_vec(), "broken.wav"));
    let response = server.post("/analyze").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "The audio file could not be read"
    );
}
