use crate::adapters::{decode_wav, AudioSource};
use crate::core::analyzer::HeartSoundAnalyzer;
use crate::core::{AnalysisOutcome, ConfigProvider, Pipeline, Recording, Storage};
use crate::model::HeartSoundModel;
use crate::utils::error::{AnalysisError, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_FILE: &str = "report.json";
pub const CYCLES_FILE: &str = "cycles.csv";
pub const WAVEFORM_FILE: &str = "waveform.svg";
pub const TIMELINE_FILE: &str = "timeline.svg";

/// 讀取一段錄音、分析並輸出報告
pub struct HeartSoundPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    source: AudioSource,
    analyzer: HeartSoundAnalyzer<Arc<HeartSoundModel>>,
}

impl<S: Storage, C: ConfigProvider> HeartSoundPipeline<S, C> {
    /// 從設定中的路徑載入模型
    pub fn new(storage: S, config: C) -> Result<Self> {
        let model = HeartSoundModel::load(config.model_path(), config.scaler_path())?;
        Self::with_model(storage, config, Arc::new(model))
    }

    pub fn with_model(storage: S, config: C, model: Arc<HeartSoundModel>) -> Result<Self> {
        let source = AudioSource::for_location(
            config.input(),
            Duration::from_secs(config.timeout_seconds()),
        )?;
        let analyzer = HeartSoundAnalyzer::new(config.settings(), model)?;

        Ok(Self {
            storage,
            config,
            source,
            analyzer,
        })
    }

    fn wants(&self, format: &str) -> bool {
        self.config
            .output_formats()
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    fn cycles_csv(outcome: &AnalysisOutcome) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for cycle in &outcome.report.cycles {
            writer.serialize(cycle)?;
        }
        writer
            .into_inner()
            .map_err(|e| AnalysisError::IoError(e.into_error()))
    }

    /// 依輸出格式產生 (檔名, 內容)
    fn render_files(&self, outcome: &AnalysisOutcome) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::new();

        if self.wants("json") {
            let json = serde_json::to_vec_pretty(&outcome.report)?;
            files.push((REPORT_FILE, json));
        }
        if self.wants("csv") {
            files.push((CYCLES_FILE, Self::cycles_csv(outcome)?));
        }
        if self.wants("svg") {
            files.push((WAVEFORM_FILE, outcome.charts.waveform_svg.clone().into_bytes()));
            files.push((TIMELINE_FILE, outcome.charts.timeline_svg.clone().into_bytes()));
        }

        Ok(files)
    }

    fn bundle(files: &[(&'static str, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in files {
            zip.start_file::<_, ()>(*name, FileOptions::default())?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HeartSoundPipeline<S, C> {
    async fn extract(&self) -> Result<Recording> {
        let input = self.config.input();
        tracing::debug!("Reading recording from: {}", input);

        let bytes = self.source.read_file(input).await?;
        let recording = decode_wav(&bytes, input)?;

        tracing::debug!(
            "Decoded {} samples at {} Hz ({:.2}s)",
            recording.samples.len(),
            recording.sample_rate,
            recording.duration_seconds()
        );
        Ok(recording)
    }

    async fn transform(&self, recording: Recording) -> Result<AnalysisOutcome> {
        self.analyzer
            .analyze_with_patient(&recording, self.config.patient())
    }

    async fn load(&self, outcome: AnalysisOutcome) -> Result<String> {
        let files = self.render_files(&outcome)?;
        let output_path = self.config.output_path();

        if let Some(bundle) = self.config.bundle_filename() {
            tracing::debug!("Creating ZIP bundle with {} files", files.len());
            let zip_data = Self::bundle(&files)?;
            self.storage.write_file(bundle, &zip_data).await?;
            return Ok(Path::new(output_path).join(bundle).display().to_string());
        }

        for (name, data) in &files {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            self.storage.write_file(name, data).await?;
        }

        Ok(output_path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::encode_wav_mono;
    use crate::domain::model::{AnalysisSettings, PatientInfo};
    use crate::model::{ClassifierModel, StandardScaler};
    use std::collections::HashMap;
    use std::f64::consts::PI;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AnalysisError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        input: String,
        output_formats: Vec<String>,
        bundle: Option<String>,
        patient: Option<PatientInfo>,
    }

    impl MockConfig {
        fn new(input: String) -> Self {
            Self {
                input,
                output_formats: vec!["json".into(), "csv".into(), "svg".into()],
                bundle: None,
                patient: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn model_path(&self) -> &str {
            "unused.json"
        }

        fn scaler_path(&self) -> &str {
            "unused.json"
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn bundle_filename(&self) -> Option<&str> {
            self.bundle.as_deref()
        }

        fn settings(&self) -> AnalysisSettings {
            AnalysisSettings::default()
        }

        fn patient(&self) -> Option<PatientInfo> {
            self.patient.clone()
        }
    }

    fn model(intercept: f64) -> Arc<HeartSoundModel> {
        let n = AnalysisSettings::default().features.feature_len();
        let classifier = ClassifierModel::Logistic {
            weights: vec![0.0; n],
            intercept,
        };
        Arc::new(HeartSoundModel::new(StandardScaler::identity(n), classifier).unwrap())
    }

    fn write_heartbeat_wav(dir: &TempDir) -> String {
        let fs = 2000u32;
        let samples: Vec<f32> = (0..(6 * fs))
            .map(|i| {
                let t = f64::from(i) / f64::from(fs);
                let mut v = 0.0;
                for k in 0..5 {
                    for (offset, amp) in [(0.0, 1.0), (0.5, 0.7)] {
                        let center = 0.3 + k as f64 * 1.1 + offset;
                        let env = (-(t - center).powi(2) / (2.0 * 0.02 * 0.02)).exp();
                        v += amp * env * (2.0 * PI * 80.0 * t).sin();
                    }
                }
                (v * 0.5) as f32
            })
            .collect();

        let path = dir.path().join("heart.wav");
        std::fs::write(&path, encode_wav_mono(&samples, fs).unwrap()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_extract_decodes_local_wav() {
        let dir = TempDir::new().unwrap();
        let input = write_heartbeat_wav(&dir);
        let pipeline =
            HeartSoundPipeline::with_model(MockStorage::new(), MockConfig::new(input), model(-2.0))
                .unwrap();

        let recording = pipeline.extract().await.unwrap();
        assert_eq!(recording.sample_rate, 2000);
        assert_eq!(recording.samples.len(), 12000);
    }

    #[tokio::test]
    async fn test_full_run_writes_selected_formats() {
        let dir = TempDir::new().unwrap();
        let input = write_heartbeat_wav(&dir);
        let storage = MockStorage::new();
        let mut config = MockConfig::new(input);
        config.output_formats = vec!["json".into(), "csv".into()];
        config.patient = Some(PatientInfo {
            patient_id: Some("P-7".into()),
            age: None,
            gender: None,
        });
        let pipeline = HeartSoundPipeline::with_model(storage.clone(), config, model(-2.0)).unwrap();

        let recording = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(recording).await.unwrap();
        assert_eq!(outcome.report.prediction, "Normal Heart Sound");
        assert_eq!(outcome.report.num_cycles, 8);

        let path = pipeline.load(outcome).await.unwrap();
        assert_eq!(path, "test_output");
        assert_eq!(storage.names().await, vec![CYCLES_FILE, REPORT_FILE]);

        let report: serde_json::Value =
            serde_json::from_slice(&storage.get_file(REPORT_FILE).await.unwrap()).unwrap();
        assert_eq!(report["risk_level"], "low");
        assert_eq!(report["patient"]["patient_id"], "P-7");
        assert_eq!(report["image_mime"], "image/svg+xml");

        let csv = String::from_utf8(storage.get_file(CYCLES_FILE).await.unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "index,start_seconds,end_seconds,probability,label");
        assert_eq!(lines.len(), 9);
        assert!(lines[1].ends_with(",Normal"));
    }

    #[tokio::test]
    async fn test_bundle_contains_every_file() {
        let dir = TempDir::new().unwrap();
        let input = write_heartbeat_wav(&dir);
        let storage = MockStorage::new();
        let mut config = MockConfig::new(input);
        config.bundle = Some("analysis.zip".into());
        let pipeline = HeartSoundPipeline::with_model(storage.clone(), config, model(1.0)).unwrap();

        let recording = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(recording).await.unwrap();
        assert_eq!(outcome.report.prediction, "Severe Abnormality");

        let path = pipeline.load(outcome).await.unwrap();
        assert!(path.ends_with("analysis.zip"));
        assert_eq!(storage.names().await, vec!["analysis.zip"]);

        let zip_data = storage.get_file("analysis.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec![CYCLES_FILE, REPORT_FILE, TIMELINE_FILE, WAVEFORM_FILE]);
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let pipeline = HeartSoundPipeline::with_model(
            MockStorage::new(),
            MockConfig::new("/nonexistent/heart.wav".into()),
            model(0.0),
        )
        .unwrap();

        assert!(matches!(
            pipeline.extract().await,
            Err(AnalysisError::IoError(_))
        ));
    }
}
