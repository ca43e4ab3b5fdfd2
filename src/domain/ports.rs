use crate::domain::model::{AnalysisOutcome, AnalysisSettings, PatientInfo, Recording};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// 本機路徑或 http(s) URL
    fn input(&self) -> &str;
    fn output_path(&self) -> &str;
    fn model_path(&self) -> &str;
    fn scaler_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn bundle_filename(&self) -> Option<&str>;
    fn settings(&self) -> AnalysisSettings;

    /// 遠端音檔下載逾時（秒）
    fn timeout_seconds(&self) -> u64 {
        30
    }

    fn patient(&self) -> Option<PatientInfo> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Recording>;
    async fn transform(&self, recording: Recording) -> Result<AnalysisOutcome>;
    async fn load(&self, outcome: AnalysisOutcome) -> Result<String>;
}

/// 對單一心動週期的特徵給出「異常」機率
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &[f64]) -> Result<f64>;

    /// 模型預期的特徵數（未知時為 None）
    fn n_features(&self) -> Option<usize>;
}

impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        (**self).predict_proba(features)
    }

    fn n_features(&self) -> Option<usize> {
        (**self).n_features()
    }
}
