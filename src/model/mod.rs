// 已訓練的心音分類器：特徵標準化加機率分類器，皆由 JSON 載入

pub mod classifier;
pub mod scaler;

pub use classifier::{sigmoid, ClassifierModel, RegressionTree, TreeNode};
pub use scaler::StandardScaler;

use crate::domain::ports::Classifier;
use crate::utils::error::{AnalysisError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct HeartSoundModel {
    scaler: StandardScaler,
    classifier: ClassifierModel,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AnalysisError::model(format!("Cannot read {} '{}': {}", what, path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AnalysisError::model(format!("Invalid {} '{}': {}", what, path.display(), e))
    })
}

impl HeartSoundModel {
    pub fn new(scaler: StandardScaler, classifier: ClassifierModel) -> Result<Self> {
        scaler.check()?;
        classifier.check()?;

        let scaled = scaler.n_features();
        let required = classifier
            .n_features()
            .unwrap_or_else(|| classifier.min_features());
        let consistent = match classifier.n_features() {
            Some(n) => n == scaled,
            None => required <= scaled,
        };
        if !consistent {
            return Err(AnalysisError::FeatureMismatch {
                expected: scaled,
                found: required,
            });
        }

        Ok(Self { scaler, classifier })
    }

    /// 從模型與 scaler 兩個 JSON 檔載入
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, scaler_path: Q) -> Result<Self> {
        let classifier: ClassifierModel = read_json(model_path.as_ref(), "model")?;
        let scaler: StandardScaler = read_json(scaler_path.as_ref(), "scaler")?;

        tracing::info!(
            "Loaded model from {} ({} features)",
            model_path.as_ref().display(),
            scaler.n_features()
        );

        Self::new(scaler, classifier)
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    pub fn classifier(&self) -> &ClassifierModel {
        &self.classifier
    }
}

impl Classifier for HeartSoundModel {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        let scaled = self.scaler.transform(features)?;
        self.classifier.predict_proba(&scaled)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.scaler.n_features())
    }
}
