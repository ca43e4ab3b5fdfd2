pub mod analyzer;
pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{AnalysisOutcome, AnalysisReport, AnalysisSettings, Recording};
pub use crate::domain::ports::{Classifier, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use analyzer::HeartSoundAnalyzer;
