pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod dsp;
pub mod model;
pub mod render;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::TomlConfig, CliConfig};
pub use core::{analyzer::HeartSoundAnalyzer, etl::AnalysisEngine, pipeline::HeartSoundPipeline};
pub use model::HeartSoundModel;
pub use utils::error::{AnalysisError, Result};
