// 上傳頁面、POST /analyze、GET /health
mod handlers;
mod router;
mod state;

pub use handlers::upload_file_name;
pub use state::{AppState, SharedAnalyzer};

use crate::config::toml_config::{ServerConfig, ServerSettings};
use crate::core::{AnalysisSettings, HeartSoundAnalyzer};
use crate::model::HeartSoundModel;
use crate::utils::validation::Validate;
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    settings: ServerSettings,
    analysis: AnalysisSettings,
    model_paths: Option<(String, String)>,
    model: Option<Arc<HeartSoundModel>>,
}

impl ServerBuilder {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.settings = config.server;
        self.analysis = config.analysis;
        self.model_paths = Some((config.model.model_path, config.model.scaler_path));
        self
    }

    pub fn settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn analysis(mut self, analysis: AnalysisSettings) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    pub fn model_files(mut self, model_path: impl Into<String>, scaler_path: impl Into<String>) -> Self {
        self.model_paths = Some((model_path.into(), scaler_path.into()));
        self
    }

    /// 直接使用已載入的模型，優先於 model_files
    pub fn model(mut self, model: Arc<HeartSoundModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn build(self) -> Result<Server> {
        self.settings.validate()?;

        let model = match (self.model, self.model_paths) {
            (Some(model), _) => model,
            (None, Some((model_path, scaler_path))) => Arc::new(
                HeartSoundModel::load(&model_path, &scaler_path)
                    .with_context(|| format!("Failed to load model from {}", model_path))?,
            ),
            (None, None) => anyhow::bail!("No model configured for the server"),
        };

        let analyzer = HeartSoundAnalyzer::new(self.analysis, model)
            .context("Model does not match the analysis settings")?;

        let address: SocketAddr = format!("{}:{}", self.settings.address, self.settings.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}", self.settings.address))?;

        info!(address = %address, upload_dir = %self.settings.upload_dir, "Initializing server");

        Ok(Server {
            state: AppState::new(
                analyzer,
                &self.settings.upload_dir,
                self.settings.keep_uploads,
            ),
            address,
            max_upload_bytes: self.settings.max_upload_mb * 1024 * 1024,
        })
    }
}

#[must_use = "call .run().await to start the server"]
pub struct Server {
    state: AppState,
    address: SocketAddr,
    max_upload_bytes: usize,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        router::init(self.state.clone(), self.max_upload_bytes)
    }

    /// 監聽直到收到 Ctrl+C 或 SIGTERM
    pub async fn run(self) -> Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.address)
            .await
            .with_context(|| format!("Failed to bind {}", self.address))?;

        info!("🌐 Listening on http://{}", self.address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(e) = shutdown_signal().await {
                    error!("Error while waiting for shutdown signal: {e}");
                    std::future::pending::<()>().await;
                }
                info!("Shutdown signal received, starting graceful shutdown...");
            })
            .await
            .context("HTTP server failed")?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
