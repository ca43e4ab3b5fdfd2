use crate::config::cli::LocalStorage;
use crate::core::Storage;
use crate::utils::error::{AnalysisError, Result};
use crate::utils::validation::is_remote;
use reqwest::Client;
use std::time::Duration;

/// 透過 HTTP GET 讀取音檔；唯讀
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: Client,
}

impl HttpStorage {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Storage for HttpStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading recording from: {}", path);
        let response = self.client.get(path).send().await?;
        let status = response.status();
        tracing::debug!("Remote response status: {}", status);

        if !status.is_success() {
            return Err(AnalysisError::RemoteSourceError {
                url: path.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn write_file(&self, path: &str, _data: &[u8]) -> Result<()> {
        Err(AnalysisError::config(format!(
            "Remote source is read-only, cannot write {}",
            path
        )))
    }
}

/// 依輸入位置選擇本機或遠端讀取
#[derive(Debug, Clone)]
pub enum AudioSource {
    Local(LocalStorage),
    Remote(HttpStorage),
}

impl AudioSource {
    pub fn for_location(location: &str, timeout: Duration) -> Result<Self> {
        if is_remote(location) {
            Ok(Self::Remote(HttpStorage::new(timeout)?))
        } else {
            // 相對路徑以目前工作目錄為準，絕對路徑會覆蓋 base
            Ok(Self::Local(LocalStorage::new(".".to_string())))
        }
    }
}

impl Storage for AudioSource {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self {
            Self::Local(storage) => storage.read_file(path).await,
            Self::Remote(storage) => storage.read_file(path).await,
        }
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        match self {
            Self::Local(storage) => storage.write_file(path, data).await,
            Self::Remote(storage) => storage.write_file(path, data).await,
        }
    }
}
