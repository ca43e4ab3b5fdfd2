use crate::core::HeartSoundAnalyzer;
use crate::model::HeartSoundModel;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub type SharedAnalyzer = HeartSoundAnalyzer<Arc<HeartSoundModel>>;

struct Inner {
    analyzer: SharedAnalyzer,
    upload_dir: PathBuf,
    keep_uploads: bool,
    analyses: AtomicU64,
    started: Instant,
}

/// 所有 handler 共用的狀態
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(analyzer: SharedAnalyzer, upload_dir: impl Into<PathBuf>, keep_uploads: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                analyzer,
                upload_dir: upload_dir.into(),
                keep_uploads,
                analyses: AtomicU64::new(0),
                started: Instant::now(),
            }),
        }
    }

    pub fn analyzer(&self) -> &SharedAnalyzer {
        &self.inner.analyzer
    }

    pub fn upload_dir(&self) -> &Path {
        &self.inner.upload_dir
    }

    pub fn keep_uploads(&self) -> bool {
        self.inner.keep_uploads
    }

    /// 成功完成的分析次數
    pub fn analyses(&self) -> u64 {
        self.inner.analyses.load(Ordering::Relaxed)
    }

    pub(crate) fn record_analysis(&self) {
        self.inner.analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.started.elapsed().as_secs()
    }
}
