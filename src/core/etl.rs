use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting heart sound analysis...");
        self.monitor.log_stats("start");

        // Extract
        tracing::info!("📥 Loading recording...");
        let recording = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Loaded {:.2}s of audio at {} Hz",
            recording.duration_seconds(),
            recording.sample_rate
        );
        self.monitor.log_stats("extract");

        // Transform
        tracing::info!("🔬 Analyzing...");
        let outcome = self.pipeline.transform(recording).await?;
        tracing::info!(
            "🔬 {} ({:.1} BPM, {} cycles, risk {})",
            outcome.report.prediction,
            outcome.report.heart_rate,
            outcome.report.num_cycles,
            outcome.report.risk_level.as_str()
        );
        self.monitor.log_stats("transform");

        // Load
        tracing::info!("💾 Writing outputs...");
        let output_path = self.pipeline.load(outcome).await?;
        tracing::info!("✅ Output saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisOutcome, Recording};
    use crate::utils::error::AnalysisError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 只記錄呼叫次數的 pipeline
    #[derive(Default)]
    struct CountingPipeline {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Recording> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Recording::new(vec![0.0; 10], 1000, "mem"))
        }

        async fn transform(&self, _recording: Recording) -> Result<AnalysisOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AnalysisError::InsufficientBeats {
                found: 0,
                required: 3,
            })
        }

        async fn load(&self, _outcome: AnalysisOutcome) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("never".to_string())
        }
    }

    #[tokio::test]
    async fn test_transform_error_stops_before_load() {
        let engine = AnalysisEngine::new(CountingPipeline::default());
        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, AnalysisError::InsufficientBeats { .. }));
        assert_eq!(engine.pipeline.calls.load(Ordering::SeqCst), 2);
    }
}
