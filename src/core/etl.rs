use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through its three phases in strict sequence, each
/// phase fully consuming its predecessor's output.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
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
        tracing::info!("Starting disclosure ETL");

        tracing::info!("Extracting quarterly batches and registry...");
        let data = self.pipeline.extract().await?;
        let record_count: usize = data.batches.iter().map(|b| b.len()).sum();
        tracing::info!(
            "Extracted {} records across {} batches",
            record_count,
            data.batches.len()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("Transforming: consolidate, validate, enrich, aggregate...");
        let result = self.pipeline.transform(data).await?;
        tracing::info!(
            "Transformed {} records into {} aggregate groups",
            result.enriched.len(),
            result.aggregates.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Loading output tables...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
