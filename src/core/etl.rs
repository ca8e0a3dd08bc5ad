use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 依固定順序執行 extract → transform → load，每個階段只跑一次
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting merge pipeline");

        let tables = self.pipeline.extract().await?;
        tracing::info!(
            "📊 Extracted {} company A records and {} company B records",
            tables.company_a.len(),
            tables.company_b.len()
        );
        self.monitor.log_stats("Extract");

        let merged = self.pipeline.transform(tables).await?;
        tracing::info!(
            "📊 Combined dataset: {} rows ({} + {})",
            merged.records.len(),
            merged.company_a_rows,
            merged.company_b_rows
        );
        self.monitor.log_stats("Transform");

        let output_path = self.pipeline.load(merged).await?;
        tracing::info!("📁 Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
