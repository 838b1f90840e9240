use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct InsightEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> InsightEngine<P> {
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
        tracing::info!("🚀 Starting insight pipeline");

        // Extract：抓頁面、解析 HTML
        self.monitor.log_stats("Scrape starting");
        let scraped = self.pipeline.extract().await?;
        tracing::info!("📥 Scraped {} profiles", scraped.len());
        self.monitor.log_stats("Scrape finished");

        // Transform：統計與表格
        let result = self.pipeline.transform(scraped).await?;
        tracing::info!(
            "🔄 Analyzed {} snapshots, {} posts ({} highlights)",
            result.snapshots.len(),
            result.posts.len(),
            result.highlights.len()
        );
        self.monitor.log_stats("Analysis finished");

        // Load：寫出報表
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Report saved to: {}", output_path);

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
