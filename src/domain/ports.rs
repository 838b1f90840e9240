use crate::domain::model::{InsightResult, ProfileTarget, ScrapedProfile};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn targets(&self) -> Vec<ProfileTarget>;
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn user_agent(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    /// 兩次請求間的禮貌延遲（毫秒），0 表示全速並發
    fn fetch_delay_ms(&self) -> u64;
    fn engagement_threshold(&self) -> f64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ScrapedProfile>>;
    async fn transform(&self, data: Vec<ScrapedProfile>) -> Result<InsightResult>;
    async fn load(&self, result: InsightResult) -> Result<String>;
}
