use crate::core::ConfigProvider;
use crate::domain::model::ProfileTarget;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "socialinsight")]
#[command(about = "Scrape public social profiles and build an insight report")]
pub struct CliConfig {
    /// 目標清單，格式 platform:handle=url，逗號分隔
    #[arg(long, value_delimiter = ',')]
    pub targets: Vec<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "4")]
    pub concurrent_requests: usize,

    #[arg(long, default_value = "Mozilla/5.0 (compatible; socialinsight/1.0)")]
    pub user_agent: String,

    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// 兩次請求間的延遲（毫秒）；0 表示全速並發
    #[arg(long, default_value = "0")]
    pub fetch_delay_ms: u64,

    /// 貼文列入精選的最低互動率
    #[arg(long, default_value = "0.05")]
    pub engagement_threshold: f64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        for spec in &self.targets {
            let target = ProfileTarget::parse_spec(spec)?;
            validation::validate_url("targets.url", &target.url)?;
            validation::validate_handle("targets.handle", &target.handle)?;
        }

        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        validation::validate_positive_number("timeout_secs", self.timeout_secs as usize, 1)?;
        validation::validate_range("engagement_threshold", self.engagement_threshold, 0.0, 1.0)?;
        validation::validate_non_empty_string("user_agent", &self.user_agent)?;

        Ok(())
    }
}

impl ConfigProvider for CliConfig {
    fn targets(&self) -> Vec<ProfileTarget> {
        // validate() 先擋掉壞格式；這裡再防一層避免 panic
        self.targets
            .iter()
            .filter_map(|spec| match ProfileTarget::parse_spec(spec) {
                Ok(target) => Some(target),
                Err(e) => {
                    tracing::warn!("🔶 Ignoring malformed target '{}': {}", spec, e);
                    None
                }
            })
            .collect()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn fetch_delay_ms(&self) -> u64 {
        self.fetch_delay_ms
    }

    fn engagement_threshold(&self) -> f64 {
        self.engagement_threshold
    }
}
