use crate::core::ConfigProvider;
use crate::domain::model::{ProfileTarget, SelectorOverrides};
use crate::utils::error::{InsightError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub project: ProjectConfig,
    pub targets: Vec<TargetConfig>,
    pub fetch: Option<FetchConfig>,
    pub analysis: Option<AnalysisConfig>,
    pub load: LoadConfig,
    pub dashboard: Option<DashboardSection>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub platform: String,
    pub handle: String,
    pub url: String,
    pub selectors: Option<SelectorOverrides>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub concurrent_requests: Option<usize>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub engagement_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub refresh_seconds: Option<u64>,
    pub enable_cors: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; socialinsight/1.0)";

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(InsightError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| InsightError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PROFILE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(InsightError::MissingConfigError {
                field: "targets".to_string(),
            });
        }

        for target in &self.targets {
            validation::validate_url("targets.url", &target.url)?;
            validation::validate_handle("targets.handle", &target.handle)?;
            validation::validate_non_empty_string("targets.platform", &target.platform)?;
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;

        if let Some(fetch) = &self.fetch {
            if let Some(concurrent) = fetch.concurrent_requests {
                validation::validate_positive_number("fetch.concurrent_requests", concurrent, 1)?;
            }
            if let Some(timeout) = fetch.timeout_seconds {
                validation::validate_positive_number("fetch.timeout_seconds", timeout as usize, 1)?;
            }
        }

        if let Some(analysis) = &self.analysis {
            if let Some(threshold) = analysis.engagement_threshold {
                validation::validate_range("analysis.engagement_threshold", threshold, 0.0, 1.0)?;
            }
        }

        // 驗證輸出格式
        let valid_formats = ["csv", "tsv", "json"];
        for format in &self.load.output_formats {
            if !valid_formats.contains(&format.as_str()) {
                return Err(InsightError::InvalidConfigValueError {
                    field: "load.output_formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        valid_formats.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn dashboard_host(&self) -> String {
        self.dashboard
            .as_ref()
            .and_then(|d| d.host.clone())
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn dashboard_port(&self) -> u16 {
        self.dashboard.as_ref().and_then(|d| d.port).unwrap_or(8080)
    }

    pub fn dashboard_refresh_seconds(&self) -> u64 {
        self.dashboard
            .as_ref()
            .and_then(|d| d.refresh_seconds)
            .unwrap_or(300)
    }

    pub fn dashboard_cors_enabled(&self) -> bool {
        self.dashboard
            .as_ref()
            .and_then(|d| d.enable_cors)
            .unwrap_or(true)
    }
}

impl ConfigProvider for TomlConfig {
    fn targets(&self) -> Vec<ProfileTarget> {
        self.targets
            .iter()
            .map(|t| ProfileTarget {
                platform: t.platform.to_lowercase(),
                handle: t.handle.clone(),
                url: t.url.clone(),
                selectors: t.selectors.clone(),
            })
            .collect()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.fetch
            .as_ref()
            .and_then(|f| f.concurrent_requests)
            .unwrap_or(4)
    }

    fn user_agent(&self) -> &str {
        self.fetch
            .as_ref()
            .and_then(|f| f.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    fn request_timeout_secs(&self) -> u64 {
        self.fetch
            .as_ref()
            .and_then(|f| f.timeout_seconds)
            .unwrap_or(30)
    }

    fn fetch_delay_ms(&self) -> u64 {
        self.fetch.as_ref().and_then(|f| f.delay_ms).unwrap_or(0)
    }

    fn engagement_threshold(&self) -> f64 {
        self.analysis
            .as_ref()
            .and_then(|a| a.engagement_threshold)
            .unwrap_or(0.05)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
