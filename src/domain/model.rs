use crate::utils::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 要抓取的社群檔案目標
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileTarget {
    pub platform: String,
    pub handle: String,
    pub url: String,
    /// CSS selector 覆寫（頁面版型不同時使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SelectorOverrides>,
}

/// 各欄位的 CSS selector 覆寫
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectorOverrides {
    pub followers: Option<String>,
    pub following: Option<String>,
    pub posts_count: Option<String>,
    pub post_item: Option<String>,
}

impl ProfileTarget {
    /// 解析 "platform:handle=url" 格式的目標描述
    pub fn parse_spec(spec: &str) -> Result<Self> {
        let (head, url) = spec.split_once('=').ok_or_else(|| {
            InsightError::InvalidConfigValueError {
                field: "targets".to_string(),
                value: spec.to_string(),
                reason: "Expected 'platform:handle=url' format".to_string(),
            }
        })?;

        let (platform, handle) = head.split_once(':').ok_or_else(|| {
            InsightError::InvalidConfigValueError {
                field: "targets".to_string(),
                value: spec.to_string(),
                reason: "Expected 'platform:handle' before '='".to_string(),
            }
        })?;

        if platform.trim().is_empty() || handle.trim().is_empty() {
            return Err(InsightError::InvalidConfigValueError {
                field: "targets".to_string(),
                value: spec.to_string(),
                reason: "Platform and handle cannot be empty".to_string(),
            });
        }

        Ok(Self {
            platform: platform.trim().to_lowercase(),
            handle: handle.trim().to_string(),
            url: url.trim().to_string(),
            selectors: None,
        })
    }

    /// 顯示用的 "platform:handle" 標籤
    pub fn label(&self) -> String {
        format!("{}:{}", self.platform, self.handle)
    }
}

/// 從檔案頁面抓到的基本資料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub platform: String,
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub followers: u64,
    pub following: u64,
    pub posts_count: u64,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
}

/// 單篇貼文與其互動數
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub author: String,
    pub platform: String,
    pub excerpt: String,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

impl Post {
    pub fn interactions(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

/// 抓取階段的輸出：一個檔案加上其貼文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProfile {
    pub profile: Profile,
    pub posts: Vec<Post>,
}

/// 某個時間點的檔案指標（報表的一列）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub platform: String,
    pub handle: String,
    pub taken_at: DateTime<Utc>,
    pub followers: u64,
    pub following: u64,
    pub posts_count: u64,
    pub engagement_rate: f64,
}

/// 分析摘要，會序列化為 summary.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightSummary {
    pub generated_at: DateTime<Utc>,
    pub profile_count: usize,
    pub post_count: usize,
    pub total_followers: u64,
    pub mean_followers: f64,
    pub median_followers: f64,
    pub mean_engagement_rate: f64,
    pub top_profile: Option<String>,
    pub top_post_interactions: u64,
}

/// Transform 階段的完整輸出
#[derive(Debug, Clone)]
pub struct InsightResult {
    pub snapshots: Vec<MetricSnapshot>,
    pub posts: Vec<Post>,
    pub profiles_csv: String,
    pub posts_tsv: String,
    pub summary: InsightSummary,
    /// 互動率超過門檻的貼文
    pub highlights: Vec<Post>,
}
