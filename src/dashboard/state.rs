//! Shared application state for the dashboard.

use crate::analysis::stats;
use crate::domain::model::{Post, Profile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify, RwLock};

/// 趨勢圖保留的資料點數（每 5 分鐘一點約等於一天）
const DEFAULT_MAX_HISTORY: usize = 288;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Idle,
    Refreshing,
    Failed,
}

impl Default for RefreshStatus {
    fn default() -> Self {
        RefreshStatus::Idle
    }
}

impl std::fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshStatus::Idle => write!(f, "idle"),
            RefreshStatus::Refreshing => write!(f, "refreshing"),
            RefreshStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 趨勢圖的一個資料點
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: i64,
    pub label: String,
    pub total_followers: u64,
    pub mean_engagement_rate: f64,
}

/// 儀表板摘要卡片
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub profile_count: usize,
    pub total_followers: u64,
    pub total_posts: usize,
    pub mean_engagement_rate: f64,
    pub top_profile: Option<String>,
    /// 追蹤者總數的每次刷新趨勢斜率
    pub follower_trend: f64,
    pub refresh_count: u64,
    pub last_refresh: Option<String>,
}

/// SSE 廣播事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DashboardEvent {
    #[serde(rename = "stats")]
    Stats(DashboardStats),
    #[serde(rename = "profiles")]
    Profiles(Vec<Profile>),
    #[serde(rename = "snapshot")]
    Snapshot(HistoryPoint),
    #[serde(rename = "status")]
    Status {
        status: RefreshStatus,
        refresh_count: u64,
    },
    #[serde(rename = "alert")]
    Alert { level: String, message: String },
}

pub struct DashboardState {
    pub profiles: RwLock<Vec<Profile>>,
    pub posts: RwLock<Vec<Post>>,
    pub history: RwLock<Vec<HistoryPoint>>,
    pub status: RwLock<RefreshStatus>,
    pub refresh_count: AtomicU64,
    pub last_refresh: RwLock<Option<DateTime<Utc>>>,
    /// 手動刷新用的喚醒訊號
    pub refresh_requested: Notify,
    pub event_tx: broadcast::Sender<DashboardEvent>,
    max_history: usize,
}

impl DashboardState {
    pub fn new() -> Arc<Self> {
        Self::with_history_capacity(DEFAULT_MAX_HISTORY)
    }

    pub fn with_history_capacity(max_history: usize) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(1024);

        Arc::new(Self {
            profiles: RwLock::new(Vec::new()),
            posts: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            status: RwLock::new(RefreshStatus::Idle),
            refresh_count: AtomicU64::new(0),
            last_refresh: RwLock::new(None),
            refresh_requested: Notify::new(),
            event_tx,
            max_history: max_history.max(1),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    /// 廣播事件；沒有訂閱者時忽略錯誤
    pub fn broadcast(&self, event: DashboardEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    pub async fn mark_refreshing(&self) {
        *self.status.write().await = RefreshStatus::Refreshing;
        self.broadcast(DashboardEvent::Status {
            status: RefreshStatus::Refreshing,
            refresh_count: self.refresh_count.load(Ordering::Relaxed),
        });
    }

    pub async fn mark_failed(&self, message: &str) {
        *self.status.write().await = RefreshStatus::Failed;
        self.broadcast(DashboardEvent::Status {
            status: RefreshStatus::Failed,
            refresh_count: self.refresh_count.load(Ordering::Relaxed),
        });
        self.broadcast(DashboardEvent::Alert {
            level: "error".to_string(),
            message: message.to_string(),
        });
        tracing::warn!("🔶 Dashboard refresh failed: {}", message);
    }

    /// 套用一次成功的刷新結果並廣播
    pub async fn apply_refresh(&self, profiles: Vec<Profile>, posts: Vec<Post>) {
        let now = Utc::now();
        let total_followers: u64 = profiles.iter().map(|p| p.followers).sum();

        let engagement_rates: Vec<f64> = profiles
            .iter()
            .map(|profile| {
                let rates: Vec<f64> = posts
                    .iter()
                    .filter(|p| p.author == profile.handle)
                    .map(|p| {
                        stats::engagement_rate(p.likes, p.comments, p.shares, profile.followers)
                    })
                    .collect();
                stats::mean(&rates).unwrap_or(0.0)
            })
            .collect();
        let mean_engagement = stats::mean(&engagement_rates).unwrap_or(0.0);

        let point = HistoryPoint {
            timestamp: now.timestamp(),
            label: now.format("%H:%M").to_string(),
            total_followers,
            mean_engagement_rate: mean_engagement,
        };

        {
            let mut history = self.history.write().await;
            history.push(point.clone());
            // 超過上限就丟最舊的
            while history.len() > self.max_history {
                history.remove(0);
            }
        }

        *self.profiles.write().await = profiles.clone();
        *self.posts.write().await = posts;
        *self.last_refresh.write().await = Some(now);
        *self.status.write().await = RefreshStatus::Idle;
        self.refresh_count.fetch_add(1, Ordering::Relaxed);

        self.broadcast(DashboardEvent::Profiles(profiles));
        self.broadcast(DashboardEvent::Snapshot(point));
        let stats = self.get_stats().await;
        self.broadcast(DashboardEvent::Stats(stats));
    }

    pub async fn get_stats(&self) -> DashboardStats {
        let profiles = self.profiles.read().await;
        let posts = self.posts.read().await;
        let history = self.history.read().await;

        let total_followers: u64 = profiles.iter().map(|p| p.followers).sum();
        let top_profile = profiles
            .iter()
            .max_by_key(|p| p.followers)
            .map(|p| format!("{}:{}", p.platform, p.handle));

        let engagement = history
            .last()
            .map(|point| point.mean_engagement_rate)
            .unwrap_or(0.0);

        let follower_series: Vec<f64> =
            history.iter().map(|p| p.total_followers as f64).collect();
        let follower_trend = stats::trend_slope(&follower_series).unwrap_or(0.0);

        let last_refresh = self
            .last_refresh
            .read()
            .await
            .map(|t| t.to_rfc3339());

        DashboardStats {
            profile_count: profiles.len(),
            total_followers,
            total_posts: posts.len(),
            mean_engagement_rate: engagement,
            top_profile,
            follower_trend,
            refresh_count: self.refresh_count.load(Ordering::Relaxed),
            last_refresh,
        }
    }

    pub async fn get_history(&self) -> Vec<HistoryPoint> {
        self.history.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(handle: &str, followers: u64) -> Profile {
        Profile {
            platform: "pixelgram".to_string(),
            handle: handle.to_string(),
            display_name: handle.to_string(),
            bio: String::new(),
            followers,
            following: 5,
            posts_count: 10,
            source_url: format!("https://example.com/{}", handle),
            fetched_at: Utc::now(),
        }
    }

    fn post(author: &str, likes: u64) -> Post {
        Post {
            author: author.to_string(),
            platform: "pixelgram".to_string(),
            excerpt: "hi".to_string(),
            likes,
            comments: 0,
            shares: 0,
            permalink: None,
        }
    }

    #[tokio::test]
    async fn test_apply_refresh_updates_stats() {
        let state = DashboardState::new();
        state
            .apply_refresh(
                vec![profile("alice", 1_000), profile("bob", 3_000)],
                vec![post("alice", 100)],
            )
            .await;

        let stats = state.get_stats().await;
        assert_eq!(stats.profile_count, 2);
        assert_eq!(stats.total_followers, 4_000);
        assert_eq!(stats.total_posts, 1);
        assert_eq!(stats.top_profile.as_deref(), Some("pixelgram:bob"));
        assert_eq!(stats.refresh_count, 1);
        assert!(stats.last_refresh.is_some());
        assert_eq!(*state.status.read().await, RefreshStatus::Idle);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let state = DashboardState::with_history_capacity(3);

        for i in 0..5u64 {
            state
                .apply_refresh(vec![profile("alice", 100 * i)], vec![])
                .await;
        }

        let history = state.get_history().await;
        assert_eq!(history.len(), 3);
        // 留下的是最新的三筆
        assert_eq!(history[0].total_followers, 200);
        assert_eq!(history[2].total_followers, 400);
    }

    #[tokio::test]
    async fn test_follower_trend_from_history() {
        let state = DashboardState::new();
        for followers in [100u64, 200, 300] {
            state.apply_refresh(vec![profile("alice", followers)], vec![]).await;
        }

        let stats = state.get_stats().await;
        assert!((stats.follower_trend - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_mark_failed_broadcasts_alert() {
        let state = DashboardState::new();
        let mut rx = state.subscribe();

        state.mark_failed("fetch exploded").await;
        assert_eq!(*state.status.read().await, RefreshStatus::Failed);

        // Status 先、Alert 後
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, DashboardEvent::Status { .. }));
        let second = rx.recv().await.unwrap();
        match second {
            DashboardEvent::Alert { level, message } => {
                assert_eq!(level, "error");
                assert!(message.contains("exploded"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_event_sequence() {
        let state = DashboardState::new();
        let mut rx = state.subscribe();

        state.apply_refresh(vec![profile("alice", 10)], vec![]).await;

        let events = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ];
        assert!(matches!(events[0], DashboardEvent::Profiles(_)));
        assert!(matches!(events[1], DashboardEvent::Snapshot(_)));
        assert!(matches!(events[2], DashboardEvent::Stats(_)));
    }
}
