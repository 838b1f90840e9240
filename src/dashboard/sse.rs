//! Server-Sent Events streaming for live dashboard updates.

use crate::dashboard::state::{DashboardEvent, DashboardState};
use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 建立單一客戶端的 SSE 串流：先送目前狀態，之後跟著廣播走
pub fn create_sse_stream(
    state: Arc<DashboardState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.subscribe();

    let stream = stream! {
        if let Ok(stats) = serde_json::to_string(&state.get_stats().await) {
            yield Ok(Event::default().event("stats").data(stats));
        }

        // 先複製再 yield，不讓讀鎖跨越 await 點
        let profiles = state.profiles.read().await.clone();
        if let Ok(json) = serde_json::to_string(&profiles) {
            yield Ok(Event::default().event("profiles").data(json));
        }

        let history = state.get_history().await;
        if let Ok(json) = serde_json::to_string(&history) {
            yield Ok(Event::default().event("history").data(json));
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let (event_type, data) = match &event {
                        DashboardEvent::Stats(stats) => ("stats", serde_json::to_string(stats)),
                        DashboardEvent::Profiles(profiles) => {
                            ("profiles", serde_json::to_string(profiles))
                        }
                        DashboardEvent::Snapshot(point) => {
                            ("snapshot", serde_json::to_string(point))
                        }
                        DashboardEvent::Status { .. } => ("status", serde_json::to_string(&event)),
                        DashboardEvent::Alert { .. } => ("alert", serde_json::to_string(&event)),
                    };

                    match data {
                        Ok(json) => {
                            debug!("SSE sending event: {}", event_type);
                            yield Ok(Event::default().event(event_type).data(json));
                        }
                        Err(e) => {
                            warn!("Failed to serialize SSE event: {}", e);
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    // 慢客戶端跳過舊訊息繼續收
                    warn!("SSE client lagged by {} messages", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    debug!("SSE broadcast channel closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// 週期性廣播狀態心跳，讓閒置頁面也知道系統還活著
pub async fn heartbeat_broadcaster(state: Arc<DashboardState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    loop {
        interval.tick().await;

        let status = *state.status.read().await;
        state.broadcast(DashboardEvent::Status {
            status,
            refresh_count: state
                .refresh_count
                .load(std::sync::atomic::Ordering::Relaxed),
        });
    }
}

/// SSE 資料格式輔助（測試與除錯用）
pub fn format_sse_event(event_type: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event_type, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sse_event() {
        let result = format_sse_event("stats", r#"{"profile_count": 2}"#);
        assert!(result.contains("event: stats"));
        assert!(result.contains("data: {\"profile_count\": 2}"));
        assert!(result.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_sse_stream_creation() {
        let state = DashboardState::new();
        let _sse = create_sse_stream(state);
        // Stream should be created without panic
    }
}
