//! Axum server setup: routes, CORS, background tasks and graceful shutdown.

use crate::dashboard::handlers::{
    api_events, api_history, api_posts, api_profiles, api_refresh, api_stats, health_check,
    index_page, posts_page, profiles_page, trends_page,
};
use crate::dashboard::sse::heartbeat_broadcaster;
use crate::dashboard::state::DashboardState;
use crate::domain::ports::ConfigProvider;
use crate::scrape::{extract, ProfileFetcher};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    /// 自動刷新的間隔（秒）
    pub refresh_seconds: u64,
    pub enable_cors: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            refresh_seconds: 300,
            enable_cors: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("INSIGHT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("INSIGHT_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            refresh_seconds: std::env::var("INSIGHT_REFRESH_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            enable_cors: std::env::var("INSIGHT_CORS")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(true),
        }
    }
}

pub struct DashboardServer {
    state: Arc<DashboardState>,
    config: DashboardConfig,
}

impl DashboardServer {
    pub fn new(state: Arc<DashboardState>) -> Self {
        Self {
            state,
            config: DashboardConfig::default(),
        }
    }

    pub fn with_config(state: Arc<DashboardState>, config: DashboardConfig) -> Self {
        Self { state, config }
    }

    fn build_router(&self) -> Router {
        let cors = if self.config.enable_cors {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        } else {
            CorsLayer::new()
        };

        Router::new()
            // HTML pages
            .route("/", get(index_page))
            .route("/profiles", get(profiles_page))
            .route("/posts", get(posts_page))
            .route("/trends", get(trends_page))
            // API routes
            .route("/api/profiles", get(api_profiles))
            .route("/api/posts", get(api_posts))
            .route("/api/stats", get(api_stats))
            .route("/api/history", get(api_history))
            .route("/api/events", get(api_events))
            // Control routes
            .route("/api/refresh", post(api_refresh))
            // Health check
            .route("/health", get(health_check))
            .route("/styles.css", get(serve_styles))
            .with_state(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!("Starting insight dashboard at http://{}", addr);

        let router = self.build_router();

        let state_for_heartbeat = self.state.clone();
        tokio::spawn(async move {
            heartbeat_broadcaster(state_for_heartbeat).await;
        });

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Dashboard ready at http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Dashboard server shut down");
        Ok(())
    }
}

/// 背景刷新：定時或被手動喚醒時重新抓所有目標
pub async fn refresh_worker<C: ConfigProvider>(
    state: Arc<DashboardState>,
    config: C,
    refresh_seconds: u64,
) {
    let fetcher = match ProfileFetcher::new(config.user_agent(), config.request_timeout_secs()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("❌ Refresh worker could not build HTTP client: {}", e);
            return;
        }
    };

    let mut interval = tokio::time::interval(Duration::from_secs(refresh_seconds.max(5)));

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = state.refresh_requested.notified() => {
                info!("🔄 Manual refresh requested");
            }
        }

        run_refresh(&state, &config, &fetcher).await;
    }
}

async fn run_refresh<C: ConfigProvider>(
    state: &Arc<DashboardState>,
    config: &C,
    fetcher: &ProfileFetcher,
) {
    let targets = config.targets();
    if targets.is_empty() {
        state.mark_failed("No targets configured").await;
        return;
    }

    state.mark_refreshing().await;
    info!("📡 Refreshing {} profiles", targets.len());

    let results = fetcher
        .fetch_all(
            &targets,
            config.concurrent_requests(),
            config.fetch_delay_ms(),
        )
        .await;

    let mut profiles = Vec::new();
    let mut posts = Vec::new();
    let mut failures = 0usize;

    for (target, outcome) in results {
        match outcome {
            Ok(html) => {
                let scraped = extract::parse_profile(&target, &html);
                posts.extend(scraped.posts);
                profiles.push(scraped.profile);
            }
            Err(e) => {
                failures += 1;
                tracing::warn!("🔶 Refresh skipping {}: {}", target.label(), e);
            }
        }
    }

    if profiles.is_empty() {
        state
            .mark_failed(&format!("All {} targets failed to refresh", failures))
            .await;
        return;
    }

    if failures > 0 {
        state.broadcast(crate::dashboard::state::DashboardEvent::Alert {
            level: "warning".to_string(),
            message: format!("{} targets failed during refresh", failures),
        });
    }

    state.apply_refresh(profiles, posts).await;
    info!("✅ Dashboard refreshed");
}

/// Serve the stylesheet (embedded at build time)
async fn serve_styles() -> impl IntoResponse {
    let css = include_str!("../../static/styles.css");
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/css")], css)
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.refresh_seconds, 300);
        assert!(config.enable_cors);
    }

    #[tokio::test]
    async fn test_router_builds() {
        let state = DashboardState::new();
        let server = DashboardServer::new(state);
        let _router = server.build_router();
        // Router should build without panicking
    }
}
