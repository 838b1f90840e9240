//! HTTP route handlers for the dashboard: HTML partials, JSON API and controls.

use crate::dashboard::sse::create_sse_stream;
use crate::dashboard::state::{DashboardState, DashboardStats, HistoryPoint};
use crate::domain::model::{Post, Profile};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;

// ============================================================================
// HTML PAGE HANDLERS (HTMX partials)
// ============================================================================

/// 主頁外殼
pub async fn index_page() -> impl IntoResponse {
    Html(include_str!("../../static/index.html"))
}

/// 檔案列表 partial
pub async fn profiles_page(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let profiles = state.profiles.read().await;
    Html(render_profiles_table(&profiles))
}

/// 貼文列表 partial
pub async fn posts_page(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let posts = state.posts.read().await;
    let profiles = state.profiles.read().await;
    Html(render_posts_table(&posts, &profiles))
}

/// 趨勢圖 partial（內嵌 Chart.js 序列）
pub async fn trends_page(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let stats = state.get_stats().await;
    let history = state.get_history().await;
    Html(render_trends(&stats, &history))
}

// ============================================================================
// API HANDLERS (JSON)
// ============================================================================

pub async fn api_profiles(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let profiles = state.profiles.read().await;
    Json(profiles.clone())
}

pub async fn api_posts(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let posts = state.posts.read().await;
    Json(posts.clone())
}

pub async fn api_stats(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    Json(state.get_stats().await)
}

pub async fn api_history(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    Json(state.get_history().await)
}

/// SSE events endpoint
pub async fn api_events(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    create_sse_stream(state)
}

// ============================================================================
// CONTROL HANDLERS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
}

/// 手動觸發一次重新抓取
pub async fn api_refresh(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    state.request_refresh();
    Json(RefreshResponse {
        success: true,
        message: "Refresh scheduled".to_string(),
    })
}

// ============================================================================
// HTML PARTIAL RENDERERS
// ============================================================================

fn render_profiles_table(profiles: &[Profile]) -> String {
    if profiles.is_empty() {
        return r#"
        <div class="empty-state">
            <p>No profiles scraped yet. Waiting for the first refresh...</p>
        </div>
        "#
        .to_string();
    }

    let mut html = String::from(
        r#"
    <table class="data-table">
        <thead>
            <tr>
                <th>Profile</th>
                <th>Platform</th>
                <th class="num">Followers</th>
                <th class="num">Following</th>
                <th class="num">Posts</th>
                <th>Bio</th>
            </tr>
        </thead>
        <tbody>
    "#,
    );

    let mut sorted: Vec<&Profile> = profiles.iter().collect();
    sorted.sort_by(|a, b| b.followers.cmp(&a.followers));

    for profile in sorted {
        html.push_str(&format!(
            r#"
            <tr>
                <td><strong>{}</strong> <span class="muted">@{}</span></td>
                <td>{}</td>
                <td class="num">{}</td>
                <td class="num">{}</td>
                <td class="num">{}</td>
                <td class="bio">{}</td>
            </tr>
        "#,
            html_escape(&profile.display_name),
            html_escape(&profile.handle),
            html_escape(&profile.platform),
            format_count(profile.followers),
            format_count(profile.following),
            format_count(profile.posts_count),
            html_escape(&profile.bio),
        ));
    }

    html.push_str("</tbody></table>");
    html
}

fn render_posts_table(posts: &[Post], profiles: &[Profile]) -> String {
    if posts.is_empty() {
        return r#"
        <div class="empty-state">
            <p>No posts collected yet.</p>
        </div>
        "#
        .to_string();
    }

    let mut html = String::from(
        r#"
    <table class="data-table">
        <thead>
            <tr>
                <th>Author</th>
                <th>Excerpt</th>
                <th class="num">Likes</th>
                <th class="num">Comments</th>
                <th class="num">Shares</th>
                <th class="num">Engagement</th>
            </tr>
        </thead>
        <tbody>
    "#,
    );

    let followers_of = |author: &str| -> u64 {
        profiles
            .iter()
            .find(|p| p.handle == author)
            .map(|p| p.followers)
            .unwrap_or(0)
    };

    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.interactions().cmp(&a.interactions()));

    for post in sorted {
        let followers = followers_of(&post.author);
        let rate = crate::analysis::stats::engagement_rate(
            post.likes,
            post.comments,
            post.shares,
            followers,
        );
        let rate_class = if rate >= 0.05 { "rate-high" } else { "rate-low" };

        html.push_str(&format!(
            r#"
            <tr>
                <td>@{}</td>
                <td class="excerpt">{}</td>
                <td class="num">{}</td>
                <td class="num">{}</td>
                <td class="num">{}</td>
                <td class="num {}">{:.2}%</td>
            </tr>
        "#,
            html_escape(&post.author),
            html_escape(&post.excerpt),
            format_count(post.likes),
            format_count(post.comments),
            format_count(post.shares),
            rate_class,
            rate * 100.0,
        ));
    }

    html.push_str("</tbody></table>");
    html
}

fn render_trends(stats: &DashboardStats, history: &[HistoryPoint]) -> String {
    let labels: Vec<String> = history
        .iter()
        .map(|p| format!("\"{}\"", p.label))
        .collect();
    let follower_data: Vec<String> = history
        .iter()
        .map(|p| p.total_followers.to_string())
        .collect();
    let engagement_data: Vec<String> = history
        .iter()
        .map(|p| format!("{:.4}", p.mean_engagement_rate * 100.0))
        .collect();

    let trend_class = if stats.follower_trend >= 0.0 {
        "trend-up"
    } else {
        "trend-down"
    };

    format!(
        r#"
    <div class="cards">
        <div class="card">
            <div class="card-label">Profiles</div>
            <div class="card-value">{}</div>
        </div>
        <div class="card">
            <div class="card-label">Total Followers</div>
            <div class="card-value">{}</div>
        </div>
        <div class="card">
            <div class="card-label">Mean Engagement</div>
            <div class="card-value">{:.2}%</div>
        </div>
        <div class="card">
            <div class="card-label">Follower Trend</div>
            <div class="card-value {}">{:+.1}/refresh</div>
        </div>
    </div>

    <div class="chart-panel">
        <h3>Followers over time</h3>
        <canvas id="followerChart" height="300"></canvas>
    </div>

    <script>
        (() => {{
            const ctx = document.getElementById('followerChart').getContext('2d');
            if (window._followerChart) {{
                window._followerChart.destroy();
            }}
            window._followerChart = new Chart(ctx, {{
                type: 'line',
                data: {{
                    labels: [{}],
                    datasets: [
                        {{
                            label: 'Total followers',
                            data: [{}],
                            borderColor: 'rgb(59, 130, 246)',
                            backgroundColor: 'rgba(59, 130, 246, 0.1)',
                            fill: true,
                            tension: 0.3,
                            yAxisID: 'y'
                        }},
                        {{
                            label: 'Mean engagement (%)',
                            data: [{}],
                            borderColor: 'rgb(34, 197, 94)',
                            fill: false,
                            tension: 0.3,
                            yAxisID: 'y1'
                        }}
                    ]
                }},
                options: {{
                    responsive: true,
                    scales: {{
                        y: {{ beginAtZero: true, position: 'left' }},
                        y1: {{ beginAtZero: true, position: 'right', grid: {{ drawOnChartArea: false }} }}
                    }}
                }}
            }});
        }})();
    </script>
    "#,
        stats.profile_count,
        format_count(stats.total_followers),
        stats.mean_engagement_rate * 100.0,
        trend_class,
        stats.follower_trend,
        labels.join(", "),
        follower_data.join(", "),
        engagement_data.join(", ")
    )
}

/// 1234567 -> "1.2M" 之類的卡片顯示
fn format_count(value: u64) -> String {
    if value >= 1_000_000_000 {
        format!("{:.1}B", value as f64 / 1_000_000_000.0)
    } else if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 10_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

/// Simple HTML escaping to prevent XSS
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

static START_TIME: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

pub async fn health_check() -> impl IntoResponse {
    let start = START_TIME.get_or_init(std::time::Instant::now);
    let uptime = start.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    })
}
