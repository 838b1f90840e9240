use httpmock::prelude::*;
use socialinsight::dashboard::server::refresh_worker;
use socialinsight::dashboard::state::RefreshStatus;
use socialinsight::dashboard::DashboardState;
use socialinsight::domain::model::ProfileTarget;
use socialinsight::domain::ports::ConfigProvider;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[derive(Clone)]
struct TestConfig {
    targets: Vec<ProfileTarget>,
}

impl ConfigProvider for TestConfig {
    fn targets(&self) -> Vec<ProfileTarget> {
        self.targets.clone()
    }

    fn output_path(&self) -> &str {
        "./unused"
    }

    fn concurrent_requests(&self) -> usize {
        2
    }

    fn user_agent(&self) -> &str {
        "socialinsight-test/1.0"
    }

    fn request_timeout_secs(&self) -> u64 {
        5
    }

    fn fetch_delay_ms(&self) -> u64 {
        0
    }

    fn engagement_threshold(&self) -> f64 {
        0.05
    }
}

async fn wait_for_refresh(state: &socialinsight::dashboard::DashboardState, minimum: u64) {
    for _ in 0..100 {
        if state.refresh_count.load(Ordering::Relaxed) >= minimum {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "refresh count never reached {} (got {})",
        minimum,
        state.refresh_count.load(Ordering::Relaxed)
    );
}

#[tokio::test]
async fn test_refresh_worker_populates_state_on_startup() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/@alice");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(
                r#"<html><head>
                     <meta property="og:description"
                           content="1,250 Followers, 10 Following, 3 Posts - hi" />
                   </head><body>
                     <article data-likes="100" data-comments="0" data-shares="0"><p>post</p></article>
                   </body></html>"#,
            );
    });

    let config = TestConfig {
        targets: vec![ProfileTarget {
            platform: "pixelgram".to_string(),
            handle: "alice".to_string(),
            url: server.url("/@alice"),
            selectors: None,
        }],
    };

    let state = DashboardState::new();
    let worker_state = state.clone();
    let worker = tokio::spawn(async move {
        // 間隔拉長，讓測試只觀察啟動時的第一次刷新
        refresh_worker(worker_state, config, 3600).await;
    });

    wait_for_refresh(&state, 1).await;

    let stats = state.get_stats().await;
    assert_eq!(stats.profile_count, 1);
    assert_eq!(stats.total_followers, 1_250);
    assert_eq!(stats.total_posts, 1);
    assert_eq!(*state.status.read().await, RefreshStatus::Idle);
    assert_eq!(state.get_history().await.len(), 1);

    worker.abort();
}

#[tokio::test]
async fn test_manual_refresh_triggers_another_cycle() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/@bob");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(
                r#"<html><head>
                     <meta property="og:description"
                           content="900 Followers, 2 Following, 8 Posts - yo" />
                   </head><body></body></html>"#,
            );
    });

    let config = TestConfig {
        targets: vec![ProfileTarget {
            platform: "pixelgram".to_string(),
            handle: "bob".to_string(),
            url: server.url("/@bob"),
            selectors: None,
        }],
    };

    let state = DashboardState::new();
    let worker_state = state.clone();
    let worker = tokio::spawn(async move {
        refresh_worker(worker_state, config, 3600).await;
    });

    wait_for_refresh(&state, 1).await;

    state.request_refresh();
    wait_for_refresh(&state, 2).await;

    assert!(mock.hits() >= 2);
    assert_eq!(state.get_history().await.len(), 2);

    worker.abort();
}

#[tokio::test]
async fn test_refresh_worker_marks_failure_when_all_targets_fail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/@down");
        then.status(503);
    });

    let config = TestConfig {
        targets: vec![ProfileTarget {
            platform: "pixelgram".to_string(),
            handle: "down".to_string(),
            url: server.url("/@down"),
            selectors: None,
        }],
    };

    let state = DashboardState::new();
    let mut rx = state.subscribe();

    let worker_state = state.clone();
    let worker = tokio::spawn(async move {
        refresh_worker(worker_state, config, 3600).await;
    });

    // 等到狀態轉為 Failed
    let mut failed = false;
    for _ in 0..100 {
        if *state.status.read().await == RefreshStatus::Failed {
            failed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(failed, "refresh never transitioned to Failed");

    // 應該收得到 error alert
    let mut saw_alert = false;
    while let Ok(event) = rx.try_recv() {
        if let socialinsight::dashboard::state::DashboardEvent::Alert { level, .. } = event {
            if level == "error" {
                saw_alert = true;
            }
        }
    }
    assert!(saw_alert, "no error alert was broadcast");

    // 儀表板維持空資料，不會塞示範內容
    assert_eq!(state.get_stats().await.profile_count, 0);

    worker.abort();
}
