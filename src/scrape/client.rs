use crate::domain::model::ProfileTarget;
use crate::utils::error::{InsightError, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;

/// 抓取檔案頁面 HTML 的 HTTP client
pub struct ProfileFetcher {
    client: Client,
}

impl ProfileFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| InsightError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// 抓單一目標頁面，非 2xx 視為失敗
    pub async fn fetch(&self, target: &ProfileTarget) -> Result<String> {
        tracing::debug!("📡 Fetching profile page: {}", target.url);

        let response = self.client.get(&target.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(InsightError::ScrapeError {
                target: target.label(),
                message: format!("HTTP status {}", status),
            });
        }

        let html = response.text().await?;
        tracing::debug!("📡 {}: received {} bytes", target.label(), html.len());
        Ok(html)
    }

    /// 抓取所有目標。單一目標失敗不會中斷整批，結果逐目標回報。
    ///
    /// delay_ms > 0 時改為逐一請求並在中間停頓，避免對同一站台打太快。
    pub async fn fetch_all(
        &self,
        targets: &[ProfileTarget],
        concurrent_requests: usize,
        delay_ms: u64,
    ) -> Vec<(ProfileTarget, Result<String>)> {
        if delay_ms > 0 {
            let mut results = Vec::with_capacity(targets.len());
            for (index, target) in targets.iter().enumerate() {
                let outcome = self.fetch(target).await;
                results.push((target.clone(), outcome));

                if index < targets.len() - 1 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
            return results;
        }

        let concurrency = concurrent_requests.max(1);
        stream::iter(targets.to_vec())
            .map(|target| async move {
                let outcome = self.fetch(&target).await;
                (target, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn target_for(url: String) -> ProfileTarget {
        ProfileTarget {
            platform: "mastodon".to_string(),
            handle: "alice".to_string(),
            url,
            selectors: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body_on_success() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/@alice");
            then.status(200).body("<html><title>alice</title></html>");
        });

        let fetcher = ProfileFetcher::new("socialinsight-test/1.0", 5).unwrap();
        let html = fetcher.fetch(&target_for(server.url("/@alice"))).await.unwrap();

        page.assert();
        assert!(html.contains("alice"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/@gone");
            then.status(404);
        });

        let fetcher = ProfileFetcher::new("socialinsight-test/1.0", 5).unwrap();
        let result = fetcher.fetch(&target_for(server.url("/@gone"))).await;

        page.assert();
        assert!(matches!(result, Err(InsightError::ScrapeError { .. })));
    }

    #[tokio::test]
    async fn test_fetch_all_isolates_failures() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/@ok");
            then.status(200).body("<html></html>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/@broken");
            then.status(500);
        });

        let targets = vec![
            target_for(server.url("/@ok")),
            target_for(server.url("/@broken")),
        ];

        let fetcher = ProfileFetcher::new("socialinsight-test/1.0", 5).unwrap();
        let results = fetcher.fetch_all(&targets, 4, 0).await;

        assert_eq!(results.len(), 2);
        let ok_count = results.iter().filter(|(_, r)| r.is_ok()).count();
        let err_count = results.iter().filter(|(_, r)| r.is_err()).count();
        assert_eq!(ok_count, 1);
        assert_eq!(err_count, 1);
    }
}
