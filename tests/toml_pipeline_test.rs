use httpmock::prelude::*;
use socialinsight::config::toml_config::TomlConfig;
use socialinsight::core::ConfigProvider;
use socialinsight::utils::validation::Validate;
use socialinsight::{InsightEngine, LocalStorage, ProfilePipeline};
use tempfile::TempDir;

#[tokio::test]
async fn test_toml_driven_run_with_selector_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    // 沒有 og meta 的頁面，計數只能靠 selector 覆寫
    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/u/carol");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(
                r#"<html><body>
                     <div class="stats">
                       <span class="stat-followers">42,100</span>
                       <span class="stat-following">371</span>
                     </div>
                     <article data-likes="900" data-comments="100" data-shares="0">
                       <p>Carol's latest post</p>
                     </article>
                   </body></html>"#,
            );
    });

    let toml_content = format!(
        r#"
[project]
name = "toml-integration"
description = "TOML-driven run"
version = "1.0.0"

[[targets]]
platform = "pixelgram"
handle = "carol"
url = "{}"

[targets.selectors]
followers = ".stat-followers"
following = ".stat-following"

[fetch]
concurrent_requests = 1
timeout_seconds = 5

[analysis]
engagement_threshold = 0.01

[load]
output_path = "{}"
output_formats = ["csv", "tsv", "json"]
"#,
        server.url("/u/carol"),
        output_path
    );

    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    assert!(config.validate().is_ok());

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ProfilePipeline::new(storage, config).unwrap();
    let engine = InsightEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_ok());
    page_mock.assert();

    let full_path = std::path::Path::new(&output_path).join("insight_report.zip");
    let zip_data = std::fs::read(&full_path).unwrap();
    let cursor = std::io::Cursor::new(zip_data);
    let mut archive = zip::ZipArchive::new(cursor).unwrap();

    let mut csv_file = archive.by_name("profiles.csv").unwrap();
    let mut csv_content = String::new();
    std::io::Read::read_to_string(&mut csv_file, &mut csv_content).unwrap();

    // selector 覆寫抓到的數值
    assert!(csv_content.contains("42100"));
    assert!(csv_content.contains("371"));

    // 1000/42100 ≈ 0.024 > 0.01 -> highlight
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(names.contains(&"highlights.json".to_string()));
}

#[tokio::test]
async fn test_toml_env_substitution_reaches_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/@envy");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(
                r#"<html><head>
                     <meta property="og:description"
                           content="77 Followers, 5 Following, 9 Posts - env test" />
                   </head><body></body></html>"#,
            );
    });

    std::env::set_var("INSIGHT_TEST_TARGET_URL", server.url("/@envy"));

    let toml_content = format!(
        r#"
[project]
name = "env-sub"
description = "env substitution"
version = "1.0.0"

[[targets]]
platform = "mastodon"
handle = "envy"
url = "${{INSIGHT_TEST_TARGET_URL}}"

[load]
output_path = "{}"
output_formats = ["csv"]
"#,
        output_path
    );

    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    assert_eq!(config.targets()[0].url, server.url("/@envy"));

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ProfilePipeline::new(storage, config).unwrap();
    let result = InsightEngine::new(pipeline).run().await;

    assert!(result.is_ok());
    page_mock.assert();

    std::env::remove_var("INSIGHT_TEST_TARGET_URL");
}
