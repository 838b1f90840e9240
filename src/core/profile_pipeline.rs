use crate::analysis::{frame::Frame, stats};
use crate::core::{
    ConfigProvider, InsightResult, InsightSummary, MetricSnapshot, Pipeline, Post, Profile,
    ScrapedProfile, Storage,
};
use crate::scrape::{extract, ProfileFetcher};
use crate::utils::error::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const REPORT_FILENAME: &str = "insight_report.zip";

pub struct ProfilePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: ProfileFetcher,
}

impl<S: Storage, C: ConfigProvider> ProfilePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let fetcher = ProfileFetcher::new(config.user_agent(), config.request_timeout_secs())?;
        Ok(Self {
            storage,
            config,
            fetcher,
        })
    }

    /// 抓不到任何東西時的示範資料，讓下游流程仍可演示
    fn demo_profiles() -> Vec<ScrapedProfile> {
        let now = Utc::now();
        let seeds: [(&str, u64, u64, u64); 3] = [
            ("demo_art", 12_400, 310, 458),
            ("demo_code", 3_750, 120, 987),
            ("demo_travel", 88_200, 95, 1_302),
        ];

        seeds
            .iter()
            .map(|(handle, followers, following, posts_count)| {
                let posts = (1..=3)
                    .map(|i| Post {
                        author: handle.to_string(),
                        platform: "demo".to_string(),
                        excerpt: format!("Sample post {} from {}", i, handle),
                        likes: followers / 100 * i,
                        comments: followers / 1000 * i,
                        shares: followers / 2000 * i,
                        permalink: None,
                    })
                    .collect();

                ScrapedProfile {
                    profile: Profile {
                        platform: "demo".to_string(),
                        handle: handle.to_string(),
                        display_name: handle.replace('_', " "),
                        bio: "Generated demo profile".to_string(),
                        followers: *followers,
                        following: *following,
                        posts_count: *posts_count,
                        source_url: format!("https://demo.invalid/{}", handle),
                        fetched_at: now,
                    },
                    posts,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ProfilePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<ScrapedProfile>> {
        let targets = self.config.targets();
        let mut scraped = Vec::new();

        if targets.is_empty() {
            tracing::warn!("🔶 No targets configured");
        } else {
            tracing::info!("📡 Fetching {} profile pages", targets.len());
            let results = self
                .fetcher
                .fetch_all(
                    &targets,
                    self.config.concurrent_requests(),
                    self.config.fetch_delay_ms(),
                )
                .await;

            for (target, outcome) in results {
                match outcome {
                    Ok(html) => {
                        let item = extract::parse_profile(&target, &html);
                        tracing::info!(
                            "📥 {}: {} followers, {} posts on page",
                            target.label(),
                            item.profile.followers,
                            item.posts.len()
                        );
                        scraped.push(item);
                    }
                    // 單一目標失敗不中斷整批
                    Err(e) => {
                        tracing::warn!("🔶 Skipping {}: {}", target.label(), e);
                    }
                }
            }
        }

        if scraped.is_empty() {
            tracing::warn!("🔶 No profiles scraped, generating demo data");
            scraped = Self::demo_profiles();
        }

        Ok(scraped)
    }

    async fn transform(&self, data: Vec<ScrapedProfile>) -> Result<InsightResult> {
        let threshold = self.config.engagement_threshold();
        let taken_at = Utc::now();

        let mut snapshots = Vec::new();
        let mut posts = Vec::new();
        let mut highlights = Vec::new();
        let mut followers_by_handle: HashMap<String, u64> = HashMap::new();

        for item in &data {
            let profile = &item.profile;
            followers_by_handle.insert(profile.handle.clone(), profile.followers);

            // 檔案層級互動率 = 各貼文互動率平均
            let post_rates: Vec<f64> = item
                .posts
                .iter()
                .map(|p| stats::engagement_rate(p.likes, p.comments, p.shares, profile.followers))
                .collect();
            let profile_rate = stats::mean(&post_rates).unwrap_or(0.0);

            snapshots.push(MetricSnapshot {
                platform: profile.platform.clone(),
                handle: profile.handle.clone(),
                taken_at,
                followers: profile.followers,
                following: profile.following,
                posts_count: profile.posts_count,
                engagement_rate: profile_rate,
            });

            posts.extend(item.posts.iter().cloned());
        }

        for post in &posts {
            let followers = followers_by_handle.get(&post.author).copied().unwrap_or(0);
            let rate = stats::engagement_rate(post.likes, post.comments, post.shares, followers);
            if rate > threshold {
                highlights.push(post.clone());
            }
        }

        let mut profile_frame = Frame::from_snapshots(&snapshots);
        profile_frame.sort_desc_by("followers");
        let posts_frame = Frame::from_posts(&posts);

        let followers_series = profile_frame.column_f64("followers");
        let engagement_series = profile_frame.column_f64("engagement_rate");

        let top_profile = snapshots
            .iter()
            .max_by_key(|s| s.followers)
            .map(|s| format!("{}:{}", s.platform, s.handle));

        let summary = InsightSummary {
            generated_at: taken_at,
            profile_count: snapshots.len(),
            post_count: posts.len(),
            total_followers: snapshots.iter().map(|s| s.followers).sum(),
            mean_followers: stats::mean(&followers_series).unwrap_or(0.0),
            median_followers: stats::median(&followers_series).unwrap_or(0.0),
            mean_engagement_rate: stats::mean(&engagement_series).unwrap_or(0.0),
            top_profile,
            top_post_interactions: posts.iter().map(|p| p.interactions()).max().unwrap_or(0),
        };

        tracing::debug!(
            "🔄 Transform summary: {} profiles, {} posts, mean engagement {:.4}",
            summary.profile_count,
            summary.post_count,
            summary.mean_engagement_rate
        );

        Ok(InsightResult {
            snapshots,
            posts,
            profiles_csv: profile_frame.to_csv()?,
            posts_tsv: posts_frame.to_tsv()?,
            summary,
            highlights,
        })
    }

    async fn load(&self, result: InsightResult) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), REPORT_FILENAME);

        tracing::debug!(
            "💾 Creating report bundle with {} files",
            3 + if result.highlights.is_empty() { 0 } else { 1 }
        );

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("profiles.csv", FileOptions::default())?;
            zip.write_all(result.profiles_csv.as_bytes())?;

            zip.start_file::<_, ()>("posts.tsv", FileOptions::default())?;
            zip.write_all(result.posts_tsv.as_bytes())?;

            zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
            let summary_json = serde_json::to_string_pretty(&result.summary)?;
            zip.write_all(summary_json.as_bytes())?;

            // 沒有超標貼文就不寫 highlights
            if !result.highlights.is_empty() {
                zip.start_file::<_, ()>("highlights.json", FileOptions::default())?;
                let highlights_json = serde_json::to_string_pretty(&result.highlights)?;
                zip.write_all(highlights_json.as_bytes())?;
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("💾 Writing report bundle ({} bytes)", zip_data.len());
        self.storage.write_file(REPORT_FILENAME, &zip_data).await?;

        Ok(output_path)
    }
}
