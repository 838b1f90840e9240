use crate::domain::model::{Post, Profile, ProfileTarget, ScrapedProfile};
use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// 一頁最多收多少貼文
const MAX_POSTS_PER_PROFILE: usize = 20;
/// 貼文摘要截斷長度（字元）
const EXCERPT_CHARS: usize = 280;

/// 把檔案頁面的 HTML 解析成領域物件。
///
/// 缺欄位不視為錯誤：找不到的計數補 0 並記 warn，讓整批抓取不被單頁版型打斷。
pub fn parse_profile(target: &ProfileTarget, html: &str) -> ScrapedProfile {
    let document = Html::parse_document(html);

    let og_title = meta_content(&document, "property", "og:title");
    let og_description = meta_content(&document, "property", "og:description");
    let meta_description = meta_content(&document, "name", "description");

    let display_name = og_title
        .clone()
        .or_else(|| first_text(&document, "title"))
        .map(|t| clean_display_name(&t))
        .unwrap_or_else(|| target.handle.clone());

    // 計數優先順序：selector 覆寫 > meta 描述 > 整頁文字
    let meta_text = [og_description.as_deref(), meta_description.as_deref()]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let body_text = document.root_element().text().collect::<Vec<_>>().join(" ");

    let followers = extract_count(
        target,
        "followers",
        target.selectors.as_ref().and_then(|s| s.followers.as_deref()),
        &document,
        &meta_text,
        &body_text,
    );
    let following = extract_count(
        target,
        "following",
        target.selectors.as_ref().and_then(|s| s.following.as_deref()),
        &document,
        &meta_text,
        &body_text,
    );
    let posts_count = extract_count(
        target,
        "posts",
        target
            .selectors
            .as_ref()
            .and_then(|s| s.posts_count.as_deref()),
        &document,
        &meta_text,
        &body_text,
    );

    let bio = meta_description
        .or(og_description)
        .map(|d| strip_count_prefix(&d))
        .unwrap_or_default();

    let posts = collect_posts(&document, target);

    ScrapedProfile {
        profile: Profile {
            platform: target.platform.clone(),
            handle: target.handle.clone(),
            display_name,
            bio,
            followers,
            following,
            posts_count,
            source_url: target.url.clone(),
            fetched_at: Utc::now(),
        },
        posts,
    }
}

/// "852"、"1.2K"、"3.4M"、"1,234,567" 之類的縮寫數字
pub fn parse_compact_number(raw: &str) -> Option<u64> {
    let cleaned = raw.trim().replace(',', "");
    let (last_idx, last_char) = cleaned.char_indices().last()?;

    let (digits, multiplier) = match last_char {
        'k' | 'K' => (&cleaned[..last_idx], 1_000.0),
        'm' | 'M' => (&cleaned[..last_idx], 1_000_000.0),
        'b' | 'B' => (&cleaned[..last_idx], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    let value: f64 = digits.trim().parse().ok()?;
    if value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

fn extract_count(
    target: &ProfileTarget,
    metric: &str,
    selector_override: Option<&str>,
    document: &Html,
    meta_text: &str,
    body_text: &str,
) -> u64 {
    // 使用者指定的 selector 優先
    if let Some(css) = selector_override {
        match Selector::parse(css) {
            Ok(selector) => {
                if let Some(element) = document.select(&selector).next() {
                    let text = element.text().collect::<Vec<_>>().join(" ");
                    if let Some(value) = first_number_in(&text) {
                        return value;
                    }
                }
                tracing::warn!(
                    "🔶 {}: selector '{}' matched nothing usable for {}",
                    target.label(),
                    css,
                    metric
                );
            }
            Err(e) => {
                tracing::warn!(
                    "🔶 {}: invalid selector '{}' for {} ({}), falling back",
                    target.label(),
                    css,
                    metric,
                    e
                );
            }
        }
    }

    if let Some(value) = count_from_text(meta_text, metric) {
        return value;
    }
    if let Some(value) = count_from_text(body_text, metric) {
        return value;
    }

    tracing::warn!(
        "🔶 {}: no {} count found, defaulting to 0",
        target.label(),
        metric
    );
    0
}

/// 在 "1,234 Followers, 56 Following, 789 Posts" 式文字中找指定指標
fn count_from_text(text: &str, metric: &str) -> Option<u64> {
    let pattern = Regex::new(r"(?i)([0-9][0-9.,]*\s*[kmb]?)\s*(followers|following|posts?)\b")
        .unwrap();

    for caps in pattern.captures_iter(text) {
        let keyword = caps.get(2)?.as_str().to_lowercase();
        let matches_metric = match metric {
            "followers" => keyword == "followers",
            "following" => keyword == "following",
            "posts" => keyword.starts_with("post"),
            _ => false,
        };
        if matches_metric {
            return parse_compact_number(caps.get(1)?.as_str());
        }
    }
    None
}

fn first_number_in(text: &str) -> Option<u64> {
    let pattern = Regex::new(r"([0-9][0-9.,]*\s*[KkMmBb]?)").unwrap();
    pattern
        .captures(text)
        .and_then(|caps| parse_compact_number(caps.get(1)?.as_str()))
}

fn collect_posts(document: &Html, target: &ProfileTarget) -> Vec<Post> {
    let css = target
        .selectors
        .as_ref()
        .and_then(|s| s.post_item.as_deref())
        .unwrap_or("article, .post, [data-insight-post]");

    let selector = match Selector::parse(css) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(
                "🔶 {}: invalid post selector '{}' ({}), skipping posts",
                target.label(),
                css,
                e
            );
            return Vec::new();
        }
    };

    let paragraph = Selector::parse("p").unwrap();
    let anchor = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .take(MAX_POSTS_PER_PROFILE)
        .map(|item| {
            let excerpt_source = item
                .select(&paragraph)
                .next()
                .map(|p| p.text().collect::<Vec<_>>().join(" "))
                .unwrap_or_else(|| item.text().collect::<Vec<_>>().join(" "));

            let excerpt: String = excerpt_source
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(EXCERPT_CHARS)
                .collect();

            let item_text = item.text().collect::<Vec<_>>().join(" ");

            let permalink = item
                .select(&anchor)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| href.starts_with("http"))
                .map(|href| href.to_string());

            Post {
                author: target.handle.clone(),
                platform: target.platform.clone(),
                excerpt,
                likes: interaction_count(&item, &item_text, "likes", &["likes?", "favou?rites?"]),
                comments: interaction_count(
                    &item,
                    &item_text,
                    "comments",
                    &["comments?", "replies", "reply"],
                ),
                shares: interaction_count(
                    &item,
                    &item_text,
                    "shares",
                    &["shares?", "reposts?", "boosts?"],
                ),
                permalink,
            }
        })
        .collect()
}

/// 互動數：先看 data-* 屬性，再退回文字樣式 "12 likes"
fn interaction_count(
    item: &ElementRef<'_>,
    item_text: &str,
    attr_name: &str,
    keywords: &[&str],
) -> u64 {
    if let Some(raw) = item.value().attr(&format!("data-{}", attr_name)) {
        if let Some(value) = parse_compact_number(raw) {
            return value;
        }
    }

    let pattern = Regex::new(&format!(
        r"(?i)([0-9][0-9.,]*\s*[kmb]?)\s*(?:{})\b",
        keywords.join("|")
    ))
    .unwrap();

    pattern
        .captures(item_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_compact_number(m.as_str()))
        .unwrap_or(0)
}

fn meta_content(document: &Html, attr: &str, key: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[{}="{}"]"#, attr, key)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
}

/// "Alice (@alice) • Example" 之類的標題只留人名
fn clean_display_name(title: &str) -> String {
    let trimmed = title.trim();
    for separator in [" (@", " • ", " | ", " – "] {
        if let Some(pos) = trimmed.find(separator) {
            return trimmed[..pos].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// og:description 常見 "1,234 Followers, 56 Following, 7 Posts - bio..." 前綴
fn strip_count_prefix(description: &str) -> String {
    let pattern = Regex::new(r"(?i)^.*?posts?\s*[-–—:]\s*").unwrap();
    pattern.replace(description, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_HTML: &str = r#"
        <html>
          <head>
            <title>Alice Chen (@alice) • Pixelgram</title>
            <meta property="og:title" content="Alice Chen (@alice) • Pixelgram" />
            <meta property="og:description"
                  content="12.5K Followers, 301 Following, 842 Posts - Coffee, code, cats." />
          </head>
          <body>
            <main>
              <article data-likes="1,204" data-comments="88" data-shares="45">
                <p>Shipping a new release today!</p>
                <a href="https://pixelgram.example/p/abc123">permalink</a>
              </article>
              <article>
                <p>Weekend hike photos</p>
                <span>312 likes</span>
                <span>17 comments</span>
                <span>9 reposts</span>
              </article>
            </main>
          </body>
        </html>
    "#;

    fn target() -> ProfileTarget {
        ProfileTarget {
            platform: "pixelgram".to_string(),
            handle: "alice".to_string(),
            url: "https://pixelgram.example/alice".to_string(),
            selectors: None,
        }
    }

    #[test]
    fn test_parse_compact_number() {
        assert_eq!(parse_compact_number("852"), Some(852));
        assert_eq!(parse_compact_number("1.2K"), Some(1_200));
        assert_eq!(parse_compact_number("3.4M"), Some(3_400_000));
        assert_eq!(parse_compact_number("2B"), Some(2_000_000_000));
        assert_eq!(parse_compact_number("1,234,567"), Some(1_234_567));
        assert_eq!(parse_compact_number(" 42 "), Some(42));
        assert_eq!(parse_compact_number(""), None);
        assert_eq!(parse_compact_number("abc"), None);
        assert_eq!(parse_compact_number("-5"), None);
    }

    #[test]
    fn test_parse_profile_from_og_metadata() {
        let scraped = parse_profile(&target(), PROFILE_HTML);
        let profile = &scraped.profile;

        assert_eq!(profile.display_name, "Alice Chen");
        assert_eq!(profile.followers, 12_500);
        assert_eq!(profile.following, 301);
        assert_eq!(profile.posts_count, 842);
        assert_eq!(profile.bio, "Coffee, code, cats.");
        assert_eq!(profile.handle, "alice");
    }

    #[test]
    fn test_parse_profile_posts() {
        let scraped = parse_profile(&target(), PROFILE_HTML);
        assert_eq!(scraped.posts.len(), 2);

        // data-* 屬性優先
        let first = &scraped.posts[0];
        assert_eq!(first.excerpt, "Shipping a new release today!");
        assert_eq!(first.likes, 1_204);
        assert_eq!(first.comments, 88);
        assert_eq!(first.shares, 45);
        assert_eq!(
            first.permalink.as_deref(),
            Some("https://pixelgram.example/p/abc123")
        );

        // 文字樣式退路
        let second = &scraped.posts[1];
        assert_eq!(second.likes, 312);
        assert_eq!(second.comments, 17);
        assert_eq!(second.shares, 9);
        assert!(second.permalink.is_none());
    }

    #[test]
    fn test_parse_profile_with_selector_override() {
        let html = r#"
            <html><body>
              <span class="count-followers">9,001</span>
              <span class="count-following">12</span>
            </body></html>
        "#;

        let mut t = target();
        t.selectors = Some(crate::domain::model::SelectorOverrides {
            followers: Some(".count-followers".to_string()),
            following: Some(".count-following".to_string()),
            posts_count: None,
            post_item: None,
        });

        let scraped = parse_profile(&t, html);
        assert_eq!(scraped.profile.followers, 9_001);
        assert_eq!(scraped.profile.following, 12);
        assert_eq!(scraped.profile.posts_count, 0); // 找不到就補 0
    }

    #[test]
    fn test_parse_profile_missing_everything_defaults_to_zero() {
        let scraped = parse_profile(&target(), "<html><body><p>nothing here</p></body></html>");
        let profile = &scraped.profile;

        assert_eq!(profile.followers, 0);
        assert_eq!(profile.following, 0);
        assert_eq!(profile.posts_count, 0);
        assert_eq!(profile.display_name, "alice"); // handle 退路
        assert!(scraped.posts.is_empty());
    }

    #[test]
    fn test_counts_from_body_text_when_no_meta() {
        let html = r#"
            <html><body>
              <div>3.1K followers</div>
              <div>150 following</div>
              <div>98 posts</div>
            </body></html>
        "#;
        let scraped = parse_profile(&target(), html);
        assert_eq!(scraped.profile.followers, 3_100);
        assert_eq!(scraped.profile.following, 150);
        assert_eq!(scraped.profile.posts_count, 98);
    }

    #[test]
    fn test_clean_display_name() {
        assert_eq!(clean_display_name("Alice (@alice) • Site"), "Alice");
        assert_eq!(clean_display_name("Bob | Photos"), "Bob");
        assert_eq!(clean_display_name("  Carol  "), "Carol");
    }

    #[test]
    fn test_strip_count_prefix() {
        assert_eq!(
            strip_count_prefix("12 Followers, 3 Following, 4 Posts - Hello there"),
            "Hello there"
        );
        assert_eq!(strip_count_prefix("Just a bio"), "Just a bio");
    }
}
