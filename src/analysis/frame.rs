use crate::domain::model::{MetricSnapshot, Post};
use crate::utils::error::Result;
use serde_json::Value;

/// 輕量的欄位表格，負責報表的 CSV/TSV 輸出與數值欄位抽取
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 一列的長度必須和欄位數一致，否則整列丟棄並記 warn
    pub fn push_row(&mut self, row: Vec<Value>) {
        if row.len() != self.columns.len() {
            tracing::warn!(
                "🔶 Dropping row with {} cells (expected {})",
                row.len(),
                self.columns.len()
            );
            return;
        }
        self.rows.push(row);
    }

    pub fn from_snapshots(snapshots: &[MetricSnapshot]) -> Self {
        let mut frame = Frame::new(
            [
                "platform",
                "handle",
                "taken_at",
                "followers",
                "following",
                "posts",
                "engagement_rate",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );

        for snap in snapshots {
            frame.push_row(vec![
                Value::String(snap.platform.clone()),
                Value::String(snap.handle.clone()),
                Value::String(snap.taken_at.to_rfc3339()),
                Value::from(snap.followers),
                Value::from(snap.following),
                Value::from(snap.posts_count),
                Value::from(snap.engagement_rate),
            ]);
        }

        frame
    }

    pub fn from_posts(posts: &[Post]) -> Self {
        let mut frame = Frame::new(
            ["platform", "author", "excerpt", "likes", "comments", "shares"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        for post in posts {
            frame.push_row(vec![
                Value::String(post.platform.clone()),
                Value::String(post.author.clone()),
                Value::String(post.excerpt.clone()),
                Value::from(post.likes),
                Value::from(post.comments),
                Value::from(post.shares),
            ]);
        }

        frame
    }

    /// 取出數值欄位；非數值的格子略過
    pub fn column_f64(&self, name: &str) -> Vec<f64> {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return Vec::new();
        };

        self.rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(|v| v.as_f64()))
            .collect()
    }

    /// 依數值欄位遞減排序（儀表板的排行用）
    pub fn sort_desc_by(&mut self, name: &str) {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return;
        };

        self.rows.sort_by(|a, b| {
            let av = a.get(idx).and_then(|v| v.as_f64()).unwrap_or(f64::MIN);
            let bv = b.get(idx).and_then(|v| v.as_f64()).unwrap_or(f64::MIN);
            bv.partial_cmp(&av).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    pub fn to_csv(&self) -> Result<String> {
        self.render(b',')
    }

    pub fn to_tsv(&self) -> Result<String> {
        self.render(b'\t')
    }

    fn render(&self, delimiter: u8) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        writer.write_record(&self.columns)?;

        for row in &self.rows {
            let record: Vec<String> = row.iter().map(cell_to_string).collect();
            writer.write_record(&record)?;
        }

        let bytes = writer.into_inner().map_err(|e| {
            crate::utils::error::InsightError::ProcessingError {
                message: format!("CSV writer flush failed: {}", e),
            }
        })?;

        String::from_utf8(bytes).map_err(|e| {
            crate::utils::error::InsightError::ProcessingError {
                message: format!("CSV output is not valid UTF-8: {}", e),
            }
        })
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
