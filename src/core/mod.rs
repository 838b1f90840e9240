pub mod engine;
pub mod profile_pipeline;

pub use crate::domain::model::{
    InsightResult, InsightSummary, MetricSnapshot, Post, Profile, ProfileTarget, ScrapedProfile,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
