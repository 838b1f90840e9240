pub mod analysis;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod domain;
pub mod scrape;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{toml_config::TomlConfig, LocalStorage};

pub use crate::core::{engine::InsightEngine, profile_pipeline::ProfilePipeline};
pub use utils::error::{InsightError, Result};
