#[cfg(feature = "cli")]
pub mod cli_config;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;
pub use storage::LocalStorage;
