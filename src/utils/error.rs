use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Scrape failed for '{target}': {message}")]
    ScrapeError { target: String, message: String },

    #[error("Analysis error: {message}")]
    AnalysisError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 錯誤分類，用於日誌與統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Config,
    System,
}

/// 錯誤嚴重程度，決定 CLI 退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl InsightError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InsightError::HttpError(_) | InsightError::ScrapeError { .. } => ErrorCategory::Network,
            InsightError::CsvError(_)
            | InsightError::SerializationError(_)
            | InsightError::AnalysisError { .. }
            | InsightError::ProcessingError { .. } => ErrorCategory::Data,
            InsightError::ConfigError { .. }
            | InsightError::ConfigValidationError { .. }
            | InsightError::InvalidConfigValueError { .. }
            | InsightError::MissingConfigError { .. } => ErrorCategory::Config,
            InsightError::ZipError(_) | InsightError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一目標抓取失敗可重試
            InsightError::HttpError(_) | InsightError::ScrapeError { .. } => ErrorSeverity::Medium,
            InsightError::AnalysisError { .. } | InsightError::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            InsightError::CsvError(_) | InsightError::SerializationError(_) => ErrorSeverity::High,
            InsightError::ConfigError { .. }
            | InsightError::ConfigValidationError { .. }
            | InsightError::InvalidConfigValueError { .. }
            | InsightError::MissingConfigError { .. } => ErrorSeverity::High,
            InsightError::ZipError(_) | InsightError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            InsightError::HttpError(_) => {
                "Check network connectivity and that the profile URL is reachable".to_string()
            }
            InsightError::ScrapeError { target, .. } => format!(
                "Verify that '{}' is a public profile page and adjust the CSS selectors if the page layout changed",
                target
            ),
            InsightError::AnalysisError { .. } => {
                "Inspect the extracted metrics; at least one profile with numeric counts is required".to_string()
            }
            InsightError::ConfigError { .. }
            | InsightError::ConfigValidationError { .. }
            | InsightError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and re-run (see --help for the expected format)".to_string()
            }
            InsightError::MissingConfigError { field } => {
                format!("Provide the '{}' setting via CLI flag or TOML config", field)
            }
            InsightError::CsvError(_) | InsightError::SerializationError(_) => {
                "Report output could not be rendered; re-run with --verbose to see the offending record".to_string()
            }
            InsightError::ZipError(_) => {
                "Report bundle could not be written; check free disk space".to_string()
            }
            InsightError::IoError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            InsightError::ProcessingError { .. } => {
                "Re-run with --verbose and inspect the pipeline logs".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            InsightError::HttpError(e) => format!("Could not reach the profile page: {}", e),
            InsightError::ScrapeError { target, message } => {
                format!("Could not read metrics from '{}': {}", target, message)
            }
            InsightError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            InsightError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid value for {}: {}", value, field, reason)
            }
            InsightError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
