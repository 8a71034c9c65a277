//! # catto
//!
//! Download random cute animal images, and the occasional fun fact, from
//! the public animal API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catto::{Category, Client, Downloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), catto::Error> {
//!     let client = Client::builder().build().await?;
//!     let downloader = Downloader::new(client);
//!     let report = downloader
//!         .download(Category::Cats, 3, std::path::Path::new("."), &())
//!         .await?;
//!     println!("saved {:?} to {}", report.names, report.directory.display());
//!     Ok(())
//! }
//! ```
//!
//! Requests against the API are paced and retried with
//! [`BackoffCalculator`], a jittered exponential backoff that resets itself
//! after a time cap or try budget.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod category;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod download;
pub mod interactive;
pub mod observability;
pub mod output;
pub mod status;

pub use category::{Category, CategorySpec, DEFAULT_API_BASE};
pub use client::{
    BackoffCalculator, BackoffConfig, Client, ClientBuilder, NetworkConfig, ProxyConfig,
    Resilience, RetryConfig,
};
pub use config::{ConfigBuilder, ConfigError, ConfigProvider, ConfigProviderExt, Settings};
pub use connectivity::{DEFAULT_PROBE_ADDRESS, check_internet_connection};
pub use download::{DownloadObserver, DownloadReport, Downloader, SavedImage};
pub use interactive::{Controller, DialoguerPrompter, DownloadRequest, Prompter};
pub use status::{EndpointStatus, check_endpoints};

use std::path::PathBuf;
use std::time::Duration;

/// Error type for catto operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The API answered with something other than 200 OK.
    #[error("Request to {url} failed (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    Api {
        message: String,
        status: Option<u16>,
        url: String,
    },

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// API rate limit exceeded.
    #[error("Rate limit exceeded{}", match retry_after {
        Some(d) => format!(", retry in {:.0}s", d.as_secs_f64()),
        None => String::new(),
    })]
    RateLimit { retry_after: Option<Duration> },

    /// The response did not contain the expected field.
    #[error("Response for '{category}' has no '{field}' field")]
    MissingField { category: String, field: String },

    /// The API returned no fact for the category.
    #[error("The API didn't return any facts about '{category}'")]
    FactNotFound { category: String },

    /// The downloaded bytes are not an image we can recognize.
    #[error("Failed to read image from {url}: {reason}")]
    InvalidImage { url: String, reason: String },

    /// Writing the image to disk failed.
    #[error("Failed to save image {}: {source}", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Target directory is missing or not a directory.
    #[error("'{}' is not a valid directory", .0.display())]
    PathNotFound(PathBuf),

    #[error(
        "Unknown animal category '{0}', choose from: {choices}",
        choices = Category::names().join(", ")
    )]
    UnknownCategory(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No route to the internet.
    #[error("No internet connection (could not reach {address})")]
    Offline { address: String },
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad settings, arguments, or paths supplied by the user
    Configuration,
    /// Network, rate limit, or server errors that may succeed on retry
    Transient,
    /// The API answered, but not with what we need
    Data,
    /// Internal errors (IO, JSON)
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::PathNotFound(_) | Error::UnknownCategory(_) => {
                ErrorCategory::Configuration
            }

            Error::Network(_) | Error::RateLimit { .. } | Error::Offline { .. } => {
                ErrorCategory::Transient
            }
            Error::Api {
                status: Some(500..=599),
                ..
            } => ErrorCategory::Transient,

            Error::Api { .. }
            | Error::MissingField { .. }
            | Error::FactNotFound { .. }
            | Error::InvalidImage { .. } => ErrorCategory::Data,

            Error::Io(_) | Error::Json(_) | Error::ImageSave { .. } => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => *status,
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::Serialization(e) => Error::Json(e),
            config::ConfigError::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Api {
            message: "Not Found".to_string(),
            status: Some(404),
            url: "https://some-random-api.com/animal/cat".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("/animal/cat"));

        let err = Error::RateLimit {
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded, retry in 12s");
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(Error::RateLimit { retry_after: None }.is_retryable());

        let server_error = Error::Api {
            message: "Bad Gateway".to_string(),
            status: Some(502),
            url: String::new(),
        };
        assert!(server_error.is_retryable());

        let missing = Error::FactNotFound {
            category: "koala".into(),
        };
        assert!(!missing.is_retryable());
        assert_eq!(missing.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_unknown_category_lists_choices() {
        let err = Error::UnknownCategory("unicorns".into());
        assert_eq!(
            err.to_string(),
            "Unknown animal category 'unicorns', choose from: pandas, dogs, cats, birds, foxes, \
             redpandas, kangaroo, koala, raccoon"
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_config_error_conversion() {
        let config_err = config::ConfigError::NotFound {
            key: "api.base_url".to_string(),
        };
        let err: Error = config_err.into();
        assert!(matches!(err, Error::Config(ref m) if m.contains("api.base_url")));
    }
}
