// src/config.rs

use crate::error::AggregateError;
use url::Url;

/// Environment variable holding the public base URL of the server.
pub const SERVER_URL_VAR: &str = "AGGREGATE_SERVER_URL";
/// Environment variable overriding the default KML submission cap.
pub const MAX_SUBMISSIONS_VAR: &str = "AGGREGATE_MAX_SUBMISSIONS";
/// Submission cap used when a request does not name one.
pub const DEFAULT_MAX_SUBMISSIONS: usize = 100;

/// Server-wide settings for exports.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateConfig {
    server_url: Url,
    pub default_max_submissions: usize,
}

impl AggregateConfig {
    /// Creates a configuration for the server reachable at `server_url`.
    ///
    /// The URL is normalized to end in `/` so attachment paths are resolved
    /// beneath it rather than beside it.
    pub fn new(server_url: &str) -> Result<Self, AggregateError> {
        let trimmed = server_url.trim();
        if trimmed.is_empty() {
            return Err(AggregateError::InvalidInput(
                "Server URL cannot be empty".to_string(),
            ));
        }
        let mut server_url = Url::parse(trimmed)?;
        if server_url.cannot_be_a_base() {
            return Err(AggregateError::InvalidInput(format!(
                "Server URL {} cannot be used as a base",
                server_url
            )));
        }
        if !server_url.path().ends_with('/') {
            let path = format!("{}/", server_url.path());
            server_url.set_path(&path);
        }
        Ok(AggregateConfig {
            server_url,
            default_max_submissions: DEFAULT_MAX_SUBMISSIONS,
        })
    }

    /// Loads settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, AggregateError> {
        dotenvy::dotenv().ok();
        let server_url = std::env::var(SERVER_URL_VAR).map_err(|_| {
            AggregateError::InvalidInput(format!("{} is not set", SERVER_URL_VAR))
        })?;
        let mut config = Self::new(&server_url)?;
        if let Ok(raw) = std::env::var(MAX_SUBMISSIONS_VAR) {
            config.default_max_submissions = raw.trim().parse().map_err(|_| {
                AggregateError::InvalidInput(format!(
                    "{} must be a non-negative integer, got {:?}",
                    MAX_SUBMISSIONS_VAR, raw
                ))
            })?;
        }
        log::debug!(
            "Loaded configuration for {} (default cap {})",
            config.server_url,
            config.default_max_submissions
        );
        Ok(config)
    }

    pub fn with_default_max_submissions(mut self, max: usize) -> Self {
        self.default_max_submissions = max;
        self
    }

    /// Base that attachment references are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.server_url
    }
}
