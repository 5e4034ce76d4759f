//! Client configuration
//!
//! Loaded from environment variables with sensible defaults. The CLI layers
//! its flags on top.

use std::time::Duration;

use crate::error::{GalleryError, Result};

/// Default Image Store Service location.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Gallery client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Service base URL (default: http://localhost:8000)
    pub api_url: String,
    /// Transport timeout per request (default: 30s)
    pub request_timeout: Duration,
    /// Refresh period of the list surface while records are pending (default: 2500ms)
    pub list_poll_interval: Duration,
    /// Refresh period of the detail surface while its record is pending (default: 2000ms)
    pub detail_poll_interval: Duration,
    /// Start surfaces with auto-refresh on (default: true)
    pub auto_refresh: bool,
    /// Distinct recent search queries to remember (default: 5)
    pub search_history_len: usize,
    /// How long to wait for the service to report healthy before watching (default: 30s)
    pub health_wait: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            list_poll_interval: Duration::from_millis(2500),
            detail_poll_interval: Duration::from_millis(2000),
            auto_refresh: true,
            search_history_len: 5,
            health_wait: Duration::from_secs(30),
        }
    }
}

impl GalleryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("VISRAG_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let request_timeout = lookup("VISRAG_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let list_poll_interval = lookup("VISRAG_LIST_POLL_MS")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.list_poll_interval);

        let detail_poll_interval = lookup("VISRAG_DETAIL_POLL_MS")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.detail_poll_interval);

        // Auto-refresh on unless explicitly disabled with VISRAG_AUTO_REFRESH=false
        let auto_refresh = lookup("VISRAG_AUTO_REFRESH")
            .map(|v| v.trim().to_lowercase() != "false")
            .unwrap_or(defaults.auto_refresh);

        let search_history_len = lookup("VISRAG_SEARCH_HISTORY")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.search_history_len);

        let health_wait = lookup("VISRAG_HEALTH_WAIT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.health_wait);

        Self {
            api_url,
            request_timeout,
            list_poll_interval,
            detail_poll_interval,
            auto_refresh,
            search_history_len,
            health_wait,
        }
    }

    /// Reject values that would stall or spin the poll loop.
    pub fn validate(&self) -> Result<()> {
        if self.list_poll_interval.is_zero() || self.detail_poll_interval.is_zero() {
            return Err(GalleryError::Config(
                "poll intervals must be greater than zero".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(GalleryError::Config(
                "request timeout must be greater than zero".into(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(GalleryError::Config("API URL is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GalleryConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.list_poll_interval, Duration::from_millis(2500));
        assert_eq!(config.detail_poll_interval, Duration::from_millis(2000));
        assert!(config.auto_refresh);
        assert_eq!(config.search_history_len, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = GalleryConfig::from_lookup(lookup_from(&[
            ("VISRAG_API_URL", "http://gallery.internal:9000"),
            ("VISRAG_LIST_POLL_MS", "1000"),
            ("VISRAG_AUTO_REFRESH", "FALSE"),
            ("VISRAG_SEARCH_HISTORY", "10"),
        ]));
        assert_eq!(config.api_url, "http://gallery.internal:9000");
        assert_eq!(config.list_poll_interval, Duration::from_millis(1000));
        assert!(!config.auto_refresh);
        assert_eq!(config.search_history_len, 10);
        assert_eq!(config.detail_poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_unparseable_values_use_defaults() {
        let config = GalleryConfig::from_lookup(lookup_from(&[
            ("VISRAG_REQUEST_TIMEOUT_SECS", "soon"),
            ("VISRAG_SEARCH_HISTORY", "-1"),
            ("VISRAG_API_URL", "   "),
        ]));
        assert_eq!(config.search_history_len, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = GalleryConfig::from_lookup(lookup_from(&[("VISRAG_DETAIL_POLL_MS", "0")]));
        assert!(matches!(config.validate(), Err(GalleryError::Config(_))));
    }
}
