//! HTTP client configuration.
//!
//! Carrier-agnostic settings come from the session (`configured_timeout`);
//! this type only holds knobs for the HTTP client shared by every
//! long-polling transport a registry creates. There is no request timeout
//! setting; retry timing belongs to the carrier, and the server may hold a
//! `/meta/connect` open for a long time.

use std::time::Duration;

/// Settings for the HTTP client behind the long-polling carrier.
///
/// # Example
///
/// ```
/// use bayeux_transport::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig {
///     user_agent: Some("my-app/1.0".into()),
///     pool_idle_timeout: Some(Duration::from_secs(30)),
///     ..HttpConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// `User-Agent` header sent with every request.
    ///
    /// Default: `bayeux-transport/<crate version>`
    pub user_agent: Option<String>,

    /// How long an idle pooled connection is kept.
    ///
    /// `None` keeps the HTTP client's own default.
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum idle connections kept per host.
    ///
    /// `None` keeps the HTTP client's own default.
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(concat!("bayeux-transport/", env!("CARGO_PKG_VERSION")).into()),
            pool_idle_timeout: None,
            pool_max_idle_per_host: None,
        }
    }
}
