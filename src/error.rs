use thiserror::Error;

/// Errors that can occur in the transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    /// No registered carrier is both allowed and usable for the endpoint
    #[error("could not find a usable connection type for {0}")]
    NoUsableTransport(String),

    /// A connection type was named that no carrier is registered under
    #[error("unknown connection type: {0}")]
    UnknownConnectionType(String),

    /// Required builder configuration was not provided
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    /// Builder configuration options conflict with each other
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),

    /// Outbound message could not be encoded as JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response body was not valid JSON
    ///
    /// Never retried; reported to the session instead.
    #[error("malformed response body: {0}")]
    Parse(String),

    /// Network-level failure (connect, I/O, reading the body)
    ///
    /// The only retryable error.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP client could not be constructed from its configuration
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Endpoint could not be interpreted by the carrier
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport was closed or dropped before a reply arrived
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Returns true if the operation that produced this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

#[cfg(feature = "transport_http")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::InvalidEndpoint(err.to_string())
    }
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
