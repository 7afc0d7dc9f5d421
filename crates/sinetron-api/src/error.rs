//! Error types for the API client

use thiserror::Error;

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// API client error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure fetching an endpoint
    #[error("failed to fetch {endpoint}: {source}")]
    Fetch {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Non-success HTTP status from an endpoint
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    /// The response parsed but carried no usable data section
    #[error("response for {endpoint} carried no data")]
    MissingData { endpoint: String },

    /// The response body did not match the expected shape
    #[error("malformed response for {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        source: serde_json::Error,
    },

    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
