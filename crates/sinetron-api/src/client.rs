//! HTTP transport for the aggregation API
//!
//! Fetching is one opaque operation: endpoint plus query parameters in,
//! parsed JSON out. Proxy-fallback chains and response caches belong to
//! the hosting shell, behind this same seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ApiError, Result};

/// Default aggregation API root
pub const DEFAULT_API_BASE: &str = "https://melolo-api-azure.vercel.app/api/melolo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// JSON-over-HTTP seam for the aggregation API
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Fetch `endpoint` with query `params`, returning the parsed body
    async fn fetch_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value>;
}

/// Direct client against the public aggregation API
pub struct HttpApi {
    base: Url,
    client: Client,
}

impl HttpApi {
    /// Create a client against [`DEFAULT_API_BASE`]
    pub fn new() -> Result<Self> {
        Self::with_base(DEFAULT_API_BASE)
    }

    /// Create a client against an alternative API root
    pub fn with_base(base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Ok(Self {
            base: Url::parse(base)?,
            client,
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base, endpoint))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl VideoApi for HttpApi {
    #[instrument(skip(self, params))]
    async fn fetch_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!(%url, "fetching");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Fetch {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }

        response.json().await.map_err(|source| ApiError::Fetch {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
