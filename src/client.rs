//! HTTP client for the treasury backend.
//!
//! One method per endpoint the desk consumes. GETs fail with [`FetchError`];
//! `POST /api/orders` fails with [`SubmitError`] carrying the backend's `detail`.

use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;

use crate::catalog::Resource;
use crate::error::{FetchError, SubmitError};
use crate::types::{AuctionListing, OrderRecord, OrderRequest, SecondaryListing, YieldPoint};

/// Error body shape used by the backend. `detail` is a string for business
/// rejections and a list of objects for request validation failures.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

fn detail_text(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Backend client. Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Client with a per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        path: &str,
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| FetchError::Transport { resource, source })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                resource,
                status: status.as_u16(),
                detail: detail_text(&body).unwrap_or(body),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| FetchError::Decode { resource, source })
    }

    /// `Ok` once the backend answers 2xx on `/api/health`.
    pub async fn health(&self) -> Result<(), FetchError> {
        let resource = Resource::Health;
        let response = self
            .client
            .get(self.url("/api/health"))
            .send()
            .await
            .map_err(|source| FetchError::Transport { resource, source })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FetchError::Status {
                resource,
                status: status.as_u16(),
                detail: status.canonical_reason().unwrap_or("not ready").to_string(),
            })
        }
    }

    pub async fn inventory(&self) -> Result<Vec<SecondaryListing>, FetchError> {
        self.get_json(Resource::Inventory, "/api/market/inventory").await
    }

    pub async fn auctions(&self) -> Result<Vec<AuctionListing>, FetchError> {
        self.get_json(Resource::Auctions, "/api/auctions").await
    }

    pub async fn yields(&self) -> Result<Vec<YieldPoint>, FetchError> {
        self.get_json(Resource::Yields, "/api/yields").await
    }

    /// Order history, newest first.
    pub async fn orders(&self, skip: u32, limit: u32) -> Result<Vec<OrderRecord>, FetchError> {
        let path = format!("/api/orders?skip={}&limit={}", skip, limit);
        self.get_json(Resource::Orders, &path).await
    }

    /// Posts one order. On rejection the backend's `detail` is kept verbatim.
    pub async fn create_order(&self, request: &OrderRequest) -> Result<OrderRecord, SubmitError> {
        debug!(
            "POST /api/orders cusip={} amount={} order_type={}",
            request.cusip, request.amount, request.order_type
        );
        let response = self
            .client
            .post(self.url("/api/orders"))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                detail: detail_text(&body),
            });
        }
        Ok(response.json::<OrderRecord>().await?)
    }
}
