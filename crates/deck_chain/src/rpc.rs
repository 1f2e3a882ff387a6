use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use deck_core::DeckError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC 2.0 client over HTTP, shared by both chain families.
#[derive(Debug)]
pub struct RpcTransport {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        if !validate_url(url) {
            return Err(DeckError::Config(format!("invalid RPC URL: {url}")).into());
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            url: url.to_string(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a call whose result may legitimately be `null`.
    pub async fn request_opt<P, R>(&self, method: &str, params: P) -> Result<Option<R>>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, url = %self.url, "json-rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| DeckError::Network(format!("{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeckError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body: RpcResponse<R> = response
            .json()
            .await
            .map_err(|e| DeckError::Decode(format!("{method} response: {e}")))?;

        if let Some(err) = body.error {
            return Err(DeckError::Decode(format!(
                "{method} failed with RPC error {}: {}",
                err.code, err.message
            ))
            .into());
        }
        Ok(body.result)
    }

    /// Issue a call whose result must be present.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        self.request_opt(method, params)
            .await?
            .ok_or_else(|| DeckError::Decode(format!("{method} returned null")).into())
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(value: &str) -> Result<u64, DeckError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|_| DeckError::Decode(format!("'{value}' is not a hex quantity")))
}
