use anyhow::{Context, Result};
use async_trait::async_trait;
use deck_core::{AppConf, ConfigManager, DeckError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::types::{
    Allocation, BatchUpload, CreateRelayerRequest, RelayAction, RelayerInfo, RpcProvider,
    TxHashResponse, UploadResponse,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Everything the tool asks of the backend. [`AdminClient`] is the HTTP
/// implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_app_confs(&self) -> Result<Vec<AppConf>>;

    async fn get_app_conf(&self, app_id: &str) -> Result<AppConf>;

    /// Replace the stored record with `conf`.
    async fn save_app_conf(&self, conf: &AppConf) -> Result<()>;

    async fn list_relayers(&self, app_id: &str) -> Result<Vec<RelayerInfo>>;

    async fn create_relayer(&self, request: &CreateRelayerRequest) -> Result<RelayerInfo>;

    async fn upload_batch(
        &self,
        app_id: &str,
        batch_name: &str,
        upload: &BatchUpload,
    ) -> Result<UploadResponse>;

    async fn list_allocations(&self, app_id: &str, batch_name: &str) -> Result<Vec<Allocation>>;

    /// Submit a relayed transaction and return its hash.
    async fn relay(&self, action: RelayAction, body: Value) -> Result<String>;

    async fn list_rpc_providers(&self) -> Result<Vec<RpcProvider>>;

    async fn set_rpc_provider(&self, provider: &RpcProvider) -> Result<()>;

    async fn delete_rpc_provider(&self, chain_id: &str) -> Result<()>;
}

/// Serialize a typed request and relay it.
pub async fn relay_typed<A, B>(api: &A, action: RelayAction, body: &B) -> Result<String>
where
    A: AdminApi + ?Sized,
    B: Serialize + ?Sized,
{
    let body = serde_json::to_value(body).context("failed to encode relay request")?;
    api.relay(action, body).await
}

/// HTTP client for the backend `/admin` surface.
pub struct AdminClient {
    base_url: String,
    base: Url,
    client: Client,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, api_key: &str) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| DeckError::Config(format!("'{base_url}' is not a valid backend URL")))?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| DeckError::Config("API key contains invalid characters".into()))?;
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url,
            base,
            client,
        })
    }

    /// Client for the currently selected environment.
    pub fn from_config(config: &ConfigManager) -> Result<Self> {
        let (name, env) = config
            .selected_environment()
            .ok_or_else(|| DeckError::Config("no environment selected".into()))?;
        debug!(env = %name, base_url = %env.base_url, "admin client for environment");
        Self::new(env.base_url, &env.api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/admin/{segments...}`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("admin").extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| DeckError::Network(format!("{what}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeckError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| DeckError::Decode(format!("{what}: {e}")).into())
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments);
        debug!(url = %url, "admin GET");
        let response = self.send(self.client.get(url.clone()), url.path()).await?;
        Self::decode(response, url.path()).await
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments);
        debug!(url = %url, "admin POST");
        let response = self
            .send(self.client.post(url.clone()).json(body), url.path())
            .await?;
        Self::decode(response, url.path()).await
    }

    async fn post_unit<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<()> {
        let url = self.url(segments);
        debug!(url = %url, "admin POST");
        self.send(self.client.post(url.clone()).json(body), url.path())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn list_app_confs(&self) -> Result<Vec<AppConf>> {
        self.get(&["app_conf"]).await
    }

    async fn get_app_conf(&self, app_id: &str) -> Result<AppConf> {
        self.get(&["app_conf", app_id]).await
    }

    async fn save_app_conf(&self, conf: &AppConf) -> Result<()> {
        self.post_unit(&["app_conf", &conf.app_id], &conf.update_payload())
            .await?;
        info!(app_id = %conf.app_id, "app configuration saved");
        Ok(())
    }

    async fn list_relayers(&self, app_id: &str) -> Result<Vec<RelayerInfo>> {
        self.get(&["relayer", app_id]).await
    }

    async fn create_relayer(&self, request: &CreateRelayerRequest) -> Result<RelayerInfo> {
        let relayer: RelayerInfo = self.post(&["relayer", "create"], request).await?;
        info!(app_id = %request.app_id, address = %relayer.address, "relayer created");
        Ok(relayer)
    }

    async fn upload_batch(
        &self,
        app_id: &str,
        batch_name: &str,
        upload: &BatchUpload,
    ) -> Result<UploadResponse> {
        let file = Part::bytes(upload.contents.clone())
            .file_name(upload.file_name.clone())
            .mime_str("text/csv")
            .context("invalid upload content type")?;
        let form = Form::new()
            .text("template", upload.template.clone())
            .text("file_hash", upload.file_hash())
            .text("primary_key", upload.primary_key.clone())
            .part("file", file);

        let url = self.url(&["upload", app_id, batch_name]);
        debug!(url = %url, file = %upload.file_name, "admin upload");
        let response = self
            .send(self.client.post(url.clone()).multipart(form), url.path())
            .await?;
        let uploaded: UploadResponse = Self::decode(response, url.path()).await?;
        info!(app_id, batch = batch_name, roots = uploaded.root.len(), "batch uploaded");
        Ok(uploaded)
    }

    async fn list_allocations(&self, app_id: &str, batch_name: &str) -> Result<Vec<Allocation>> {
        self.get(&["allocation", app_id, batch_name]).await
    }

    async fn relay(&self, action: RelayAction, body: Value) -> Result<String> {
        let segments: Vec<&str> = std::iter::once("relay")
            .chain(action.path().split('/'))
            .collect();
        let resp: TxHashResponse = self.post(&segments, &body).await?;
        info!(action = %action, tx_hash = %resp.tx_hash, "transaction relayed");
        Ok(resp.tx_hash)
    }

    async fn list_rpc_providers(&self) -> Result<Vec<RpcProvider>> {
        self.get(&["rpc"]).await
    }

    async fn set_rpc_provider(&self, provider: &RpcProvider) -> Result<()> {
        self.post_unit(&["rpc"], provider).await
    }

    async fn delete_rpc_provider(&self, chain_id: &str) -> Result<()> {
        let url = self.url(&["rpc", chain_id]);
        debug!(url = %url, "admin DELETE");
        self.send(self.client.delete(url.clone()), url.path()).await?;
        Ok(())
    }
}
