use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{TxOutcome, TxStatus, poll_outcome};
use crate::rpc::RpcTransport;

#[derive(Debug, Deserialize)]
struct RpcContextValue<T> {
    value: T,
}

/// Status entry returned by `getSignatureStatuses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    #[serde(default)]
    pub confirmation_status: Option<String>,
    #[serde(default)]
    pub err: Option<Value>,
}

impl SignatureStatus {
    /// `Some` once the signature is final, either way.
    fn settled(&self) -> Option<TxStatus> {
        if self.err.is_some() {
            return Some(TxStatus::Failure);
        }
        match self.confirmation_status.as_deref() {
            Some("finalized") => Some(TxStatus::Success),
            _ => None,
        }
    }
}

/// Read client for a Solana cluster.
#[derive(Debug)]
pub struct SolanaClient {
    cluster: String,
    rpc: RpcTransport,
}

impl SolanaClient {
    pub fn new(cluster: &str, rpc_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            cluster: cluster.to_string(),
            rpc: RpcTransport::new(rpc_url, timeout)?,
        })
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc.url()
    }

    pub async fn signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>> {
        let statuses: RpcContextValue<Vec<Option<SignatureStatus>>> = self
            .rpc
            .request(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(statuses.value.into_iter().next().flatten())
    }

    pub async fn wait_for_signature(
        &self,
        signature: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxOutcome> {
        debug!(cluster = %self.cluster, signature, "waiting for finalization");
        poll_outcome(signature, timeout, poll_interval, || async move {
            let settled = self
                .signature_status(signature)
                .await?
                .and_then(|status| status.settled());
            Ok(settled.map(|status| TxOutcome {
                tx_hash: signature.to_string(),
                status,
                receipt: None,
            }))
        })
        .await
    }
}
