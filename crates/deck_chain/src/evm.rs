use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::{TxOutcome, TxStatus, poll_outcome};
use crate::rpc::{RpcTransport, parse_quantity};

/// Receipt fields the operator tool cares about. Quantities stay as the
/// hex strings the node returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmReceipt {
    pub transaction_hash: String,
    pub status: Option<String>,
    pub block_number: Option<String>,
    pub gas_used: Option<String>,
    pub contract_address: Option<String>,
}

impl EvmReceipt {
    /// Post-Byzantium status; `0x1` is success.
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(|b| parse_quantity(b).ok())
    }

    pub fn gas(&self) -> Option<u64> {
        self.gas_used.as_deref().and_then(|g| parse_quantity(g).ok())
    }
}

/// Read client for an EVM-compatible chain.
#[derive(Debug)]
pub struct EvmClient {
    chain_id: u64,
    rpc: RpcTransport,
}

impl EvmClient {
    pub fn new(chain_id: u64, rpc_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            chain_id,
            rpc: RpcTransport::new(rpc_url, timeout)?,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc.url()
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.rpc
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    pub async fn block_number(&self) -> Result<u64> {
        let hex: String = self.rpc.request("eth_blockNumber", json!([])).await?;
        Ok(parse_quantity(&hex)?)
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<EvmReceipt>> {
        self.rpc
            .request_opt("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxOutcome> {
        debug!(chain_id = self.chain_id, tx_hash, "waiting for receipt");
        poll_outcome(tx_hash, timeout, poll_interval, || async move {
            Ok(self
                .transaction_receipt(tx_hash)
                .await?
                .map(|receipt| outcome_from_receipt(tx_hash, receipt)))
        })
        .await
    }
}

fn outcome_from_receipt(tx_hash: &str, receipt: EvmReceipt) -> TxOutcome {
    let status = if receipt.succeeded() {
        TxStatus::Success
    } else {
        TxStatus::Failure
    };
    TxOutcome {
        tx_hash: tx_hash.to_string(),
        status,
        receipt: Some(receipt),
    }
}
