use std::future::Future;
use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use anyhow::Result;
use async_trait::async_trait;
use deck_core::DeckError;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::chain::{ChainFamily, ChainId};
use crate::evm::{EvmClient, EvmReceipt};
use crate::solana::SolanaClient;

/// Final status of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failure,
}

/// What waiting on a transaction produced. EVM chains attach the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: String,
    pub status: TxStatus,
    pub receipt: Option<EvmReceipt>,
}

impl TxOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }

    /// Address of a contract created by the transaction, if any.
    pub fn contract_address(&self) -> Option<&str> {
        self.receipt.as_ref()?.contract_address.as_deref()
    }
}

/// Read-only contract calls.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

/// Waits for a relayed transaction to settle.
#[async_trait]
pub trait TxWatcher: Send + Sync {
    async fn wait_for_outcome(
        &self,
        tx_hash: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxOutcome>;
}

/// Poll `check` until it reports an outcome or `timeout` elapses.
///
/// Connection failures and 5xx/429 responses are retried at the next tick.
/// Any other check error ends the wait at once. A timeout carries the last
/// retried failure, if any.
pub async fn poll_outcome<F, Fut>(
    tx_hash: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut check: F,
) -> Result<TxOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<TxOutcome>>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_error = None;
    loop {
        match check().await {
            Ok(Some(outcome)) => return Ok(outcome),
            Ok(None) => last_error = None,
            Err(e) if is_transient(&e) => {
                debug!(tx_hash, error = %e, "status check failed, polling again");
                last_error = Some(format!("{e:#}"));
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(DeckError::Timeout {
                tx_hash: tx_hash.to_string(),
                secs: timeout.as_secs(),
                last_error,
            }
            .into());
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

fn is_transient(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<DeckError>() {
        Some(DeckError::Network(_)) => true,
        Some(DeckError::Http { status, .. }) => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// A read client for one chain, dispatched by family.
#[derive(Debug)]
pub enum ChainClient {
    Evm(EvmClient),
    Solana(SolanaClient),
}

impl ChainClient {
    pub fn chain_id(&self) -> ChainId {
        match self {
            ChainClient::Evm(c) => ChainId::Evm(c.chain_id()),
            ChainClient::Solana(c) => ChainId::Solana(c.cluster().to_string()),
        }
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            ChainClient::Evm(_) => ChainFamily::Evm,
            ChainClient::Solana(_) => ChainFamily::Solana,
        }
    }

    pub fn rpc_url(&self) -> &str {
        match self {
            ChainClient::Evm(c) => c.rpc_url(),
            ChainClient::Solana(c) => c.rpc_url(),
        }
    }

    pub fn as_evm(&self) -> Result<&EvmClient, DeckError> {
        match self {
            ChainClient::Evm(c) => Ok(c),
            ChainClient::Solana(_) => Err(DeckError::Unsupported(
                "contract calls require an EVM chain".into(),
            )),
        }
    }
}

#[async_trait]
impl ContractReader for ChainClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.as_evm()?.call(to, data).await
    }
}

#[async_trait]
impl TxWatcher for ChainClient {
    async fn wait_for_outcome(
        &self,
        tx_hash: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxOutcome> {
        match self {
            ChainClient::Evm(c) => c.wait_for_receipt(tx_hash, timeout, poll_interval).await,
            ChainClient::Solana(c) => {
                c.wait_for_signature(tx_hash, timeout, poll_interval).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn success(hash: &str) -> TxOutcome {
        TxOutcome {
            tx_hash: hash.into(),
            status: TxStatus::Success,
            receipt: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_returns_once_check_settles() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let outcome = poll_outcome("0xabc", Duration::from_secs(60), Duration::from_secs(2), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Ok(None)
                } else {
                    Ok(Some(success("0xabc")))
                }
            }
        })
        .await
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_keeps_going_after_network_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let outcome = poll_outcome("0x1", Duration::from_secs(10), Duration::from_secs(1), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DeckError::Network("connection reset".into()).into())
                } else {
                    Ok(Some(success("0x1")))
                }
            }
        })
        .await;
        assert!(outcome.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_times_out() {
        let err = poll_outcome("0xdead", Duration::from_secs(60), Duration::from_secs(2), || async {
            Ok(None)
        })
        .await
        .unwrap_err();

        match err.downcast_ref::<DeckError>() {
            Some(DeckError::Timeout {
                tx_hash,
                secs,
                last_error,
            }) => {
                assert_eq!(tx_hash, "0xdead");
                assert_eq!(*secs, 60);
                assert!(last_error.is_none());
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_stops_on_client_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let err = poll_outcome("0x2", Duration::from_secs(60), Duration::from_secs(2), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DeckError::Http {
                    status: 401,
                    body: "invalid project id".into(),
                }
                .into())
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            err.downcast_ref::<DeckError>(),
            Some(DeckError::Http { status: 401, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_reports_last_network_failure() {
        let err = poll_outcome("0x3", Duration::from_secs(10), Duration::from_secs(2), || async {
            Err(DeckError::Network("eth_getTransactionReceipt: connection refused".into()).into())
        })
        .await
        .unwrap_err();

        match err.downcast_ref::<DeckError>() {
            Some(DeckError::Timeout { last_error, .. }) => assert_eq!(
                last_error.as_deref(),
                Some("Network error: eth_getTransactionReceipt: connection refused")
            ),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(err.to_string().contains("last check failed"));
    }

    #[test]
    fn contract_address_comes_from_receipt() {
        let mut outcome = success("0x1");
        assert!(outcome.contract_address().is_none());
        outcome.receipt = Some(EvmReceipt {
            transaction_hash: "0x1".into(),
            status: Some("0x1".into()),
            block_number: Some("0x10".into()),
            gas_used: None,
            contract_address: Some("0x00000000000000000000000000000000000000c0".into()),
        });
        assert_eq!(
            outcome.contract_address(),
            Some("0x00000000000000000000000000000000000000c0")
        );
    }
}
