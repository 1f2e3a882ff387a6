use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use deck_core::{DeckError, Deployment};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::chain::ChainId;
use crate::client::ChainClient;
use crate::evm::EvmClient;
use crate::rpc::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::solana::SolanaClient;

/// Creates chain clients on first use and hands out the same instance for
/// every later request on that chain.
pub struct ClientFactory {
    clients: Mutex<HashMap<ChainId, Arc<ChainClient>>>,
    request_timeout: Duration,
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

impl ClientFactory {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            request_timeout,
        }
    }

    /// Cached client for `chain_id`. The first request for a chain must
    /// carry an RPC URL; a different URL for a chain already cached is
    /// ignored until [`ClientFactory::evict`] drops the entry.
    pub fn get_client(&self, chain_id: &ChainId, rpc_url: Option<&str>) -> Result<Arc<ChainClient>> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(chain_id) {
            if let Some(url) = rpc_url.filter(|u| *u != client.rpc_url()) {
                warn!(
                    chain_id = %chain_id,
                    cached = client.rpc_url(),
                    requested = url,
                    "ignoring new RPC URL for cached chain client"
                );
            }
            return Ok(Arc::clone(client));
        }

        let url = rpc_url.filter(|u| !u.is_empty()).ok_or_else(|| {
            DeckError::Config(format!("no RPC URL configured for chain {chain_id}"))
        })?;
        let client = Arc::new(match chain_id {
            ChainId::Evm(id) => ChainClient::Evm(EvmClient::new(*id, url, self.request_timeout)?),
            ChainId::Solana(cluster) => {
                ChainClient::Solana(SolanaClient::new(cluster, url, self.request_timeout)?)
            }
        });
        info!(chain_id = %chain_id, family = %chain_id.family(), rpc_url = url, "chain client created");
        clients.insert(chain_id.clone(), Arc::clone(&client));
        Ok(client)
    }

    /// Client for a stored deployment, parsing its chain id.
    pub fn get_for_deployment(&self, deployment: &Deployment) -> Result<Arc<ChainClient>> {
        let chain_id: ChainId = deployment.chain_id.parse()?;
        self.get_client(&chain_id, Some(deployment.rpc_url.as_str()))
    }

    /// Drop the cached client so the next request builds a fresh one.
    pub fn evict(&self, chain_id: &ChainId) -> bool {
        self.clients.lock().remove(chain_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
