#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{B256, U256};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use deck_admin::{
    AdminApi, Allocation, BatchUpload, CreateRelayerRequest, RelayAction, RelayerInfo,
    RpcProvider, UploadResponse,
};
use deck_app::{AppStore, BusyFlags, TxContext, TxSettings};
use deck_chain::{
    BatchConfigurationSource, EvmReceipt, OnChainConfiguration, OnChainStrategy, TxOutcome,
    TxStatus, TxWatcher,
};
use deck_core::{AppConf, DeckError, Deployment, Strategy, configuration_id};
use parking_lot::Mutex;
use serde_json::Value;

pub const HOOK_A: &str = "0x00000000000000000000000000000000000000aa";
pub const HOOK_B: &str = "0x00000000000000000000000000000000000000bb";
pub const DISTRIBUTOR: &str = "0x00000000000000000000000000000000000000d1";
pub const ADMIN: &str = "0x00000000000000000000000000000000000000ad";
pub const QUARTER: &str = "250000000000000000";

// -- Admin backend -----------------------------------------------------------

/// In-memory backend that records every call by name.
#[derive(Default)]
pub struct FakeAdmin {
    pub apps: Mutex<BTreeMap<String, AppConf>>,
    pub calls: Mutex<Vec<String>>,
    pub relayed: Mutex<Vec<(RelayAction, Value)>>,
    pub relayers: Mutex<Vec<RelayerInfo>>,
    pub upload_roots: Mutex<BTreeMap<String, String>>,
    pub uploads: Mutex<Vec<(String, String, BatchUpload)>>,
    pub save_fails: Mutex<bool>,
}

impl FakeAdmin {
    pub fn with_app(conf: AppConf) -> Arc<Self> {
        let fake = Self::default();
        fake.apps.lock().insert(conf.app_id.clone(), conf);
        Arc::new(fake)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        *self.save_fails.lock() = fail;
    }

    pub fn stored(&self, app_id: &str) -> Option<AppConf> {
        self.apps.lock().get(app_id).cloned()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl AdminApi for FakeAdmin {
    async fn list_app_confs(&self) -> Result<Vec<AppConf>> {
        self.record("list_app_confs");
        Ok(self.apps.lock().values().cloned().collect())
    }

    async fn get_app_conf(&self, app_id: &str) -> Result<AppConf> {
        self.record(format!("get_app_conf:{app_id}"));
        self.stored(app_id)
            .ok_or_else(|| DeckError::NotFound(format!("App '{app_id}'")).into())
    }

    async fn save_app_conf(&self, conf: &AppConf) -> Result<()> {
        self.record(format!("save_app_conf:{}", conf.app_id));
        if *self.save_fails.lock() {
            return Err(DeckError::Http {
                status: 500,
                body: "internal error".into(),
            }
            .into());
        }
        self.apps.lock().insert(conf.app_id.clone(), conf.clone());
        Ok(())
    }

    async fn list_relayers(&self, app_id: &str) -> Result<Vec<RelayerInfo>> {
        self.record(format!("list_relayers:{app_id}"));
        Ok(self.relayers.lock().clone())
    }

    async fn create_relayer(&self, request: &CreateRelayerRequest) -> Result<RelayerInfo> {
        self.record(format!("create_relayer:{}", request.chain_id));
        let relayer = RelayerInfo {
            address: ADMIN.into(),
            chain_id: request.chain_id.clone(),
            nonce: 0,
            online: true,
        };
        self.relayers.lock().push(relayer.clone());
        Ok(relayer)
    }

    async fn upload_batch(
        &self,
        app_id: &str,
        batch_name: &str,
        upload: &BatchUpload,
    ) -> Result<UploadResponse> {
        self.record(format!("upload_batch:{app_id}/{batch_name}"));
        self.uploads
            .lock()
            .push((app_id.to_string(), batch_name.to_string(), upload.clone()));
        Ok(UploadResponse {
            root: self.upload_roots.lock().clone(),
        })
    }

    async fn list_allocations(&self, app_id: &str, batch_name: &str) -> Result<Vec<Allocation>> {
        self.record(format!("list_allocations:{app_id}/{batch_name}"));
        Ok(Vec::new())
    }

    async fn relay(&self, action: RelayAction, body: Value) -> Result<String> {
        self.record(format!("relay:{action}"));
        let mut relayed = self.relayed.lock();
        relayed.push((action, body));
        Ok(format!("0xtx{}", relayed.len()))
    }

    async fn list_rpc_providers(&self) -> Result<Vec<RpcProvider>> {
        self.record("list_rpc_providers");
        Ok(Vec::new())
    }

    async fn set_rpc_provider(&self, provider: &RpcProvider) -> Result<()> {
        self.record(format!("set_rpc_provider:{}", provider.chain_id));
        Ok(())
    }

    async fn delete_rpc_provider(&self, chain_id: &str) -> Result<()> {
        self.record(format!("delete_rpc_provider:{chain_id}"));
        Ok(())
    }
}

// -- Chain -------------------------------------------------------------------

/// Settles every transaction immediately with a fixed status.
pub struct FakeWatcher {
    pub status: TxStatus,
    pub contract_address: Option<String>,
    /// EVM watchers attach a receipt; Solana ones never do.
    pub with_receipt: bool,
    pub waited: Mutex<Vec<String>>,
}

impl FakeWatcher {
    pub fn success() -> Self {
        Self {
            status: TxStatus::Success,
            contract_address: None,
            with_receipt: true,
            waited: Mutex::new(Vec::new()),
        }
    }

    /// A finalized Solana signature.
    pub fn finalized() -> Self {
        Self {
            with_receipt: false,
            ..Self::success()
        }
    }

    pub fn creating(address: &str) -> Self {
        Self {
            contract_address: Some(address.to_string()),
            ..Self::success()
        }
    }

    pub fn reverting() -> Self {
        Self {
            status: TxStatus::Failure,
            ..Self::success()
        }
    }
}

#[async_trait]
impl TxWatcher for FakeWatcher {
    async fn wait_for_outcome(
        &self,
        tx_hash: &str,
        _timeout: Duration,
        _poll_interval: Duration,
    ) -> Result<TxOutcome> {
        self.waited.lock().push(tx_hash.to_string());
        let status_hex = match self.status {
            TxStatus::Success => "0x1",
            TxStatus::Failure => "0x0",
        };
        let receipt = self.with_receipt.then(|| EvmReceipt {
            transaction_hash: tx_hash.to_string(),
            status: Some(status_hex.into()),
            block_number: Some("0x10".into()),
            gas_used: Some("0x5208".into()),
            contract_address: self.contract_address.clone(),
        });
        Ok(TxOutcome {
            tx_hash: tx_hash.to_string(),
            status: self.status,
            receipt,
        })
    }
}

/// Batch configurations keyed by configuration id. Unknown ids read as
/// empty; ids in `failing` return an error.
#[derive(Default)]
pub struct FakeSource {
    pub configs: Mutex<HashMap<B256, OnChainConfiguration>>,
    pub failing: Mutex<HashSet<B256>>,
    pub reads: Mutex<Vec<B256>>,
}

impl FakeSource {
    pub fn set(&self, name: &str, strategies: &[(&str, &str)], fallback: u64) {
        let config = OnChainConfiguration {
            strategies: strategies
                .iter()
                .map(|(hook, proportion)| OnChainStrategy {
                    hook: hook.to_lowercase(),
                    proportion: proportion.parse::<U256>().unwrap_or_default(),
                })
                .collect(),
            fallback_hook: U256::from(fallback),
        };
        self.configs.lock().insert(configuration_id(name), config);
    }

    pub fn fail(&self, name: &str) {
        self.failing.lock().insert(configuration_id(name));
    }
}

#[async_trait]
impl BatchConfigurationSource for FakeSource {
    async fn batch_configuration(&self, _distributor: &str, id: B256) -> Result<OnChainConfiguration> {
        self.reads.lock().push(id);
        if self.failing.lock().contains(&id) {
            return Err(anyhow!("execution reverted"));
        }
        Ok(self.configs.lock().get(&id).cloned().unwrap_or_default())
    }
}

// -- Fixtures ----------------------------------------------------------------

pub fn settings() -> TxSettings {
    TxSettings {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    }
}

pub fn tx<'a>(api: &'a FakeAdmin, watcher: &'a FakeWatcher, flags: &'a BusyFlags) -> TxContext<'a> {
    TxContext {
        api,
        watcher,
        flags,
        settings: settings(),
    }
}

/// Deployment `base` on chain 8453 with a distributor, a project admin and
/// the transfer/lock hooks assigned.
pub fn deployment() -> Deployment {
    let mut dep = Deployment::new("8453", "https://mainnet.base.org");
    dep.roles.insert("contract".into(), DISTRIBUTOR.into());
    dep.roles.insert("projectAdmin".into(), ADMIN.into());
    dep.roles.insert("transferHook".into(), HOOK_A.into());
    dep.roles.insert("lockHook".into(), HOOK_B.into());
    dep
}

/// Quarter through the transfer hook, the rest falls back to the lock hook.
pub fn quarter_split() -> deck_core::Configuration {
    deck_core::Configuration {
        strategy: vec![
            Strategy::new("transferHook", QUARTER),
            Strategy::new("lockHook", "0"),
        ],
        fallback_idx: "1".into(),
        deployed: false,
    }
}

/// Deployment `sol` on Solana devnet with only a project admin.
pub fn solana_deployment() -> Deployment {
    let mut dep = Deployment::new("solana:devnet", "https://api.devnet.solana.com");
    dep.roles.insert("projectAdmin".into(), ADMIN.into());
    dep
}

pub fn app_with_deployment() -> AppConf {
    let mut app = AppConf::new("drop");
    let mut dep = deployment();
    dep.extra
        .configurations
        .insert("default".into(), quarter_split());
    app.deployments.insert("base".into(), dep);
    app
}

pub async fn loaded_store(api: &Arc<FakeAdmin>, app_id: &str) -> AppStore<FakeAdmin> {
    let mut store = AppStore::new(Arc::clone(api));
    store.select(app_id);
    store.fetch().await.unwrap();
    store
}

/// Answers every `eth_call` with the same ABI-encoded output.
pub struct CannedReader {
    pub output: Vec<u8>,
    pub calls: Mutex<usize>,
}

impl CannedReader {
    pub fn words(words: &[u64]) -> Self {
        let output = words
            .iter()
            .flat_map(|w| U256::from(*w).to_be_bytes::<32>())
            .collect();
        Self {
            output,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl deck_chain::ContractReader for CannedReader {
    async fn call(&self, _to: alloy_primitives::Address, _data: alloy_primitives::Bytes) -> Result<alloy_primitives::Bytes> {
        *self.calls.lock() += 1;
        Ok(self.output.clone().into())
    }
}
