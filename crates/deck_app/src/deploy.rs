//! Relay-and-wait plumbing shared by every write path, and the
//! configuration deploy flow built on it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use deck_admin::{AdminApi, RelayAction, SetHookRequest, relay_typed};
use deck_chain::{BatchConfigurationSource, ChainFamily, ChainId, TxOutcome, TxStatus, TxWatcher};
use deck_core::model::ROLE_PROJECT_ADMIN;
use deck_core::{DeckConfig, DeckError};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::reconcile::{ConfigurationStatus, reconcile_deployment};
use crate::store::AppStore;

// ---------------------------------------------------------------------------
// Busy flags
// ---------------------------------------------------------------------------

/// One in-flight marker per action key.
#[derive(Default)]
pub struct BusyFlags {
    flags: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

/// Clears its flag when dropped.
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl BusyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, key: &str) -> Result<BusyGuard, DeckError> {
        let flag = Arc::clone(
            self.flags
                .lock()
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AtomicBool::new(false))),
        );
        if flag.swap(true, Ordering::AcqRel) {
            return Err(DeckError::Busy(key.to_string()));
        }
        Ok(BusyGuard { flag })
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.flags
            .lock()
            .get(key)
            .is_some_and(|f| f.load(Ordering::Acquire))
    }
}

// ---------------------------------------------------------------------------
// Relay + wait
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl TxSettings {
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            timeout: config.tx_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Collaborators a write needs: who relays, who watches, and the busy
/// markers that keep one action from running twice.
#[derive(Clone, Copy)]
pub struct TxContext<'a> {
    pub api: &'a dyn AdminApi,
    pub watcher: &'a dyn TxWatcher,
    pub flags: &'a BusyFlags,
    pub settings: TxSettings,
}

impl<'a> TxContext<'a> {
    /// Relay `body` as `action` under the busy key and wait for the outcome.
    /// A transaction that settles unsuccessfully is an error.
    pub async fn relay_and_wait<B>(&self, busy_key: &str, action: RelayAction, body: &B) -> Result<TxOutcome>
    where
        B: Serialize + ?Sized,
    {
        let _guard = self.flags.try_acquire(busy_key)?;
        let tx_hash = relay_typed(self.api, action, body).await?;
        info!(action = %action, tx_hash = %tx_hash, "waiting for relayed transaction");
        let outcome = self
            .watcher
            .wait_for_outcome(&tx_hash, self.settings.timeout, self.settings.poll_interval)
            .await?;
        ensure_success(outcome)
    }
}

fn ensure_success(outcome: TxOutcome) -> Result<TxOutcome> {
    match outcome.status {
        TxStatus::Success => Ok(outcome),
        TxStatus::Failure if outcome.receipt.is_some() => Err(DeckError::TransactionReverted {
            tx_hash: outcome.tx_hash,
        }
        .into()),
        TxStatus::Failure => Err(DeckError::TransactionFailed {
            tx_hash: outcome.tx_hash,
        }
        .into()),
    }
}

/// Record the contract created by a deploy transaction under `role` and save.
///
/// Solana settlements carry no receipt, so the address cannot be learned
/// from the outcome. The deploy still succeeded; the role is left unset and
/// `None` is returned.
pub(crate) async fn record_created_contract<A>(
    store: &mut AppStore<A>,
    deployment: &str,
    role: &str,
    outcome: &TxOutcome,
) -> Result<Option<String>>
where
    A: AdminApi + ?Sized,
{
    let chain: ChainId = store.current()?.deployment(deployment)?.chain_id.parse()?;
    let Some(address) = outcome.contract_address().map(str::to_string) else {
        if chain.family() == ChainFamily::Solana {
            warn!(
                deployment,
                role,
                tx_hash = %outcome.tx_hash,
                "deploy settled without a receipt, role left unassigned"
            );
            return Ok(None);
        }
        return Err(DeckError::Decode(format!("{role} receipt has no contract address")).into());
    };

    store
        .commit(|conf| {
            conf.deployment_mut(deployment)?
                .roles
                .insert(role.to_string(), address.clone());
            Ok(())
        })
        .await?;
    Ok(Some(address))
}

// ---------------------------------------------------------------------------
// Configuration deploy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub outcome: TxOutcome,
    /// Non-blocking findings from validation.
    pub warnings: Vec<String>,
    /// Fresh reconciliation of the whole deployment.
    pub statuses: BTreeMap<String, ConfigurationStatus>,
}

/// Pushes a named configuration's strategy on chain.
pub struct ConfigurationDeployer<'a> {
    tx: TxContext<'a>,
    source: &'a dyn BatchConfigurationSource,
}

impl<'a> ConfigurationDeployer<'a> {
    pub fn new(tx: TxContext<'a>, source: &'a dyn BatchConfigurationSource) -> Self {
        Self { tx, source }
    }

    pub async fn apply<A>(&self, store: &mut AppStore<A>, deployment: &str, name: &str) -> Result<ApplyReport>
    where
        A: AdminApi + ?Sized,
    {
        let conf = store.current()?;
        let dep = conf.deployment(deployment)?;
        let warnings = dep.configuration(name)?.validate().into_result()?;
        for warning in &warnings {
            warn!(configuration = name, "{warning}");
        }

        let request = SetHookRequest {
            app_id: conf.app_id.clone(),
            deployment: deployment.to_string(),
            project_admin: dep.require_role(ROLE_PROJECT_ADMIN)?.to_string(),
            hook_name: name.to_string(),
            strategy: dep.resolved_strategy(name)?,
            fallback_idx: dep.configuration(name)?.fallback_idx.clone(),
        };
        let busy_key = format!("apply:{}/{deployment}/{name}", conf.app_id);

        let outcome = self
            .tx
            .relay_and_wait(&busy_key, RelayAction::DistributorSetHook, &request)
            .await?;
        info!(
            app_id = %request.app_id,
            configuration = name,
            tx_hash = %outcome.tx_hash,
            "configuration applied"
        );

        store
            .commit(|conf| {
                if let Some(config) = conf
                    .deployment_mut(deployment)?
                    .extra
                    .configurations
                    .get_mut(name)
                {
                    config.deployed = true;
                }
                Ok(())
            })
            .await?;

        let statuses = reconcile_deployment(self.source, store.current()?.deployment(deployment)?).await;
        Ok(ApplyReport {
            outcome,
            warnings,
            statuses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_flag_rejects_second_holder() {
        let flags = BusyFlags::new();
        let guard = flags.try_acquire("apply:a/b/c").unwrap();
        assert!(flags.is_busy("apply:a/b/c"));
        let err = flags.try_acquire("apply:a/b/c").err().unwrap();
        assert_eq!(err, DeckError::Busy("apply:a/b/c".into()));

        // other keys are independent
        assert!(flags.try_acquire("apply:a/b/d").is_ok());

        drop(guard);
        assert!(!flags.is_busy("apply:a/b/c"));
        assert!(flags.try_acquire("apply:a/b/c").is_ok());
    }

    #[test]
    fn failed_outcomes_become_errors() {
        let reverted = TxOutcome {
            tx_hash: "0x1".into(),
            status: TxStatus::Failure,
            receipt: Some(deck_chain::EvmReceipt {
                transaction_hash: "0x1".into(),
                status: Some("0x0".into()),
                block_number: None,
                gas_used: None,
                contract_address: None,
            }),
        };
        let err = ensure_success(reverted).unwrap_err();
        assert_eq!(err.to_string(), "Transaction reverted");

        let failed = TxOutcome {
            tx_hash: "sig".into(),
            status: TxStatus::Failure,
            receipt: None,
        };
        assert_eq!(ensure_success(failed).unwrap_err().to_string(), "Transaction failed");
    }

    #[test]
    fn settings_follow_config() {
        let config = DeckConfig {
            tx_timeout_secs: 5,
            poll_interval_ms: 250,
            ..DeckConfig::default()
        };
        let settings = TxSettings::from_config(&config);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
    }
}
