//! Per-hook editors. Each reads current on-chain parameters for a
//! `(hook, configuration)` pair, validates a draft of human input, relays
//! the change and refetches.

pub mod lock;
pub mod penalty;
pub mod transfer;

use std::fmt;

use anyhow::Result;
use deck_admin::{AdminApi, DeploymentRef, RelayAction};
use deck_chain::TxOutcome;
use deck_core::model::{ROLE_LOCK_HOOK, ROLE_PENALTY_HOOK, ROLE_TRANSFER_HOOK};
use tracing::info;

use crate::deploy::{TxContext, record_created_contract};
use crate::store::AppStore;

pub use lock::{LockDraft, LockHookEditor};
pub use penalty::{PenaltyDraft, PenaltyHookEditor};
pub use transfer::TransferHookEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Transfer,
    Lock,
    LinearPenalty,
}

impl HookKind {
    pub const ALL: [HookKind; 3] = [HookKind::Transfer, HookKind::Lock, HookKind::LinearPenalty];

    /// Role under which the deployed hook's address is recorded.
    pub fn role(self) -> &'static str {
        match self {
            HookKind::Transfer => ROLE_TRANSFER_HOOK,
            HookKind::Lock => ROLE_LOCK_HOOK,
            HookKind::LinearPenalty => ROLE_PENALTY_HOOK,
        }
    }

    pub fn deploy_action(self) -> RelayAction {
        match self {
            HookKind::Transfer => RelayAction::TransferHookDeploy,
            HookKind::Lock => RelayAction::LockHookDeploy,
            HookKind::LinearPenalty => RelayAction::PenaltyHookDeploy,
        }
    }

    pub fn from_role(role: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.role() == role)
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::Transfer => "transfer hook",
            HookKind::Lock => "lock hook",
            HookKind::LinearPenalty => "linear penalty hook",
        })
    }
}

/// Relay a hook deployment and record the created contract under the
/// hook's role. The app is saved afterwards. On Solana the outcome has no
/// receipt and the role is left for the operator to assign.
pub async fn deploy_hook<A>(
    tx: &TxContext<'_>,
    store: &mut AppStore<A>,
    deployment: &str,
    kind: HookKind,
) -> Result<TxOutcome>
where
    A: AdminApi + ?Sized,
{
    let app_id = store.current()?.app_id.clone();
    store.current()?.deployment(deployment)?;

    let busy_key = format!("deploy:{app_id}/{deployment}/{}", kind.role());
    let outcome = tx
        .relay_and_wait(&busy_key, kind.deploy_action(), &DeploymentRef::new(&app_id, deployment))
        .await?;
    if let Some(address) = record_created_contract(store, deployment, kind.role(), &outcome).await? {
        info!(app_id = %app_id, deployment, role = kind.role(), address = %address, "hook deployed");
    }
    Ok(outcome)
}
