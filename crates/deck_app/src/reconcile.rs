//! Compares local configuration definitions with what the distributor
//! holds on chain.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use deck_chain::{BatchConfigurationSource, OnChainConfiguration};
use deck_core::fixed::parse_uint;
use deck_core::{Configuration, Deployment, configuration_id};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStatus {
    pub is_deployed: bool,
    pub is_matched: bool,
}

impl ConfigurationStatus {
    /// Nothing on chain, or the read failed.
    pub const NOT_DEPLOYED: Self = Self {
        is_deployed: false,
        is_matched: true,
    };

    pub fn sync_state(self) -> SyncState {
        match (self.is_deployed, self.is_matched) {
            (false, _) => SyncState::NotDeployed,
            (true, true) => SyncState::Synced,
            (true, false) => SyncState::Modified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    NotDeployed,
    Synced,
    Modified,
}

impl SyncState {
    /// What an operator can do about this state.
    pub fn action(self) -> Option<SyncAction> {
        match self {
            SyncState::NotDeployed => Some(SyncAction::Deploy),
            SyncState::Synced => None,
            SyncState::Modified => Some(SyncAction::Redeploy),
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncState::NotDeployed => "not deployed",
            SyncState::Synced => "synced",
            SyncState::Modified => "modified",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncAction {
    Deploy,
    Redeploy,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncAction::Deploy => "Deploy",
            SyncAction::Redeploy => "Redeploy",
        })
    }
}

/// Positional comparison of a local configuration against its on-chain
/// counterpart. Hooks are resolved through the deployment's roles.
pub fn compare(
    deployment: &Deployment,
    local: &Configuration,
    on_chain: &OnChainConfiguration,
) -> ConfigurationStatus {
    if on_chain.strategies.is_empty() {
        return ConfigurationStatus::NOT_DEPLOYED;
    }

    let same_length = local.strategy.len() == on_chain.strategies.len();
    let entries_match = same_length
        && local
            .strategy
            .iter()
            .zip(&on_chain.strategies)
            .all(|(mine, theirs)| {
                deployment.resolve_hook(&mine.hook).to_lowercase() == theirs.hook.to_lowercase()
                    && parse_uint(&mine.proportion) == Some(theirs.proportion)
            });
    let fallback_matches = parse_uint(&local.fallback_idx) == Some(on_chain.fallback_hook);

    ConfigurationStatus {
        is_deployed: true,
        is_matched: entries_match && fallback_matches,
    }
}

async fn read_and_compare(
    source: &dyn BatchConfigurationSource,
    deployment: &Deployment,
    name: &str,
    local: &Configuration,
) -> Result<ConfigurationStatus> {
    let contract = deployment.contract()?;
    let on_chain = source
        .batch_configuration(contract, configuration_id(name))
        .await?;
    Ok(compare(deployment, local, &on_chain))
}

/// Status of one named configuration. A failed read reports
/// [`ConfigurationStatus::NOT_DEPLOYED`].
pub async fn reconcile_configuration(
    source: &dyn BatchConfigurationSource,
    deployment: &Deployment,
    name: &str,
    local: &Configuration,
) -> ConfigurationStatus {
    match read_and_compare(source, deployment, name, local).await {
        Ok(status) => {
            debug!(configuration = name, ?status, "configuration reconciled");
            status
        }
        Err(e) => {
            warn!(
                configuration = name,
                chain_id = %deployment.chain_id,
                error = %e,
                "batch configuration read failed"
            );
            ConfigurationStatus::NOT_DEPLOYED
        }
    }
}

/// Status of every configuration in `deployment`, read concurrently.
pub async fn reconcile_deployment(
    source: &dyn BatchConfigurationSource,
    deployment: &Deployment,
) -> BTreeMap<String, ConfigurationStatus> {
    let configurations = &deployment.extra.configurations;
    let statuses = join_all(
        configurations
            .iter()
            .map(|(name, local)| reconcile_configuration(source, deployment, name, local)),
    )
    .await;
    configurations.keys().cloned().zip(statuses).collect()
}
