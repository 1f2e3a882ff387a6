use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use deck_admin::{AdminApi, DeploymentRef, RelayAction, SetClaimRootRequest, SetFeeRequest};
use deck_chain::{ContractReader, Distributor, Erc20, FeeSettings, TxOutcome};
use deck_core::fixed::parse_uint;
use deck_core::{AppConf, DeckError, Deployment, configuration_id};
use serde::Serialize;
use tracing::info;

use crate::deploy::TxContext;
use crate::store::AppStore;

/// Live distributor state as read from chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorSnapshot {
    pub address: Address,
    pub token: Address,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub vault: Address,
    pub signer: Address,
    pub active: bool,
    pub vault_balance: U256,
    /// What the vault lets the distributor pull.
    pub allowance: U256,
}

/// Where a named root comes from. Deployment-scoped roots win over the
/// app-wide ones produced by uploads.
pub fn lookup_root<'c>(app: &'c AppConf, deployment: &'c Deployment, root_name: &str) -> Option<&'c str> {
    deployment
        .extra
        .root
        .get(root_name)
        .or_else(|| app.extra.root.get(root_name))
        .map(String::as_str)
}

fn parse_root(root_name: &str, hash: &str) -> Result<B256, DeckError> {
    B256::from_str(hash.trim())
        .map_err(|_| DeckError::Validation(format!("root '{root_name}' is not a 32-byte hash")))
}

pub struct ContractInspector<'a> {
    tx: TxContext<'a>,
    reader: &'a dyn ContractReader,
}

impl<'a> ContractInspector<'a> {
    pub fn new(tx: TxContext<'a>, reader: &'a dyn ContractReader) -> Self {
        Self { tx, reader }
    }

    pub async fn snapshot(&self, deployment: &Deployment) -> Result<DistributorSnapshot> {
        let distributor = Distributor::at(self.reader, deployment.contract()?)?;
        let (token, vault, signer, active) = tokio::try_join!(
            distributor.token(),
            distributor.vault(),
            distributor.signer(),
            distributor.active(),
        )?;

        let erc20 = Erc20::new(self.reader, token);
        let (token_symbol, token_decimals, vault_balance, allowance) = tokio::try_join!(
            erc20.symbol(),
            erc20.decimals(),
            erc20.balance_of(vault),
            erc20.allowance(vault, distributor.address()),
        )?;

        Ok(DistributorSnapshot {
            address: distributor.address(),
            token,
            token_symbol,
            token_decimals,
            vault,
            signer,
            active,
            vault_balance,
            allowance,
        })
    }

    pub async fn fees(&self, deployment: &Deployment, configuration: &str) -> Result<FeeSettings> {
        Distributor::at(self.reader, deployment.contract()?)?
            .fee_settings(configuration_id(configuration))
            .await
    }

    /// Configuration id the distributor has bound to a named root.
    pub async fn root_binding(&self, app: &AppConf, deployment: &Deployment, root_name: &str) -> Result<B256> {
        let hash = lookup_root(app, deployment, root_name)
            .ok_or_else(|| DeckError::NotFound(format!("Root '{root_name}'")))?;
        let root = parse_root(root_name, hash)?;
        Distributor::at(self.reader, deployment.contract()?)?
            .configuration_for_root(root)
            .await
    }

    pub async fn pause(&self, app_id: &str, deployment: &str) -> Result<TxOutcome> {
        self.toggle(app_id, deployment, RelayAction::DistributorPause).await
    }

    pub async fn unpause(&self, app_id: &str, deployment: &str) -> Result<TxOutcome> {
        self.toggle(app_id, deployment, RelayAction::DistributorUnpause).await
    }

    async fn toggle(&self, app_id: &str, deployment: &str, action: RelayAction) -> Result<TxOutcome> {
        let busy_key = format!("active:{app_id}/{deployment}");
        let outcome = self
            .tx
            .relay_and_wait(&busy_key, action, &DeploymentRef::new(app_id, deployment))
            .await?;
        info!(app_id, deployment, action = %action, "distributor toggled");
        Ok(outcome)
    }

    /// Bind a root to a configuration on chain and record the binding in
    /// `rootConf`.
    pub async fn set_claim_root<A>(
        &self,
        store: &mut AppStore<A>,
        deployment: &str,
        root_name: &str,
        configuration: &str,
    ) -> Result<TxOutcome>
    where
        A: AdminApi + ?Sized,
    {
        let app = store.current()?;
        let dep = app.deployment(deployment)?;
        dep.configuration(configuration)?;
        let hash = lookup_root(app, dep, root_name)
            .ok_or_else(|| DeckError::NotFound(format!("Root '{root_name}'")))?;
        parse_root(root_name, hash)?;

        let request = SetClaimRootRequest {
            app_id: app.app_id.clone(),
            deployment: deployment.to_string(),
            root: hash.to_string(),
            hook_name: configuration.to_string(),
        };
        let busy_key = format!("claim-root:{}/{deployment}/{root_name}", app.app_id);
        let outcome = self
            .tx
            .relay_and_wait(&busy_key, RelayAction::DistributorSetClaimRoot, &request)
            .await?;

        store
            .commit(|conf| {
                conf.deployment_mut(deployment)?
                    .extra
                    .root_conf
                    .insert(root_name.to_string(), configuration.to_string());
                Ok(())
            })
            .await?;
        info!(deployment, root = root_name, configuration, "claim root bound");
        Ok(outcome)
    }

    pub async fn set_fee(
        &self,
        app_id: &str,
        deployment: &str,
        configuration: &str,
        fee_mode: u8,
        fixed_fee: &str,
        single_tier_fee_rate: &str,
    ) -> Result<TxOutcome> {
        let integer = |field: &str, value: &str| {
            parse_uint(value)
                .map(|v| v.to_string())
                .ok_or_else(|| DeckError::Validation(format!("{field} must be a whole number")))
        };
        let request = SetFeeRequest {
            app_id: app_id.to_string(),
            deployment: deployment.to_string(),
            hook_name: configuration.to_string(),
            fee_mode,
            fixed_fee: integer("Fixed fee", fixed_fee)?,
            single_tier_fee_rate: integer("Fee rate", single_tier_fee_rate)?,
        };
        let busy_key = format!("fee:{app_id}/{deployment}/{configuration}");
        self.tx
            .relay_and_wait(&busy_key, RelayAction::DistributorSetFee, &request)
            .await
    }
}
