use alloy_primitives::U256;
use anyhow::Result;
use deck_admin::{AdminApi, RelayAction, SetLockPresetRequest};
use deck_chain::{ContractReader, LockHook, LockPreset, TxOutcome};
use deck_core::fixed::{fixed_to_percent, percent_to_fixed};
use deck_core::model::ROLE_LOCK_HOOK;
use deck_core::validate::{parse_duration_secs, parse_timestamp, require_address};
use deck_core::{Deployment, configuration_id};
use tracing::info;

use super::{HookKind, deploy_hook};
use crate::deploy::TxContext;
use crate::store::AppStore;

/// Editable vesting preset, every field as the operator typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockDraft {
    /// Unix seconds or RFC 3339.
    pub start_time: String,
    pub cliff_duration: String,
    pub vesting_duration: String,
    pub piece_duration: String,
    /// Percent, e.g. `"12.5"`.
    pub start_unlock_percentage: String,
    pub cliff_unlock_percentage: String,
    pub lock: String,
    pub is_fixed_start: bool,
}

/// A draft that passed validation, in contract units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLock {
    pub start_time: u64,
    pub cliff_duration: u64,
    pub vesting_duration: u64,
    pub piece_duration: u64,
    pub start_unlock_percentage: U256,
    pub cliff_unlock_percentage: U256,
    pub lock: String,
    pub is_fixed_start: bool,
}

impl LockDraft {
    pub fn from_preset(preset: &LockPreset) -> Self {
        Self {
            start_time: preset.start_time.to_string(),
            cliff_duration: preset.cliff_duration.to_string(),
            vesting_duration: preset.vesting_duration.to_string(),
            piece_duration: preset.piece_duration.to_string(),
            start_unlock_percentage: fixed_to_percent(preset.start_unlock_percentage),
            cliff_unlock_percentage: fixed_to_percent(preset.cliff_unlock_percentage),
            lock: preset.lock.to_string(),
            is_fixed_start: preset.is_fixed_start,
        }
    }

    pub fn validate(&self) -> Result<ValidLock, deck_core::DeckError> {
        Ok(ValidLock {
            start_time: parse_timestamp("Start time", &self.start_time)?,
            cliff_duration: parse_duration_secs("Cliff duration", &self.cliff_duration)?,
            vesting_duration: parse_duration_secs("Vesting duration", &self.vesting_duration)?,
            piece_duration: parse_duration_secs("Piece duration", &self.piece_duration)?,
            start_unlock_percentage: percent_to_fixed(&self.start_unlock_percentage)?,
            cliff_unlock_percentage: percent_to_fixed(&self.cliff_unlock_percentage)?,
            lock: require_address("Lock address", &self.lock)?,
            is_fixed_start: self.is_fixed_start,
        })
    }
}

pub struct LockHookEditor<'a> {
    tx: TxContext<'a>,
    reader: &'a dyn ContractReader,
}

impl<'a> LockHookEditor<'a> {
    pub fn new(tx: TxContext<'a>, reader: &'a dyn ContractReader) -> Self {
        Self { tx, reader }
    }

    /// Preset currently stored for `configuration`.
    pub async fn read(&self, deployment: &Deployment, configuration: &str) -> Result<LockPreset> {
        let hook = LockHook::at(self.reader, deployment.require_role(ROLE_LOCK_HOOK)?)?;
        hook.preset(configuration_id(configuration)).await
    }

    /// Validate and relay `draft`, then return the preset as re-read from
    /// chain.
    pub async fn submit(
        &self,
        app_id: &str,
        deployment_name: &str,
        deployment: &Deployment,
        configuration: &str,
        draft: &LockDraft,
    ) -> Result<LockPreset> {
        let valid = draft.validate()?;
        deployment.require_role(ROLE_LOCK_HOOK)?;

        let request = SetLockPresetRequest {
            app_id: app_id.to_string(),
            deployment: deployment_name.to_string(),
            hook_name: configuration.to_string(),
            start_time: valid.start_time.to_string(),
            cliff_duration: valid.cliff_duration.to_string(),
            vesting_duration: valid.vesting_duration.to_string(),
            piece_duration: valid.piece_duration.to_string(),
            start_unlock_percentage: valid.start_unlock_percentage.to_string(),
            cliff_unlock_percentage: valid.cliff_unlock_percentage.to_string(),
            lock: valid.lock,
            is_fixed_start: valid.is_fixed_start,
        };
        let busy_key = format!("lock:{app_id}/{deployment_name}/{configuration}");
        let outcome: TxOutcome = self
            .tx
            .relay_and_wait(&busy_key, RelayAction::LockHookSetPreset, &request)
            .await?;
        info!(configuration, tx_hash = %outcome.tx_hash, "lock preset updated");

        self.read(deployment, configuration).await
    }

    pub async fn deploy<A>(&self, store: &mut AppStore<A>, deployment: &str) -> Result<TxOutcome>
    where
        A: AdminApi + ?Sized,
    {
        deploy_hook(&self.tx, store, deployment, HookKind::Lock).await
    }
}
