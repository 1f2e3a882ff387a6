use alloy_primitives::U256;
use anyhow::Result;
use deck_admin::{AdminApi, RelayAction, SetPenaltyConfigRequest};
use deck_chain::{ContractReader, PenaltyHook, PenaltyWindow, TxOutcome};
use deck_core::fixed::parse_uint;
use deck_core::model::ROLE_PENALTY_HOOK;
use deck_core::validate::{parse_timestamp, require_non_empty};
use deck_core::{DeckError, Deployment, configuration_id};
use tracing::info;

use super::{HookKind, deploy_hook};
use crate::deploy::TxContext;
use crate::store::AppStore;

/// Editable penalty window. Times are unix seconds or RFC 3339.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PenaltyDraft {
    pub begin_time: String,
    pub end_time: String,
}

impl PenaltyDraft {
    pub fn from_window(window: &PenaltyWindow) -> Self {
        Self {
            begin_time: window.begin_time.to_string(),
            end_time: window.end_time.to_string(),
        }
    }

    pub fn validate(&self) -> Result<PenaltyWindow, DeckError> {
        let begin_time = parse_timestamp("Begin time", &self.begin_time)?;
        let end_time = parse_timestamp("End time", &self.end_time)?;
        if end_time <= begin_time {
            return Err(DeckError::Validation(
                "End time must be after begin time".into(),
            ));
        }
        Ok(PenaltyWindow {
            begin_time,
            end_time,
        })
    }
}

pub struct PenaltyHookEditor<'a> {
    tx: TxContext<'a>,
    reader: &'a dyn ContractReader,
}

impl<'a> PenaltyHookEditor<'a> {
    pub fn new(tx: TxContext<'a>, reader: &'a dyn ContractReader) -> Self {
        Self { tx, reader }
    }

    pub async fn read(&self, deployment: &Deployment, configuration: &str) -> Result<PenaltyWindow> {
        let hook = PenaltyHook::at(self.reader, deployment.require_role(ROLE_PENALTY_HOOK)?)?;
        hook.window(configuration_id(configuration)).await
    }

    /// Penalty the hook would currently take from `amount` (base units).
    pub async fn preview(&self, deployment: &Deployment, configuration: &str, amount: &str) -> Result<U256> {
        let amount = parse_uint(require_non_empty("Amount", amount)?)
            .ok_or_else(|| DeckError::Validation(format!("'{amount}' is not a whole token amount")))?;
        let hook = PenaltyHook::at(self.reader, deployment.require_role(ROLE_PENALTY_HOOK)?)?;
        hook.penalty(configuration_id(configuration), amount).await
    }

    pub async fn submit(
        &self,
        app_id: &str,
        deployment_name: &str,
        deployment: &Deployment,
        configuration: &str,
        draft: &PenaltyDraft,
    ) -> Result<PenaltyWindow> {
        let window = draft.validate()?;
        deployment.require_role(ROLE_PENALTY_HOOK)?;

        let request = SetPenaltyConfigRequest {
            app_id: app_id.to_string(),
            deployment: deployment_name.to_string(),
            hook_name: configuration.to_string(),
            begin_time: window.begin_time.to_string(),
            end_time: window.end_time.to_string(),
        };
        let busy_key = format!("penalty:{app_id}/{deployment_name}/{configuration}");
        let outcome = self
            .tx
            .relay_and_wait(&busy_key, RelayAction::PenaltyHookSetConfig, &request)
            .await?;
        info!(configuration, tx_hash = %outcome.tx_hash, "penalty window updated");

        self.read(deployment, configuration).await
    }

    pub async fn deploy<A>(&self, store: &mut AppStore<A>, deployment: &str) -> Result<TxOutcome>
    where
        A: AdminApi + ?Sized,
    {
        deploy_hook(&self.tx, store, deployment, HookKind::LinearPenalty).await
    }
}
