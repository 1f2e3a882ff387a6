use anyhow::Result;
use deck_admin::AdminApi;
use deck_chain::TxOutcome;

use super::{HookKind, deploy_hook};
use crate::deploy::TxContext;
use crate::store::AppStore;

/// The transfer hook has no parameters; it can only be deployed.
pub struct TransferHookEditor<'a> {
    tx: TxContext<'a>,
}

impl<'a> TransferHookEditor<'a> {
    pub fn new(tx: TxContext<'a>) -> Self {
        Self { tx }
    }

    pub async fn deploy<A>(&self, store: &mut AppStore<A>, deployment: &str) -> Result<TxOutcome>
    where
        A: AdminApi + ?Sized,
    {
        deploy_hook(&self.tx, store, deployment, HookKind::Transfer).await
    }
}
