//! Four-step flow that creates an app: basic settings, relayers, batch
//! upload, then distributor deployment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use deck_admin::{
    AdminApi, BatchUpload, CreateRelayerRequest, DeploymentRef, RelayAction, RelayerInfo,
    UploadResponse,
};
use deck_chain::{ChainId, TxOutcome};
use deck_chain::rpc::validate_url;
use deck_core::model::ROLE_CONTRACT;
use deck_core::validate::{require_address, require_non_empty};
use deck_core::{AppConf, DeckError, Deployment, SessionState, user_message};
use tracing::{info, warn};

use crate::deploy::{TxContext, record_created_contract};
use crate::store::AppStore;

pub const NO_FILE_SELECTED: &str = "Please select a CSV file";

/// Which step of the wizard the operator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Basic,
    Relayer,
    UploadBatch,
    Deployment,
}

impl WizardStep {
    /// Zero-based position.
    pub fn index(self) -> usize {
        match self {
            Self::Basic => 0,
            Self::Relayer => 1,
            Self::UploadBatch => 2,
            Self::Deployment => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Relayer => "Relayer",
            Self::UploadBatch => "Upload batch",
            Self::Deployment => "Deployment",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Basic => Some(Self::Relayer),
            Self::Relayer => Some(Self::UploadBatch),
            Self::UploadBatch => Some(Self::Deployment),
            Self::Deployment => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Basic => None,
            Self::Relayer => Some(Self::Basic),
            Self::UploadBatch => Some(Self::Relayer),
            Self::Deployment => Some(Self::UploadBatch),
        }
    }
}

/// Whether `contents` is a CSV whose header row names `primary_key`.
pub fn csv_has_column(contents: &[u8], primary_key: &str) -> Result<bool> {
    let mut reader = csv::Reader::from_reader(contents);
    let headers = reader.headers().context("failed to read CSV header")?;
    Ok(headers.iter().any(|h| h.trim() == primary_key))
}

/// Read a recipient CSV and check its header before anything is sent.
pub fn read_batch(path: &Path, template: &str, primary_key: &str) -> Result<BatchUpload> {
    let primary_key = require_non_empty("Primary key", primary_key)?;
    let contents =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !csv_has_column(&contents, primary_key)? {
        return Err(DeckError::Validation(format!(
            "CSV header has no '{primary_key}' column"
        ))
        .into());
    }
    Ok(BatchUpload {
        template: template.trim().to_string(),
        primary_key: primary_key.to_string(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "batch.csv".into()),
        contents,
    })
}

pub struct Wizard<A: AdminApi + ?Sized = dyn AdminApi> {
    store: AppStore<A>,
    session_path: PathBuf,
    current_step: WizardStep,
    error: Option<String>,
    csv_file: Option<PathBuf>,
}

impl<A: AdminApi + ?Sized> Wizard<A> {
    /// Start a new app.
    pub fn new(api: Arc<A>, session_path: impl Into<PathBuf>) -> Self {
        let mut store = AppStore::new(api);
        store.load(AppConf::default());
        Self {
            store,
            session_path: session_path.into(),
            current_step: WizardStep::Basic,
            error: None,
            csv_file: None,
        }
    }

    /// Pick up the app recorded as in progress, if any. The flow restarts
    /// at the relayer step since the basic settings were already saved.
    pub async fn resume(api: Arc<A>, session_path: impl Into<PathBuf>) -> Result<Option<Self>> {
        let session_path = session_path.into();
        let Some(app_id) = SessionState::load_from(&session_path)?.in_progress_app_id else {
            return Ok(None);
        };
        let mut store = AppStore::new(api);
        store.select(app_id.as_str());
        store.fetch().await?;
        info!(app_id = %app_id, "wizard resumed");
        Ok(Some(Self {
            store,
            session_path,
            current_step: WizardStep::Relayer,
            error: None,
            csv_file: None,
        }))
    }

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    /// Message from the last failed action, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn store(&self) -> &AppStore<A> {
        &self.store
    }

    pub fn app(&self) -> Result<&AppConf> {
        self.store.current()
    }

    pub fn app_mut(&mut self) -> Result<&mut AppConf> {
        self.store.current_mut()
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(user_message(e)),
        }
        result
    }

    // -- navigation --------------------------------------------------------

    /// Save the app, then move forward. Returns `true` if the step changed.
    pub async fn next(&mut self) -> bool {
        let saved = self.save_progress().await;
        if self.record(saved).is_err() {
            return false;
        }
        match self.current_step.next() {
            Some(next) => {
                self.current_step = next;
                true
            }
            None => false,
        }
    }

    async fn save_progress(&mut self) -> Result<()> {
        let app_id = require_non_empty("App ID", &self.store.current()?.app_id)?.to_string();
        self.store.save().await?;
        if self.current_step == WizardStep::Basic {
            SessionState::update(&self.session_path, |s| {
                s.in_progress_app_id = Some(app_id.clone());
            })?;
        }
        Ok(())
    }

    /// Save the app without moving.
    pub async fn save(&mut self) -> Result<()> {
        let saved = self.save_progress().await;
        self.record(saved)
    }

    /// Move back without saving.
    pub fn previous(&mut self) -> bool {
        match self.current_step.prev() {
            Some(prev) => {
                self.current_step = prev;
                true
            }
            None => false,
        }
    }

    /// Save and forget the in-progress marker.
    pub async fn finish(&mut self) -> Result<()> {
        let result = self.finish_inner().await;
        self.record(result)
    }

    async fn finish_inner(&mut self) -> Result<()> {
        self.store.save().await?;
        SessionState::update(&self.session_path, |s| s.in_progress_app_id = None)?;
        info!(app_id = ?self.store.app_id(), "wizard finished");
        Ok(())
    }

    // -- basic -------------------------------------------------------------

    pub fn set_basic(&mut self, app_id: &str, gated: bool, unique_device: bool) -> Result<()> {
        let conf = self.store.current_mut()?;
        conf.app_id = app_id.trim().to_string();
        conf.gated = gated;
        conf.unique_device = unique_device;
        let conf = conf.clone();
        self.store.load(conf);
        Ok(())
    }

    // -- relayer -----------------------------------------------------------

    pub async fn create_relayer(&mut self, chain_id: &str) -> Result<RelayerInfo> {
        let result = self.create_relayer_inner(chain_id).await;
        self.record(result)
    }

    async fn create_relayer_inner(&self, chain_id: &str) -> Result<RelayerInfo> {
        let chain: ChainId = chain_id.parse()?;
        let request = CreateRelayerRequest {
            app_id: self.store.current()?.app_id.clone(),
            chain_id: chain.to_string(),
        };
        let relayer = self.store.api().create_relayer(&request).await?;
        info!(app_id = %request.app_id, chain_id = %chain, address = %relayer.address, "relayer added");
        Ok(relayer)
    }

    pub async fn relayers(&self) -> Result<Vec<RelayerInfo>> {
        let app_id = &self.store.current()?.app_id;
        self.store.api().list_relayers(app_id).await
    }

    /// Assign a relayer (or any address) to a deployment role.
    pub fn assign_role(&mut self, deployment: &str, role: &str, address: &str) -> Result<()> {
        let result = (|| -> Result<()> {
            let address = require_address(role, address)?;
            self.store
                .current_mut()?
                .deployment_mut(deployment)?
                .roles
                .insert(role.to_string(), address);
            Ok(())
        })();
        self.record(result)
    }

    // -- upload ------------------------------------------------------------

    pub fn select_csv(&mut self, path: impl Into<PathBuf>) {
        self.csv_file = Some(path.into());
    }

    pub fn selected_csv(&self) -> Option<&Path> {
        self.csv_file.as_deref()
    }

    /// Upload the selected CSV as `batch_name` and merge the returned roots
    /// into the app.
    pub async fn upload_batch(
        &mut self,
        batch_name: &str,
        template: &str,
        primary_key: &str,
    ) -> Result<UploadResponse> {
        let result = self.upload_inner(batch_name, template, primary_key).await;
        self.record(result)
    }

    async fn upload_inner(
        &mut self,
        batch_name: &str,
        template: &str,
        primary_key: &str,
    ) -> Result<UploadResponse> {
        let path = self
            .csv_file
            .clone()
            .ok_or_else(|| DeckError::Validation(NO_FILE_SELECTED.into()))?;
        let upload = read_batch(&path, template, primary_key)?;
        let batch_name = require_non_empty("Batch name", batch_name)?;
        let app_id = self.store.current()?.app_id.clone();
        let response = self.store.api().upload_batch(&app_id, batch_name, &upload).await?;
        if response.root.is_empty() {
            warn!(app_id = %app_id, batch = batch_name, "upload returned no roots");
        }
        self.store.current_mut()?.merge_roots(&response.root);
        Ok(response)
    }

    // -- deployment --------------------------------------------------------

    /// Register a deployment target. Nothing is sent until the next save.
    pub fn add_deployment(&mut self, name: &str, chain_id: &str, rpc_url: &str) -> Result<()> {
        let result = (|| -> Result<()> {
            let name = require_non_empty("Deployment name", name)?;
            let chain: ChainId = chain_id.parse()?;
            if !validate_url(rpc_url.trim()) {
                return Err(DeckError::Validation(format!("'{rpc_url}' is not an http(s) URL")).into());
            }
            self.store
                .current_mut()?
                .deployments
                .entry(name.to_string())
                .or_insert_with(|| Deployment::new(chain.to_string(), rpc_url.trim()));
            Ok(())
        })();
        self.record(result)
    }

    /// Relay the distributor deployment for `deployment`.
    pub async fn deploy_distributor(&mut self, tx: &TxContext<'_>, deployment: &str) -> Result<TxOutcome> {
        let result = deploy_distributor(tx, &mut self.store, deployment).await;
        self.record(result)
    }
}

/// Relay the distributor deployment and record its address as the
/// deployment's `contract` role. The app is saved afterwards.
pub async fn deploy_distributor<A>(
    tx: &TxContext<'_>,
    store: &mut AppStore<A>,
    deployment: &str,
) -> Result<TxOutcome>
where
    A: AdminApi + ?Sized,
{
    let app_id = store.current()?.app_id.clone();
    store.current()?.deployment(deployment)?;

    let busy_key = format!("deploy:{app_id}/{deployment}/{ROLE_CONTRACT}");
    let outcome = tx
        .relay_and_wait(
            &busy_key,
            RelayAction::DistributorDeploy,
            &DeploymentRef::new(&app_id, deployment),
        )
        .await?;
    if let Some(address) = record_created_contract(store, deployment, ROLE_CONTRACT, &outcome).await? {
        info!(app_id = %app_id, deployment, contract = %address, "distributor deployed");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_walk_in_order() {
        assert_eq!(WizardStep::Basic.next(), Some(WizardStep::Relayer));
        assert_eq!(WizardStep::Deployment.next(), None);
        assert_eq!(WizardStep::Basic.prev(), None);
        assert_eq!(WizardStep::UploadBatch.prev(), Some(WizardStep::Relayer));
        assert_eq!(WizardStep::Deployment.index(), 3);
    }

    #[test]
    fn csv_header_check() {
        let csv = b"address,amount\n0x1,10\n";
        assert!(csv_has_column(csv, "address").unwrap());
        assert!(!csv_has_column(csv, "wallet").unwrap());
        assert!(csv_has_column(b" address , amount\n", "address").unwrap());
    }
}
