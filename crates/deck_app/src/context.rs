use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use deck_admin::{AdminApi, AdminClient};
use deck_chain::{ChainClient, ClientFactory, TxWatcher};
use deck_core::{ConfigManager, DeckConfig, Deployment};
use tracing::info;

use crate::deploy::{BusyFlags, TxContext, TxSettings};
use crate::store::AppStore;

/// Long-lived services, built once at startup and passed to every command.
pub struct AppContext {
    config: ConfigManager,
    session_path: PathBuf,
    factory: ClientFactory,
    flags: BusyFlags,
    admin: Arc<dyn AdminApi>,
}

impl AppContext {
    pub fn new(config: ConfigManager, session_path: PathBuf, admin: Arc<dyn AdminApi>) -> Self {
        Self {
            config,
            session_path,
            factory: ClientFactory::default(),
            flags: BusyFlags::new(),
            admin,
        }
    }

    /// Context for the selected environment under `~/.dropdeck`.
    pub fn from_home(config: ConfigManager) -> Result<Self> {
        let admin = AdminClient::from_config(&config)?;
        info!(base_url = admin.base_url(), "admin API ready");
        Ok(Self::new(config, DeckConfig::session_path()?, Arc::new(admin)))
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn admin(&self) -> &Arc<dyn AdminApi> {
        &self.admin
    }

    pub fn factory(&self) -> &ClientFactory {
        &self.factory
    }

    pub fn tx_settings(&self) -> TxSettings {
        TxSettings::from_config(&self.config.get())
    }

    pub fn tx<'a>(&'a self, watcher: &'a dyn TxWatcher) -> TxContext<'a> {
        TxContext {
            api: self.admin.as_ref(),
            watcher,
            flags: &self.flags,
            settings: self.tx_settings(),
        }
    }

    /// A store pointed at `app_id`, not yet loaded.
    pub fn store(&self, app_id: &str) -> AppStore {
        let mut store = AppStore::new(Arc::clone(&self.admin));
        store.select(app_id);
        store
    }

    pub fn client_for(&self, deployment: &Deployment) -> Result<Arc<ChainClient>> {
        self.factory.get_for_deployment(deployment)
    }
}
