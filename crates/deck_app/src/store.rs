use std::sync::Arc;

use anyhow::Result;
use deck_admin::AdminApi;
use deck_core::{AppConf, DeckError};
use tokio::sync::watch;
use tracing::{debug, info};

/// In-memory copy of one app's configuration, backed by the admin API.
///
/// Every successful refresh, save or load is published to subscribers.
pub struct AppStore<A: AdminApi + ?Sized = dyn AdminApi> {
    api: Arc<A>,
    app_id: Option<String>,
    current: Option<AppConf>,
    tx: watch::Sender<Option<AppConf>>,
}

impl<A: AdminApi + ?Sized> AppStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            api,
            app_id: None,
            current: None,
            tx,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Point the store at `app_id`, dropping any loaded copy.
    pub fn select(&mut self, app_id: impl Into<String>) {
        self.app_id = Some(app_id.into());
        self.current = None;
        self.tx.send_replace(None);
    }

    /// Adopt `conf` as the current copy without a round trip.
    pub fn load(&mut self, conf: AppConf) {
        self.app_id = Some(conf.app_id.clone());
        self.current = Some(conf);
        self.publish();
    }

    fn selected(&self) -> Result<&str, DeckError> {
        self.app_id
            .as_deref()
            .ok_or_else(|| DeckError::Config("no app selected".into()))
    }

    /// Refetch the full list and keep the selected app.
    pub async fn refresh(&mut self) -> Result<&AppConf> {
        let app_id = self.selected()?.to_string();
        let conf = self
            .api
            .list_app_confs()
            .await?
            .into_iter()
            .find(|c| c.app_id == app_id)
            .ok_or_else(|| DeckError::NotFound(format!("App '{app_id}'")))?;
        debug!(app_id = %app_id, deployments = conf.deployments.len(), "app refreshed");
        self.current = Some(conf);
        self.publish();
        self.current()
    }

    /// Fetch the selected app by id.
    pub async fn fetch(&mut self) -> Result<&AppConf> {
        let app_id = self.selected()?.to_string();
        let conf = self.api.get_app_conf(&app_id).await?;
        self.current = Some(conf);
        self.publish();
        self.current()
    }

    pub fn current(&self) -> Result<&AppConf> {
        self.current.as_ref().ok_or_else(|| not_loaded(self.app_id.as_deref()))
    }

    pub fn current_mut(&mut self) -> Result<&mut AppConf> {
        let app_id = self.app_id.clone();
        self.current
            .as_mut()
            .ok_or_else(|| not_loaded(app_id.as_deref()))
    }

    /// Replace the backend record with the in-memory copy.
    pub async fn save(&mut self) -> Result<()> {
        let conf = self.current()?;
        self.api.save_app_conf(conf).await?;
        info!(app_id = %conf.app_id, "app saved");
        self.publish();
        Ok(())
    }

    /// Apply `edit` to a copy of the app and save the copy. The local copy
    /// only changes once the backend has accepted the edited record.
    pub async fn commit<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut AppConf) -> Result<()>,
    {
        let mut next = self.current()?.clone();
        edit(&mut next)?;
        self.api.save_app_conf(&next).await?;
        info!(app_id = %next.app_id, "app saved");
        self.current = Some(next);
        self.publish();
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AppConf>> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        self.tx.send_replace(self.current.clone());
    }
}

fn not_loaded(app_id: Option<&str>) -> anyhow::Error {
    match app_id {
        Some(id) => DeckError::NotFound(format!("App '{id}'")).into(),
        None => DeckError::Config("no app selected".into()).into(),
    }
}
