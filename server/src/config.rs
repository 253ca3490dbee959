use std::sync::Arc;

use anyhow::{Context, Result};
use platform_db::{MemoryStore, RecordStore, RestStore, StoreSettings};
use platform_notify::{DisabledNotifier, Notifier, NotifySettings, NotifyConfigError, WebhookNotifier};
use products_hr::{Directory, NoticeReceiver};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// `None` runs against a process-local store.
    pub store: Option<StoreSettings>,
    /// `None` disables the webhook.
    pub notify: Option<NotifySettings>,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load(in_memory: bool) -> Result<Self> {
        let store = if in_memory {
            None
        } else {
            Some(StoreSettings::from_env().context("record store is not configured")?)
        };

        let notify = match NotifySettings::from_env() {
            Ok(settings) => Some(settings),
            Err(NotifyConfigError::MissingUrl(key)) => {
                warn!("{key} not set; new employees will not trigger an email");
                None
            }
            Err(err) => return Err(err).context("invalid webhook configuration"),
        };

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            store,
            notify,
            cors_allowed_origins,
        })
    }

    pub fn build_directory(&self) -> Result<(Directory, NoticeReceiver)> {
        let store: Arc<dyn RecordStore> = match &self.store {
            Some(settings) => {
                info!(table = %settings.table, "using hosted record store");
                Arc::new(RestStore::new(settings).context("failed to build store client")?)
            }
            None => {
                info!("using in-memory record store");
                Arc::new(MemoryStore::new())
            }
        };
        let notifier: Arc<dyn Notifier> = match &self.notify {
            Some(settings) => Arc::new(
                WebhookNotifier::new(settings).context("failed to build webhook client")?,
            ),
            None => Arc::new(DisabledNotifier),
        };
        Ok(Directory::new(store, notifier))
    }
}
