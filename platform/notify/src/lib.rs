//! Webhook notifier. Posts the full employee record as JSON to a single
//! endpoint; any 2xx counts as delivered.

use async_trait::async_trait;
use entity::Employee;
use platform_api::{EndpointError, RemoteResult, parse_endpoint, send_checked};
use reqwest::Client;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

const WEBHOOK_KEY: &str = "NOTIFY_WEBHOOK_URL";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, employee: &Employee) -> RemoteResult<()>;
}

#[derive(Debug, Error)]
pub enum NotifyConfigError {
    #[error("webhook url missing (set {0})")]
    MissingUrl(&'static str),
    #[error("invalid webhook url")]
    InvalidUrl(#[from] EndpointError),
}

#[derive(Clone, Debug)]
pub struct NotifySettings {
    pub webhook_url: Url,
}

impl NotifySettings {
    pub fn new(webhook_url: impl AsRef<str>) -> Result<Self, NotifyConfigError> {
        Ok(Self {
            webhook_url: parse_endpoint(webhook_url.as_ref())?,
        })
    }

    pub fn from_env() -> Result<Self, NotifyConfigError> {
        let raw =
            std::env::var(WEBHOOK_KEY).map_err(|_| NotifyConfigError::MissingUrl(WEBHOOK_KEY))?;
        Self::new(raw)
    }
}

#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(settings: &NotifySettings) -> RemoteResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &NotifySettings) -> Self {
        Self {
            client,
            url: settings.webhook_url.clone(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, employee), fields(url = %self.url, employee = %employee.id))]
    async fn send(&self, employee: &Employee) -> RemoteResult<()> {
        match send_checked(self.client.post(self.url.clone()).json(employee)).await {
            Ok(_) => {
                info!("notification delivered");
                Ok(())
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "notification failed");
                Err(err)
            }
        }
    }
}

/// Notifier that drops every message. Used when no webhook is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, employee: &Employee) -> RemoteResult<()> {
        info!(employee = %employee.id, "webhook not configured; notification skipped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::EmployeeFields;
    use serde_json::json;

    #[test]
    fn rejects_urls_without_an_http_host() {
        for raw in ["ftp://hooks.example.com", "https://", "http://exa mple.com/hook"] {
            assert!(
                matches!(NotifySettings::new(raw), Err(NotifyConfigError::InvalidUrl(_))),
                "{raw} accepted"
            );
        }
        let ok = NotifySettings::new(" https://hooks.example.com/send ").unwrap();
        assert_eq!(ok.webhook_url.as_str(), "https://hooks.example.com/send");
    }

    #[test]
    fn payload_is_the_full_record() {
        let employee = Employee::new(9_i64, EmployeeFields::new("Ann", "Eng", "a@x.com", "555"));
        assert_eq!(
            serde_json::to_value(&employee).unwrap(),
            json!({ "id": 9, "name": "Ann", "role": "Eng", "email": "a@x.com", "phone": "555" })
        );
    }
}
