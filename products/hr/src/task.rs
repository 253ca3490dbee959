use std::sync::Arc;

use anyhow::anyhow;
use entity::{Employee, EmployeeId};
use platform_api::RemoteError;
use platform_notify::Notifier;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::notice::{Notice, NoticeSender, messages, publish};

/// How a notification dispatch ended.
#[derive(Clone, Debug)]
pub enum Delivery {
    Sent,
    /// The endpoint answered with a non-2xx status.
    Rejected(RemoteError),
    /// The request never got an answer.
    Failed(RemoteError),
    Cancelled,
}

impl Delivery {
    fn from_result(result: Result<(), RemoteError>) -> Self {
        match result {
            Ok(()) => Delivery::Sent,
            Err(err) if err.is_rejection() => Delivery::Rejected(err),
            Err(err) => Delivery::Failed(err),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }

    fn notice(&self, employee: &EmployeeId) -> Option<Notice> {
        let employee = Some(employee.clone());
        match self {
            Delivery::Sent => Some(Notice::success(messages::EMAIL_SENT, employee)),
            Delivery::Rejected(_) => Some(Notice::failure(messages::EMAIL_REJECTED, employee)),
            Delivery::Failed(_) => Some(Notice::failure(messages::EMAIL_ERROR, employee)),
            Delivery::Cancelled => None,
        }
    }
}

/// Background notification dispatch.
///
/// Dropping the handle detaches the task; it still runs and still publishes
/// its notice. [`abort`](Self::abort) stops it without a notice.
#[derive(Debug)]
pub struct NotificationTask {
    employee: EmployeeId,
    handle: JoinHandle<Delivery>,
}

impl NotificationTask {
    pub(crate) fn spawn(
        notifier: Arc<dyn Notifier>,
        notices: NoticeSender,
        employee: Employee,
    ) -> Self {
        let id = employee.id.clone();
        let handle = tokio::spawn(async move {
            let delivery = Delivery::from_result(notifier.send(&employee).await);
            match &delivery {
                Delivery::Sent => info!(employee = %employee.id, "employee email sent"),
                Delivery::Rejected(err) | Delivery::Failed(err) => {
                    error!(employee = %employee.id, error = %err, "failed to send employee email")
                }
                Delivery::Cancelled => {}
            }
            if let Some(notice) = delivery.notice(&employee.id) {
                publish(&notices, notice);
            }
            delivery
        });
        Self {
            employee: id,
            handle,
        }
    }

    pub fn employee(&self) -> &EmployeeId {
        &self.employee
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Waits for the dispatch to end.
    pub async fn join(self) -> Delivery {
        match self.handle.await {
            Ok(delivery) => delivery,
            Err(err) if err.is_cancelled() => Delivery::Cancelled,
            Err(err) => Delivery::Failed(RemoteError::internal(anyhow!(
                "notification task panicked: {err}"
            ))),
        }
    }
}
