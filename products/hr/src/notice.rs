use chrono::{DateTime, Utc};
use entity::EmployeeId;
use tokio::sync::mpsc;
use tracing::debug;

pub type NoticeSender = mpsc::UnboundedSender<Notice>;
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// User-facing message texts.
pub mod messages {
    pub const EMPLOYEE_ADDED: &str = "Employee added successfully! Email will be sent automatically.";
    pub const EMPLOYEE_UPDATED: &str = "Employee details updated!";
    pub const EMAIL_SENT: &str = "Email sent successfully!";
    pub const EMAIL_REJECTED: &str = "Failed to send email.";
    pub const EMAIL_ERROR: &str = "Error sending email.";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Failure => "failure",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub employee: Option<EmployeeId>,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn success(message: impl Into<String>, employee: Option<EmployeeId>) -> Self {
        Self::new(NoticeLevel::Success, message, employee)
    }

    pub fn failure(message: impl Into<String>, employee: Option<EmployeeId>) -> Self {
        Self::new(NoticeLevel::Failure, message, employee)
    }

    fn new(level: NoticeLevel, message: impl Into<String>, employee: Option<EmployeeId>) -> Self {
        Self {
            level,
            message: message.into(),
            employee,
            at: Utc::now(),
        }
    }
}

pub(crate) fn publish(sender: &NoticeSender, notice: Notice) {
    if sender.send(notice).is_err() {
        debug!("notice receiver dropped; notice discarded");
    }
}
