//! Employee directory.
//!
//! [`Directory`] keeps a local copy of the employees table and routes every
//! mutation through the remote store, re-reading the whole table afterwards.
//! Outcomes the user should see are published as [`Notice`]s.

mod dashboard;
mod directory;
mod error;
mod notice;
mod task;

pub use dashboard::{DashboardRow, DashboardView};
pub use directory::{CreateOutcome, Directory, EditSession};
pub use error::{SyncError, SyncResult};
pub use notice::{Notice, NoticeLevel, NoticeReceiver, NoticeSender, messages};
pub use task::{Delivery, NotificationTask};

#[cfg(test)]
mod test_support;
