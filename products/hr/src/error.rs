use entity::EmployeeId;
use platform_api::RemoteError;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error, Clone)]
pub enum SyncError {
    #[error("record store call failed: {0}")]
    Store(#[from] RemoteError),
    #[error("employee {0} is not in the directory")]
    UnknownEmployee(EmployeeId),
    #[error("no edit in progress")]
    NoActiveEdit,
    #[error("edit in progress targets employee {active}, not {requested}")]
    EditTargetMismatch {
        active: EmployeeId,
        requested: EmployeeId,
    },
}

impl SyncError {
    /// The store was reached (or tried) and failed, as opposed to a local
    /// precondition.
    pub fn is_remote(&self) -> bool {
        matches!(self, SyncError::Store(_))
    }
}
