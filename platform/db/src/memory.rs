use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use entity::{Employee, EmployeeFields, EmployeeId};
use platform_api::RemoteResult;
use uuid::Uuid;

use crate::RecordStore;

/// Process-local store with uuid keys. Mirrors PostgREST semantics: update
/// and delete of a missing id succeed without effect.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Employee>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Employee>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn snapshot(&self) -> Vec<Employee> {
        self.rows().clone()
    }

    fn rows(&self) -> MutexGuard<'_, Vec<Employee>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> RemoteResult<Vec<Employee>> {
        Ok(self.snapshot())
    }

    async fn insert(&self, fields: &EmployeeFields) -> RemoteResult<Employee> {
        let row = Employee::new(Uuid::new_v4().to_string(), fields.clone());
        self.rows().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &EmployeeId, fields: &EmployeeFields) -> RemoteResult<()> {
        if let Some(row) = self.rows().iter_mut().find(|row| &row.id == id) {
            *row = Employee::new(id.clone(), fields.clone());
        }
        Ok(())
    }

    async fn delete(&self, id: &EmployeeId) -> RemoteResult<()> {
        self.rows().retain(|row| &row.id != id);
        Ok(())
    }
}
