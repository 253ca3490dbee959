//! Store and notifier doubles for directory tests.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use entity::{Employee, EmployeeFields, EmployeeId};
use platform_api::{RemoteError, RemoteResult};
use platform_db::{MemoryStore, RecordStore};
use platform_notify::Notifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Fail without touching the rows.
    Before,
    /// Apply the change, then report failure (a lost response).
    AfterApply,
}

pub fn ann() -> EmployeeFields {
    EmployeeFields::new("Ann", "Eng", "a@x.com", "555")
}

/// Two rows with integer keys 1 and 2.
pub fn seeded() -> ScriptedStore {
    ScriptedStore::with_rows(vec![
        Employee::new(1_i64, ann()),
        Employee::new(2_i64, EmployeeFields::new("Bo", "Ops", "b@x.com", "556")),
    ])
}

/// [`MemoryStore`] that records calls and fails on request.
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Op>>,
    updated: Mutex<Vec<EmployeeId>>,
    faults: Mutex<HashMap<Op, Fault>>,
}

impl ScriptedStore {
    pub fn with_rows(rows: Vec<Employee>) -> Self {
        Self {
            inner: MemoryStore::with_rows(rows),
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail(&self, op: Op, fault: Fault) {
        lock(&self.faults).insert(op, fault);
    }

    pub fn calls(&self) -> Vec<Op> {
        lock(&self.calls).clone()
    }

    pub fn updated_ids(&self) -> Vec<EmployeeId> {
        lock(&self.updated).clone()
    }

    fn enter(&self, op: Op) -> Option<Fault> {
        lock(&self.calls).push(op);
        lock(&self.faults).get(&op).copied()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

fn injected() -> RemoteError {
    RemoteError::Status {
        status: 503,
        body: "injected".into(),
    }
}

async fn run<T>(
    fault: Option<Fault>,
    call: impl std::future::Future<Output = RemoteResult<T>>,
) -> RemoteResult<T> {
    match fault {
        None => call.await,
        Some(Fault::Before) => Err(injected()),
        Some(Fault::AfterApply) => {
            call.await?;
            Err(injected())
        }
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn list(&self) -> RemoteResult<Vec<Employee>> {
        let fault = self.enter(Op::List);
        run(fault, self.inner.list()).await
    }

    async fn insert(&self, fields: &EmployeeFields) -> RemoteResult<Employee> {
        let fault = self.enter(Op::Insert);
        run(fault, self.inner.insert(fields)).await
    }

    async fn update(&self, id: &EmployeeId, fields: &EmployeeFields) -> RemoteResult<()> {
        let fault = self.enter(Op::Update);
        lock(&self.updated).push(id.clone());
        run(fault, self.inner.update(id, fields)).await
    }

    async fn delete(&self, id: &EmployeeId) -> RemoteResult<()> {
        let fault = self.enter(Op::Delete);
        run(fault, self.inner.delete(id)).await
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Accept,
    Reject,
    Stall,
}

#[derive(Default)]
pub struct RecordingNotifier {
    mode: Mode,
    sent: Mutex<Vec<Employee>>,
}

impl RecordingNotifier {
    pub fn rejecting() -> Self {
        Self {
            mode: Mode::Reject,
            ..Self::default()
        }
    }

    /// Never completes a send.
    pub fn stalled() -> Self {
        Self {
            mode: Mode::Stall,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Employee> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, employee: &Employee) -> RemoteResult<()> {
        match self.mode {
            Mode::Accept => {
                lock(&self.sent).push(employee.clone());
                Ok(())
            }
            Mode::Reject => Err(RemoteError::Status {
                status: 500,
                body: "workflow error".into(),
            }),
            Mode::Stall => std::future::pending().await,
        }
    }
}
