use std::{collections::HashSet, sync::Arc};

use entity::{Employee, EmployeeField, EmployeeFields, EmployeeId};
use platform_db::RecordStore;
use platform_notify::Notifier;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::{SyncError, SyncResult},
    notice::{Notice, NoticeReceiver, NoticeSender, messages, publish},
    task::NotificationTask,
};

/// The record being edited and its unsaved field values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub id: EmployeeId,
    pub fields: EmployeeFields,
}

#[derive(Debug)]
pub enum CreateOutcome {
    /// A required field was empty; nothing was sent.
    Skipped,
    Created {
        employee: Employee,
        notification: NotificationTask,
    },
}

impl CreateOutcome {
    pub fn employee(&self) -> Option<&Employee> {
        match self {
            CreateOutcome::Skipped => None,
            CreateOutcome::Created { employee, .. } => Some(employee),
        }
    }

    pub fn into_notification(self) -> Option<NotificationTask> {
        match self {
            CreateOutcome::Skipped => None,
            CreateOutcome::Created { notification, .. } => Some(notification),
        }
    }
}

/// Local view of the employees table.
///
/// The list is only ever replaced by a full read of the store. Every
/// mutation goes to the store first and is followed by that read, so local
/// contents never hold unsynced changes. Concurrent writers are
/// last-write-wins at the store.
pub struct Directory {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    notices: NoticeSender,
    employees: Vec<Employee>,
    draft: EmployeeFields,
    edit: Option<EditSession>,
}

impl Directory {
    /// Builds an empty directory. Call [`refresh`](Self::refresh) to load it.
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>) -> (Self, NoticeReceiver) {
        let (notices, receiver) = mpsc::unbounded_channel();
        let directory = Self {
            store,
            notifier,
            notices,
            employees: Vec::new(),
            draft: EmployeeFields::default(),
            edit: None,
        };
        (directory, receiver)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn get(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|employee| &employee.id == id)
    }

    /// Scratch values of the add-employee form.
    pub fn draft(&self) -> &EmployeeFields {
        &self.draft
    }

    pub fn edit(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Replaces the local list with the store's current contents. On failure
    /// the previous list is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> SyncResult<usize> {
        match self.store.list().await {
            Ok(rows) => {
                self.employees = unique_by_id(rows);
                debug!(count = self.employees.len(), "directory refreshed");
                Ok(self.employees.len())
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "failed to fetch employees");
                Err(err.into())
            }
        }
    }

    pub fn set_draft_field(&mut self, field: EmployeeField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub async fn submit_draft(&mut self) -> SyncResult<CreateOutcome> {
        let fields = self.draft.clone();
        self.create(fields).await
    }

    /// Inserts a new employee when all four fields are filled, then
    /// refreshes, clears the draft and dispatches the notification.
    #[instrument(skip(self, fields))]
    pub async fn create(&mut self, fields: EmployeeFields) -> SyncResult<CreateOutcome> {
        if !fields.is_complete() {
            debug!("create skipped; a required field is empty");
            return Ok(CreateOutcome::Skipped);
        }

        let employee = match self.store.insert(&fields).await {
            Ok(employee) => employee,
            Err(err) => {
                error!(code = err.code(), error = %err, "error adding employee");
                return Err(err.into());
            }
        };
        info!(employee = %employee.id, "employee added");

        // Failure is logged by refresh; the row exists either way.
        let _ = self.refresh().await;
        self.draft = EmployeeFields::default();
        publish(
            &self.notices,
            Notice::success(messages::EMPLOYEE_ADDED, Some(employee.id.clone())),
        );
        let notification = self.notify(employee.clone());
        Ok(CreateOutcome::Created {
            employee,
            notification,
        })
    }

    /// Deletes by id without checking the row exists, then refreshes. The
    /// refresh happens even when the delete fails.
    #[instrument(skip(self, id), fields(employee = %id))]
    pub async fn remove(&mut self, id: &EmployeeId) -> SyncResult<()> {
        let deleted = self.store.delete(id).await;
        if let Err(err) = &deleted {
            warn!(code = err.code(), error = %err, "failed to delete employee");
        }
        let refreshed = self.refresh().await;
        deleted?;
        refreshed.map(|_| ())
    }

    /// Starts editing `id` with a copy of its current values. Any other
    /// unsaved edit is dropped.
    pub fn begin_edit(&mut self, id: &EmployeeId) -> SyncResult<()> {
        let employee = self
            .get(id)
            .ok_or_else(|| SyncError::UnknownEmployee(id.clone()))?;
        let session = EditSession {
            id: employee.id.clone(),
            fields: employee.fields(),
        };
        if let Some(previous) = self.edit.replace(session) {
            if &previous.id != id {
                debug!(employee = %previous.id, "discarding unsaved edit");
            }
        }
        Ok(())
    }

    /// Changes the scratch copy only.
    pub fn update_edit_field(
        &mut self,
        field: EmployeeField,
        value: impl Into<String>,
    ) -> SyncResult<()> {
        let session = self.edit.as_mut().ok_or(SyncError::NoActiveEdit)?;
        session.fields.set(field, value);
        Ok(())
    }

    /// Replaces the whole scratch copy of the edit on `id`. Nothing changes
    /// when no edit is active or the active edit is on another record.
    pub fn set_edit_fields(&mut self, id: &EmployeeId, fields: EmployeeFields) -> SyncResult<()> {
        let session = self.edit.as_mut().ok_or(SyncError::NoActiveEdit)?;
        if &session.id != id {
            return Err(SyncError::EditTargetMismatch {
                active: session.id.clone(),
                requested: id.clone(),
            });
        }
        session.fields = fields;
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Option<EditSession> {
        self.edit.take()
    }

    /// Pushes the scratch fields for `id` without validating them, ends the
    /// edit and refreshes. The "updated" notice is published whatever the
    /// store answered; the returned result carries the real outcome.
    #[instrument(skip(self, id), fields(employee = %id))]
    pub async fn save_edit(&mut self, id: &EmployeeId) -> SyncResult<()> {
        let Some(session) = self.edit.take() else {
            return Err(SyncError::NoActiveEdit);
        };
        if &session.id != id {
            let active = session.id.clone();
            self.edit = Some(session);
            return Err(SyncError::EditTargetMismatch {
                active,
                requested: id.clone(),
            });
        }

        let updated = self.store.update(id, &session.fields).await;
        if let Err(err) = &updated {
            warn!(code = err.code(), error = %err, "failed to update employee");
        }
        let refreshed = self.refresh().await;
        publish(
            &self.notices,
            Notice::success(messages::EMPLOYEE_UPDATED, Some(id.clone())),
        );
        updated?;
        refreshed.map(|_| ())
    }

    /// Sends `employee` to the webhook in the background.
    pub fn notify(&self, employee: Employee) -> NotificationTask {
        NotificationTask::spawn(self.notifier.clone(), self.notices.clone(), employee)
    }
}

fn unique_by_id(rows: Vec<Employee>) -> Vec<Employee> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut unique = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(row.id.clone()) {
            unique.push(row);
        } else {
            warn!(employee = %row.id, "store returned a duplicate id; keeping the first row");
        }
    }
    unique
}
