use std::fmt::Write as _;

use entity::{Employee, EmployeeField, EmployeeFields};

use crate::Directory;

/// What the dashboard screen shows: the total and one row per employee.
#[derive(Debug)]
pub struct DashboardView<'a> {
    pub total: usize,
    pub rows: Vec<DashboardRow<'a>>,
}

#[derive(Debug)]
pub struct DashboardRow<'a> {
    /// 1-based position in store order.
    pub position: usize,
    pub employee: &'a Employee,
    /// Scratch values when this row is being edited.
    pub editing: Option<&'a EmployeeFields>,
}

impl DashboardRow<'_> {
    /// Value to display: the scratch value while editing, else the stored one.
    pub fn value(&self, field: EmployeeField) -> &str {
        match self.editing {
            Some(fields) => fields.get(field),
            None => self.employee.get(field),
        }
    }
}

impl<'a> DashboardView<'a> {
    pub fn new(directory: &'a Directory) -> Self {
        let edit = directory.edit();
        let rows = directory
            .employees()
            .iter()
            .enumerate()
            .map(|(index, employee)| DashboardRow {
                position: index + 1,
                employee,
                editing: edit
                    .filter(|session| session.id == employee.id)
                    .map(|session| &session.fields),
            })
            .collect::<Vec<_>>();
        Self {
            total: rows.len(),
            rows,
        }
    }

    /// The table is hidden when there is nothing to list.
    pub fn show_table(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("Total Employees: {}\n", self.total);
        if !self.show_table() {
            return out;
        }

        let mut header = vec!["#".to_string(), "ID".to_string()];
        header.extend(EmployeeField::ALL.iter().map(|field| field.label().to_string()));
        let body = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.position.to_string(), row.employee.id.to_string()];
                cells.extend(EmployeeField::ALL.iter().map(|field| row.value(*field).to_string()));
                if row.editing.is_some() {
                    cells[0].push('*');
                }
                cells
            })
            .collect::<Vec<_>>();

        let widths = (0..header.len())
            .map(|col| {
                std::iter::once(&header)
                    .chain(body.iter())
                    .map(|cells| cells[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect::<Vec<_>>();

        out.push('\n');
        for cells in std::iter::once(&header).chain(body.iter()) {
            let line = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ");
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out
    }
}

impl<'a> From<&'a Directory> for DashboardView<'a> {
    fn from(directory: &'a Directory) -> Self {
        Self::new(directory)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{RecordingNotifier, ScriptedStore, ann, seeded};

    #[tokio::test]
    async fn empty_directory_hides_the_table() {
        let (mut dir, _rx) = Directory::new(
            Arc::new(ScriptedStore::default()),
            Arc::new(RecordingNotifier::default()),
        );
        dir.refresh().await.unwrap();
        let view = DashboardView::from(&dir);
        assert_eq!(view.total, 0);
        assert!(!view.show_table());
        assert_eq!(view.render_text(), "Total Employees: 0\n");
    }

    #[tokio::test]
    async fn adding_ann_shows_one_row_and_notifies_with_that_record() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut dir, _rx) = Directory::new(Arc::new(ScriptedStore::default()), notifier.clone());
        dir.refresh().await.unwrap();

        let outcome = dir.create(ann()).await.unwrap();
        let created = outcome.employee().cloned().unwrap();
        outcome.into_notification().unwrap().join().await;

        let view = DashboardView::new(&dir);
        assert_eq!(view.total, 1);
        assert!(view.show_table());
        let row = &view.rows[0];
        assert_eq!(row.position, 1);
        assert_eq!(row.employee, &created);
        assert_eq!(row.value(EmployeeField::Name), "Ann");
        assert_eq!(row.value(EmployeeField::Role), "Eng");
        assert_eq!(row.value(EmployeeField::Email), "a@x.com");
        assert_eq!(row.value(EmployeeField::Phone), "555");
        assert_eq!(notifier.sent(), vec![created]);
    }

    #[tokio::test]
    async fn editing_row_shows_scratch_values() {
        let (mut dir, _rx) = Directory::new(Arc::new(seeded()), Arc::new(RecordingNotifier::default()));
        dir.refresh().await.unwrap();
        let first = dir.employees()[0].id.clone();
        dir.begin_edit(&first).unwrap();
        dir.update_edit_field(EmployeeField::Role, "Lead").unwrap();

        let view = DashboardView::new(&dir);
        assert_eq!(view.rows[0].value(EmployeeField::Role), "Lead");
        assert_eq!(view.rows[0].employee.role, "Eng");
        assert!(view.rows[1].editing.is_none());

        let text = view.render_text();
        assert!(text.starts_with("Total Employees: 2\n\n#"));
        assert!(text.contains("1*  1   Ann   Lead"), "{text}");
        assert!(text.contains("2   2   Bo    Ops"), "{text}");
    }
}
