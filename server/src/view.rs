//! HTML for the two dashboard screens.

use std::fmt::Write as _;

use entity::{EmployeeField, EmployeeFields};
use products_hr::{DashboardRow, DashboardView, Notice};

const ACCENT: &str = "#5bc0de";

pub fn dashboard(view: &DashboardView<'_>, notices: &[Notice]) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<h2 style="color: {ACCENT}">Employee Management Dashboard</h2>
<p class="muted">Manage your team easily and effectively</p>
{notices}
<div class="count"><h3>{total}</h3><p>Total Employees</p></div>
<p><a class="button" href="/employees/new">+ Add New Employee</a></p>
"#,
        notices = notice_list(notices),
        total = view.total,
    );

    if view.show_table() {
        body.push_str(
            "<h4>Employee List</h4>\n<table>\n<thead><tr><th>#</th><th>Name</th><th>Role</th><th>Email</th><th>Phone</th><th>Actions</th></tr></thead>\n<tbody>\n",
        );
        for row in &view.rows {
            body.push_str(&table_row(row));
        }
        body.push_str("</tbody>\n</table>\n");
    }

    layout("Employee Management Dashboard", &body)
}

pub fn add_form(draft: &EmployeeFields) -> String {
    let mut inputs = String::new();
    for (field, kind, placeholder) in [
        (EmployeeField::Name, "text", "Full Name"),
        (EmployeeField::Email, "email", "Email ID"),
        (EmployeeField::Phone, "text", "Phone Number"),
        (EmployeeField::Role, "text", "Role"),
    ] {
        let _ = writeln!(
            inputs,
            r#"<input type="{kind}" name="{name}" placeholder="{placeholder}" value="{value}">"#,
            name = field.as_str(),
            value = escape(draft.get(field)),
        );
    }
    let body = format!(
        r#"<h2 style="color: {ACCENT}">Add New Employee</h2>
<form method="post" action="/employees">
{inputs}<button type="submit">Add Employee &amp; Send Email</button>
<a class="button secondary" href="/">Back</a>
</form>
"#
    );
    layout("Add New Employee", &body)
}

fn table_row(row: &DashboardRow<'_>) -> String {
    let id = encode_segment(&row.employee.id.to_string());
    let form_id = format!("save-{}", row.position);
    let mut cells = String::new();
    for field in EmployeeField::ALL {
        let value = escape(row.value(field));
        if row.editing.is_some() {
            let _ = write!(
                cells,
                r#"<td><input name="{name}" value="{value}" form="{form_id}"></td>"#,
                name = field.as_str(),
            );
        } else {
            let _ = write!(cells, "<td>{value}</td>");
        }
    }

    let primary = if row.editing.is_some() {
        format!(
            r#"<form id="{form_id}" method="post" action="/employees/{id}/save"><button class="success">Save</button></form><form method="post" action="/employees/{id}/cancel"><button class="secondary">Cancel</button></form>"#
        )
    } else {
        format!(
            r#"<form method="post" action="/employees/{id}/edit"><button class="warning">Edit</button></form>"#
        )
    };

    format!(
        r#"<tr><td>{position}</td>{cells}<td>{primary}<form method="post" action="/employees/{id}/delete"><button class="danger">Delete</button></form><form method="post" action="/employees/{id}/notify"><button class="info">Send Email</button></form></td></tr>
"#,
        position = row.position,
    )
}

fn notice_list(notices: &[Notice]) -> String {
    if notices.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"notices\">");
    for notice in notices {
        let _ = write!(
            out,
            r#"<li class="{level}"><time datetime="{at}">{clock}</time> {message}</li>"#,
            level = notice.level.as_str(),
            at = notice.at.to_rfc3339(),
            clock = notice.at.format("%H:%M:%S"),
            message = escape(&notice.message),
        );
    }
    out.push_str("</ul>");
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; text-align: center; margin: 3rem auto; max-width: 60rem; }}
.muted {{ color: #6c757d; }}
.count {{ display: inline-block; padding: 1.5rem; color: #fff; background: {ACCENT}; border-radius: .4rem; }}
table {{ width: 100%; border-collapse: collapse; margin-top: 1rem; }}
th, td {{ border: 1px solid #dee2e6; padding: .4rem; }}
td form {{ display: inline; }}
.notices li.success {{ color: #198754; }}
.notices li.failure {{ color: #dc3545; }}
</style>
</head>
<body>
{body}</body>
</html>
"#
    )
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
