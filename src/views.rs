//! Server-side HTML pages.

use axum::http::StatusCode;

use crate::models::{to_form_value, AdminQuery, DateFilter, Todo, TodoFilter, TITLE_MAX_LEN};

const STYLE: &str = r#"
    :root {
      color-scheme: light;
      font-family: "Inter", system-ui, -apple-system, sans-serif;
      background: #f4f5f7;
    }
    body {
      margin: 0;
      padding: 32px;
      display: flex;
      justify-content: center;
    }
    .app {
      width: min(820px, 100%);
      background: #ffffff;
      border-radius: 16px;
      box-shadow: 0 24px 48px rgba(15, 23, 42, 0.08);
      padding: 28px;
    }
    h1 {
      margin: 0 0 16px 0;
      font-size: 28px;
      letter-spacing: -0.02em;
    }
    a { color: #111827; }
    .subtitle {
      color: #64748b;
      margin-bottom: 24px;
    }
    form.fields {
      display: grid;
      gap: 12px;
      margin-bottom: 24px;
    }
    input[type="text"], input[type="search"], input[type="datetime-local"], textarea, select {
      padding: 12px 14px;
      border-radius: 10px;
      border: 1px solid #e2e8f0;
      font-size: 15px;
      font-family: inherit;
    }
    textarea { min-height: 96px; }
    button, .button {
      border: none;
      border-radius: 10px;
      padding: 12px 16px;
      background: #111827;
      color: white;
      font-weight: 600;
      cursor: pointer;
      text-decoration: none;
      display: inline-block;
    }
    .todo-list {
      display: grid;
      gap: 12px;
    }
    .todo {
      display: flex;
      align-items: center;
      justify-content: space-between;
      padding: 12px 16px;
      border-radius: 12px;
      background: #f8fafc;
      border: 1px solid #e2e8f0;
    }
    .todo .meta {
      display: flex;
      flex-direction: column;
      gap: 4px;
    }
    .todo .title {
      font-weight: 600;
    }
    .todo.resolved .title {
      text-decoration: line-through;
      color: #64748b;
    }
    .todo .time {
      font-size: 12px;
      color: #94a3b8;
    }
    .status {
      font-size: 12px;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: #0f172a;
      background: #e2e8f0;
      padding: 4px 8px;
      border-radius: 999px;
    }
    .status.done {
      background: #dcfce7;
      color: #166534;
    }
    .actions {
      display: flex;
      gap: 8px;
      align-items: center;
    }
    .actions form { margin: 0; }
    .actions button, .actions .button {
      background: #e2e8f0;
      color: #0f172a;
      font-weight: 600;
      padding: 8px 12px;
    }
    .actions button.delete, button.delete {
      background: #fee2e2;
      color: #991b1b;
    }
    .error {
      background: #fee2e2;
      color: #991b1b;
      padding: 12px 16px;
      border-radius: 10px;
      margin-bottom: 16px;
    }
    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 14px;
    }
    th, td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid #e2e8f0;
    }
    .filters {
      display: flex;
      gap: 8px;
      flex-wrap: wrap;
      margin-bottom: 16px;
    }
"#;

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="app">
{content}
  </div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn format_timestamp(value: &chrono::DateTime<chrono::Utc>) -> String {
    value.format("%d.%m.%Y %H:%M").to_string()
}

pub fn list_page(todos: &[Todo]) -> String {
    let mut body = String::from(
        r#"    <h1>TODOs</h1>
    <div class="subtitle">Everything that still needs doing, newest first.</div>
    <p><a class="button" href="/create">New TODO</a></p>
    <div class="todo-list">
"#,
    );

    if todos.is_empty() {
        body.push_str("<div class=\"subtitle\">No TODOs yet. Create one to get started!</div>");
    }
    for todo in todos {
        let (item_class, status_class, status_label) = if todo.is_resolved {
            ("todo resolved", "status done", "Resolved")
        } else {
            ("todo", "status", "Open")
        };
        let due = todo
            .due_date
            .as_ref()
            .map(|due| format!(" · Due {}", format_timestamp(due)))
            .unwrap_or_default();
        let description = if todo.description.is_empty() {
            String::new()
        } else {
            format!(
                "\n    <div class=\"description\">{}</div>",
                html_escape(&todo.description)
            )
        };
        body.push_str(&format!(
            r#"<div class="{item_class}">
  <div class="meta">
    <div class="title">{title}</div>{description}
    <div class="time">Created {created}{due}</div>
  </div>
  <div class="actions">
    <span class="{status_class}">{status_label}</span>
    <form method="post" action="/toggle/{id}">
      <button type="submit">{toggle_label}</button>
    </form>
    <a class="button" href="/edit/{id}">Edit</a>
    <a class="button delete" href="/delete/{id}">Delete</a>
  </div>
</div>
"#,
            title = html_escape(&todo.title),
            created = format_timestamp(&todo.created_at),
            id = todo.id,
            toggle_label = if todo.is_resolved { "Reopen" } else { "Done" },
        ));
    }

    body.push_str("    </div>\n");
    layout("TODOs", &body)
}

fn todo_form(action: &str, todo: Option<&Todo>, submit_label: &str) -> String {
    let title = todo.map(|t| html_escape(&t.title)).unwrap_or_default();
    let description = todo.map(|t| html_escape(&t.description)).unwrap_or_default();
    let due_date = todo
        .and_then(|t| t.due_date.as_ref())
        .map(to_form_value)
        .unwrap_or_default();
    format!(
        r#"    <form class="fields" method="post" action="{action}">
      <label for="title">Title</label>
      <input type="text" id="title" name="title" maxlength="{TITLE_MAX_LEN}"
        value="{title}" required />
      <label for="description">Description</label>
      <textarea id="description" name="description">{description}</textarea>
      <label for="due_date">Due date</label>
      <input type="datetime-local" id="due_date" name="due_date" step="1" value="{due_date}" />
      <div class="actions">
        <button type="submit">{submit_label}</button>
        <a class="button" href="/">Cancel</a>
      </div>
    </form>
"#
    )
}

pub fn create_page() -> String {
    let body = format!(
        "    <h1>New TODO</h1>\n{}",
        todo_form("/create", None, "Create")
    );
    layout("New TODO", &body)
}

pub fn edit_page(todo: &Todo) -> String {
    let body = format!(
        "    <h1>Edit TODO</h1>\n{}",
        todo_form(&format!("/edit/{}", todo.id), Some(todo), "Save")
    );
    layout(&format!("Edit {todo}"), &body)
}

pub fn delete_page(todo: &Todo) -> String {
    let body = format!(
        r#"    <h1>Delete TODO</h1>
    <div class="subtitle">Are you sure you want to delete "{title}"?</div>
    <form method="post" action="/delete/{id}">
      <div class="actions">
        <button class="delete" type="submit">Delete</button>
        <a class="button" href="/">Cancel</a>
      </div>
    </form>
"#,
        title = html_escape(&todo.title),
        id = todo.id,
    );
    layout(&format!("Delete {todo}"), &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let heading = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"    <h1>{heading}</h1>
    <div class="error">{message}</div>
    <p><a href="/">Back to the list</a></p>
"#,
        message = html_escape(message),
    );
    layout(heading, &body)
}

fn select(name: &str, current: Option<&str>, options: &[(&str, &str)]) -> String {
    let mut html = format!("<select name=\"{name}\">");
    for (value, label) in options {
        let selected = if current == Some(*value) { " selected" } else { "" };
        html.push_str(&format!("<option value=\"{value}\"{selected}>{label}</option>"));
    }
    html.push_str("</select>");
    html
}

fn date_options(include_null_checks: bool) -> Vec<(&'static str, &'static str)> {
    let mut options = vec![("", "Any date")];
    options.extend(DateFilter::RANGES.iter().map(|f| (f.as_str(), f.label())));
    if include_null_checks {
        for f in [DateFilter::NoDate, DateFilter::HasDate] {
            options.push((f.as_str(), f.label()));
        }
    }
    options
}

pub fn admin_list_page(todos: &[Todo], query: &AdminQuery) -> String {
    let filter = TodoFilter::from_query(query);
    let search = html_escape(query.q.as_deref().unwrap_or_default());
    let resolved = match filter.is_resolved {
        Some(true) => Some("yes"),
        Some(false) => Some("no"),
        None => None,
    };
    let mut body = format!(
        r#"    <h1>Administration · TODOs</h1>
    <form class="filters" method="get" action="/admin/todos">
      <input type="search" name="q" value="{search}" placeholder="Search title or description" />
      {resolved}
      {due_date}
      {created_at}
      <button type="submit">Filter</button>
    </form>
"#,
        resolved = select(
            "is_resolved",
            resolved,
            &[("", "All"), ("yes", "Resolved"), ("no", "Open")]
        ),
        due_date = select(
            "due_date",
            filter.due_date.map(DateFilter::as_str),
            &date_options(true)
        ),
        created_at = select(
            "created_at",
            filter.created_at.map(DateFilter::as_str),
            &date_options(false)
        ),
    );

    let noun = if todos.len() == 1 { "TODO" } else { "TODOs" };
    body.push_str(&format!(
        "    <div class=\"subtitle\">{} {noun}{}</div>\n",
        todos.len(),
        if filter.is_empty() {
            String::new()
        } else {
            " matching · <a href=\"/admin/todos\">Clear filters</a>".to_string()
        }
    ));

    body.push_str(
        r#"    <table>
      <tr>
        <th>Title</th><th>Due date</th><th>Resolved</th><th>Created</th><th>Updated</th>
      </tr>
"#,
    );
    for todo in todos {
        let due = todo
            .due_date
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        body.push_str(&format!(
            r#"      <tr>
        <td><a href="/admin/todos/{id}">{title}</a></td>
        <td>{due}</td><td>{resolved}</td><td>{created}</td><td>{updated}</td>
      </tr>
"#,
            id = todo.id,
            title = html_escape(&todo.title),
            resolved = if todo.is_resolved { "yes" } else { "no" },
            created = format_timestamp(&todo.created_at),
            updated = format_timestamp(&todo.updated_at),
        ));
    }
    body.push_str("    </table>\n");
    layout("Administration · TODOs", &body)
}

/// Why a change form submission was turned away, with the due date text as
/// submitted so it can be shown again even when it did not parse.
#[derive(Debug, Clone, Copy)]
pub struct Rejection<'a> {
    pub problem: &'a str,
    pub due_date: &'a str,
}

/// Change form for one record. After a rejected submission `todo` carries
/// the submitted title, description and resolved flag.
pub fn admin_change_page(todo: &Todo, rejection: Option<Rejection<'_>>) -> String {
    let error = rejection
        .map(|r| format!("    <div class=\"error\">{}</div>\n", html_escape(r.problem)))
        .unwrap_or_default();
    let due_date = match rejection {
        Some(r) => html_escape(r.due_date),
        None => todo.due_date.as_ref().map(to_form_value).unwrap_or_default(),
    };
    let body = format!(
        r#"    <h1>Change TODO</h1>
{error}    <form class="fields" method="post" action="/admin/todos/{id}">
      <h3>TODO Information</h3>
      <label for="title">Title</label>
      <input type="text" id="title" name="title" maxlength="{TITLE_MAX_LEN}" value="{title}" />
      <label for="description">Description</label>
      <textarea id="description" name="description">{description}</textarea>
      <h3>Status &amp; Dates</h3>
      <label><input type="checkbox" name="is_resolved" value="on"{checked} /> Resolved</label>
      <label for="due_date">Due date</label>
      <input type="datetime-local" id="due_date" name="due_date" step="1" value="{due_date}" />
      <details>
        <summary>Timestamps</summary>
        <p>Created: {created}</p>
        <p>Updated: {updated}</p>
      </details>
      <div class="actions">
        <button type="submit">Save</button>
        <a class="button" href="/admin/todos">Back</a>
      </div>
    </form>
"#,
        id = todo.id,
        title = html_escape(&todo.title),
        description = html_escape(&todo.description),
        checked = if todo.is_resolved { " checked" } else { "" },
        created = format_timestamp(&todo.created_at),
        updated = format_timestamp(&todo.updated_at),
    );
    layout("Change TODO", &body)
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
