//! Back-office view over all TODOs: search, filters and a change form that
//! can set every editable field, including the resolved flag.

use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::redirect_to;
use crate::models::{parse_due_date, AdminQuery, TodoFilter, TITLE_MAX_LEN};
use crate::views::{self, Rejection};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChangeForm {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Browsers omit unchecked checkboxes.
    pub is_resolved: Option<String>,
    pub due_date: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, AppError> {
    let filter = TodoFilter::from_query(&query);
    let todos = state.db()?.search_todos(&filter, Utc::now())?;
    Ok(Html(views::admin_list_page(&todos, &query)))
}

#[tracing::instrument(skip(state))]
pub async fn change_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let todo = state.db()?.get_todo(id)?.ok_or(AppError::NotFound(id))?;
    Ok(Html(views::admin_change_page(&todo, None)))
}

/// Saves the change form, or shows it again with the submitted values and
/// the first problem found.
#[tracing::instrument(skip(state))]
pub async fn change_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ChangeForm>,
) -> Result<Response, AppError> {
    let db = state.db()?;
    let mut todo = db.get_todo(id)?.ok_or(AppError::NotFound(id))?;

    todo.title = form.title.unwrap_or_default();
    todo.description = form.description.unwrap_or_default();
    todo.is_resolved = form.is_resolved.is_some();
    let submitted_due_date = form.due_date.unwrap_or_default();
    let due_date = parse_due_date(&submitted_due_date);

    let problem = if todo.title.trim().is_empty() {
        Some("Title: this field is required.".to_string())
    } else if todo.title.chars().count() > TITLE_MAX_LEN {
        Some(format!(
            "Title: ensure this value has at most {TITLE_MAX_LEN} characters (it has {}).",
            todo.title.chars().count()
        ))
    } else {
        match due_date {
            Ok(due_date) => {
                todo.due_date = due_date;
                None
            }
            Err(_) => Some("Due date: enter a valid date/time.".to_string()),
        }
    };
    if let Some(problem) = problem {
        tracing::debug!(id, %problem, "change form rejected");
        let rejection = Rejection {
            problem: &problem,
            due_date: &submitted_due_date,
        };
        return Ok(Html(views::admin_change_page(&todo, Some(rejection))).into_response());
    }

    db.update_todo(&mut todo)?;
    tracing::info!(id, "todo changed from admin");
    Ok(redirect_to("/admin/todos"))
}
