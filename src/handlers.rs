use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{parse_due_date, NewTodo};
use crate::views;
use crate::AppState;

/// Fields posted by the create and edit forms. A field missing from the
/// submission is `None`; a field submitted empty is `Some("")`.
#[derive(Debug, Default, Deserialize)]
pub struct TodoForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let todos = state.db()?.list_todos()?;
    Ok(Html(views::list_page(&todos)))
}

pub async fn create_form() -> Html<String> {
    Html(views::create_page())
}

/// Creates a TODO unless the title is missing or empty or the due date
/// unreadable. Either way the client is sent back to the list.
#[tracing::instrument(skip(state))]
pub async fn create_submit(
    State(state): State<AppState>,
    Form(form): Form<TodoForm>,
) -> Result<Response, AppError> {
    let title = form.title.unwrap_or_default();
    if title.is_empty() {
        tracing::debug!("no title submitted, nothing created");
        return Ok(redirect_to("/"));
    }
    let due_date = match parse_due_date(form.due_date.as_deref().unwrap_or_default()) {
        Ok(due_date) => due_date,
        Err(err) => {
            tracing::debug!(%err, "unreadable due date, nothing created");
            return Ok(redirect_to("/"));
        }
    };

    let todo = state.db()?.add_todo(&NewTodo {
        title,
        description: form.description.unwrap_or_default(),
        due_date,
    })?;
    tracing::info!(id = todo.id, "todo created");
    Ok(redirect_to("/"))
}

#[tracing::instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let todo = state.db()?.get_todo(id)?.ok_or(AppError::NotFound(id))?;
    Ok(Html(views::edit_page(&todo)))
}

/// Absent title or description keeps the stored value; an absent or empty
/// due date clears it.
#[tracing::instrument(skip(state))]
pub async fn edit_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<TodoForm>,
) -> Result<Response, AppError> {
    let db = state.db()?;
    let mut todo = db.get_todo(id)?.ok_or(AppError::NotFound(id))?;
    let due_date = parse_due_date(form.due_date.as_deref().unwrap_or_default())
        .map_err(|err| AppError::InvalidInput(err.to_string()))?;

    if let Some(title) = form.title {
        todo.title = title;
    }
    if let Some(description) = form.description {
        todo.description = description;
    }
    todo.due_date = due_date;
    db.update_todo(&mut todo)?;
    tracing::info!(id, "todo updated");
    Ok(redirect_to("/"))
}

#[tracing::instrument(skip(state))]
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let todo = state.db()?.get_todo(id)?.ok_or(AppError::NotFound(id))?;
    Ok(Html(views::delete_page(&todo)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !state.db()?.delete_todo(id)? {
        return Err(AppError::NotFound(id));
    }
    tracing::info!(id, "todo deleted");
    Ok(redirect_to("/"))
}

#[tracing::instrument(skip(state))]
pub async fn toggle_resolved(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let resolved = state
        .db()?
        .toggle_resolved(id)?
        .ok_or(AppError::NotFound(id))?;
    tracing::info!(id, resolved, "todo toggled");
    Ok(redirect_to("/"))
}

pub(crate) fn redirect_to(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
