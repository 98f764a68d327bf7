pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod views;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use db::Database;
use error::AppError;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Exclusive access to the connection for the rest of the request step.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list))
        .route(
            "/create",
            get(handlers::create_form).post(handlers::create_submit),
        )
        .route(
            "/edit/:id",
            get(handlers::edit_form).post(handlers::edit_submit),
        )
        .route(
            "/delete/:id",
            get(handlers::delete_form).post(handlers::delete_submit),
        )
        .route("/toggle/:id", post(handlers::toggle_resolved))
        .route("/admin/todos", get(admin::list))
        .route(
            "/admin/todos/:id",
            get(admin::change_form).post(admin::change_submit),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
