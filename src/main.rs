use anyhow::{Context, Result};
use clap::Parser;

use todo_pages::config::Config;
use todo_pages::db::Database;
use todo_pages::{app, logger, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    logger::init_logger(config.verbose);

    let db = Database::connect(&config.database)?;
    let app = app(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!("todo-pages running on http://{}", config.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
