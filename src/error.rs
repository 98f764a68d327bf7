use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::views;

const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

/// Errors a request handler can end with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The path named a TODO that does not exist.
    #[error("todo {0} not found")]
    NotFound(i64),
    /// Submitted form data could not be accepted.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Storage or other unexpected failure. The cause is logged, never shown.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(id) => {
                tracing::debug!(id, "todo not found");
                (StatusCode::NOT_FOUND, "That TODO does not exist.".to_string())
            }
            AppError::InvalidInput(reason) => {
                tracing::debug!(%reason, "rejected form input");
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };
        (status, Html(views::error_page(status, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = AppError::NotFound(7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("That TODO does not exist."));
    }

    #[tokio::test]
    async fn invalid_input_shows_the_reason() {
        let response = AppError::InvalidInput("bad <date>".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("bad &lt;date&gt;"));
    }

    #[tokio::test]
    async fn internal_error_hides_the_cause() {
        let response = AppError::from(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(!body.contains("disk on fire"));
        assert!(body.contains("An unexpected error occurred"));
    }
}
