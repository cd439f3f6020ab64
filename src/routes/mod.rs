mod auth;
mod boards;
mod dictionary;
mod expressions;
mod grammar;
mod health;
mod lessons;
mod maintenance;
mod vocabulary;

use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::middleware::require_admin;
use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .nest("/boards", boards::admin_router())
        .nest("/lessons", lessons::admin_router())
        .nest("/vocabulary", vocabulary::admin_router())
        .nest("/expressions", expressions::admin_router())
        .nest("/grammar", grammar::admin_router())
        .nest("/maintenance", maintenance::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .nest("/health", health::router())
        .nest("/api/auth", auth::router())
        .nest("/api/boards", boards::public_router())
        .nest("/api/lessons", lessons::public_router())
        .nest("/api/vocabulary", vocabulary::public_router())
        .nest("/api/expressions", expressions::public_router())
        .nest("/api/grammar", grammar::public_router())
        .nest("/api/dictionary", dictionary::router())
        .nest("/api/admin", admin)
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    AppError::not_found("endpoint not found").into_response()
}

/// Trimmed, non-empty value of a required request field.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

/// `None` for absent or blank query values.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert!(required(Some("  ".into()), "name").is_err());
        assert!(required(None, "name").is_err());
        assert_eq!(required(Some(" Cells ".into()), "name").unwrap(), "Cells");
    }
}
