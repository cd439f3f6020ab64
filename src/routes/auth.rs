use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::middleware::{extract_session_token, SESSION_COOKIE_NAME};
use crate::response::{ok, AppError};
use crate::routes::required;
use crate::services::admin_auth::{self, AdminUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<AdminUser>,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let username = required(payload.username, "username")?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("password is required"))?;

    let admin = &state.config().admin;
    let session = admin_auth::admin_login(admin, &username, &password)?;
    let cookie = format!(
        "{SESSION_COOKIE_NAME}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        session.token,
        admin.session_ttl.as_secs()
    );

    let mut response = ok(session).into_response();
    set_cookie(&mut response, &cookie)?;
    Ok(response)
}

async fn logout() -> Result<Response, AppError> {
    let cookie = format!("{SESSION_COOKIE_NAME}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0");
    let mut response = ok(SessionStatus {
        authenticated: false,
        user: None,
    })
    .into_response();
    set_cookie(&mut response, &cookie)?;
    Ok(response)
}

async fn session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let user = extract_session_token(&headers).and_then(|token| {
        admin_auth::verify_session(&token, &state.config().admin.session_secret).ok()
    });
    ok(SessionStatus {
        authenticated: user.is_some(),
        user,
    })
}

fn set_cookie(response: &mut Response, cookie: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|err| AppError::internal(format!("invalid cookie header: {err}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
