pub mod auth;

pub use auth::{extract_session_token, require_admin, SESSION_COOKIE_NAME};
