use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::AdminConfig;

const SESSION_TOKEN_TYPE: &str = "admin_session";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminAuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("session expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub user: AdminUser,
    pub token: String,
    pub expires_at: String,
}

pub fn admin_login(
    config: &AdminConfig,
    username: &str,
    password: &str,
) -> Result<AdminSession, AdminAuthError> {
    let username = username.trim();
    let matched = config.credentials.iter().any(|c| {
        digest_eq(&c.username, username) && digest_eq(&c.password, password)
    });
    if !matched {
        tracing::warn!(username = %username, "admin login rejected");
        return Err(AdminAuthError::InvalidCredentials);
    }

    let (token, expires_at) = sign_session(username, &config.session_secret, config.session_ttl)?;
    tracing::info!(username = %username, "admin session issued");

    Ok(AdminSession {
        user: AdminUser {
            username: username.to_string(),
        },
        token,
        expires_at: expires_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

pub fn sign_session(
    username: &str,
    secret: &str,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>), AdminAuthError> {
    let issued_at = Utc::now();
    let ttl = chrono::Duration::from_std(ttl).map_err(|_| AdminAuthError::InvalidToken)?;
    let exp = issued_at
        .checked_add_signed(ttl)
        .ok_or(AdminAuthError::InvalidToken)?;

    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let payload = serde_json::json!({
        "type": SESSION_TOKEN_TYPE,
        "username": username,
        "iat": issued_at.timestamp(),
        "exp": exp.timestamp(),
    });

    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload.to_string());
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AdminAuthError::InvalidToken)?;
    mac.update(signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok((format!("{signing_input}.{sig_b64}"), exp))
}

pub fn verify_session(token: &str, secret: &str) -> Result<AdminUser, AdminAuthError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AdminAuthError::InvalidToken)?;
    let payload_b64 = parts.next().ok_or(AdminAuthError::InvalidToken)?;
    let sig_b64 = parts.next().ok_or(AdminAuthError::InvalidToken)?;
    if parts.next().is_some() {
        return Err(AdminAuthError::InvalidToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64.as_bytes())
        .map_err(|_| AdminAuthError::InvalidToken)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| AdminAuthError::InvalidToken)?;
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| AdminAuthError::InvalidToken)?;

    let header: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| AdminAuthError::InvalidToken)?;
    if header.get("alg").and_then(|v| v.as_str()) != Some("HS256") {
        return Err(AdminAuthError::InvalidToken);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AdminAuthError::InvalidToken)?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| AdminAuthError::InvalidToken)?;

    let payload: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|_| AdminAuthError::InvalidToken)?;
    if payload.get("type").and_then(|v| v.as_str()) != Some(SESSION_TOKEN_TYPE) {
        return Err(AdminAuthError::InvalidToken);
    }

    let exp = payload
        .get("exp")
        .and_then(|v| v.as_i64())
        .ok_or(AdminAuthError::InvalidToken)?;
    if Utc::now().timestamp() >= exp {
        return Err(AdminAuthError::Expired);
    }

    let username = payload
        .get("username")
        .and_then(|v| v.as_str())
        .ok_or(AdminAuthError::InvalidToken)?
        .to_string();

    Ok(AdminUser { username })
}

fn digest_eq(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes()) == Sha256::digest(b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminCredential;

    fn config() -> AdminConfig {
        AdminConfig {
            credentials: vec![
                AdminCredential {
                    username: "editor".into(),
                    password: "first".into(),
                },
                AdminCredential {
                    username: "owner".into(),
                    password: "second".into(),
                },
            ],
            session_secret: "test-secret".into(),
            session_ttl: Duration::from_secs(3600),
        }
    }

    #[test]
    fn login_then_verify() {
        let session = admin_login(&config(), "owner", "second").unwrap();
        let user = verify_session(&session.token, "test-secret").unwrap();
        assert_eq!(user.username, "owner");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let err = admin_login(&config(), "editor", "second").unwrap_err();
        assert_eq!(err, AdminAuthError::InvalidCredentials);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = sign_session("editor", "other", Duration::from_secs(60)).unwrap();
        assert_eq!(verify_session(&token, "test-secret"), Err(AdminAuthError::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let (token, _) = sign_session("editor", "test-secret", Duration::from_secs(60)).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            r#"{"type":"admin_session","username":"owner","iat":0,"exp":99999999999}"#,
        );
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;
        assert_eq!(
            verify_session(&parts.join("."), "test-secret"),
            Err(AdminAuthError::InvalidToken)
        );
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(verify_session("abc", "s"), Err(AdminAuthError::InvalidToken));
        assert_eq!(verify_session("a.b.c.d", "s"), Err(AdminAuthError::InvalidToken));
    }
}
