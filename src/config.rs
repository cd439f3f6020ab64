use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_DICTIONARY_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub credentials: Vec<AdminCredential>,
    pub session_secret: String,
    pub session_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub admin: AdminConfig,
    pub dictionary_api_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let dictionary_api_url = std::env::var("DICTIONARY_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DICTIONARY_API_URL.to_string());

        Self {
            host,
            port,
            log_level,
            admin: AdminConfig::from_env(),
            dictionary_api_url: dictionary_api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AdminConfig {
    pub fn from_env() -> Self {
        let credentials = std::env::var("ADMIN_CREDENTIALS")
            .map(|raw| parse_credentials(&raw))
            .unwrap_or_default();
        if credentials.is_empty() {
            tracing::warn!("ADMIN_CREDENTIALS not set, admin login disabled");
        }

        let session_secret = match std::env::var("SESSION_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("SESSION_SECRET not set, sessions will not survive a restart");
                uuid::Uuid::new_v4().to_string()
            }
        };

        let session_ttl = parse_session_ttl(std::env::var("SESSION_TTL_HOURS").ok().as_deref());

        Self {
            credentials,
            session_secret,
            session_ttl,
        }
    }
}

const DEFAULT_SESSION_TTL_HOURS: u64 = 24;

/// Hours to a TTL. Zero, garbage, or a value whose seconds overflow `u64`
/// fall back to the default.
fn parse_session_ttl(raw: Option<&str>) -> Duration {
    let secs = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|h| *h > 0)
        .and_then(|h| h.checked_mul(3600))
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS * 3600);
    Duration::from_secs(secs)
}

/// Parses `user:password[,user:password...]`. Entries without a colon or
/// with an empty side are skipped.
pub fn parse_credentials(raw: &str) -> Vec<AdminCredential> {
    raw.split(',')
        .filter_map(|entry| {
            let (username, password) = entry.trim().split_once(':')?;
            let username = username.trim();
            if username.is_empty() || password.is_empty() {
                return None;
            }
            Some(AdminCredential {
                username: username.to_string(),
                password: password.to_string(),
            })
        })
        .collect()
}
