use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::operations::{boards, content, ContentKind};
use crate::db::{format_iso, now_iso};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/stats", get(stats))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    timestamp: String,
    start_time: String,
    uptime: u64,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    boards: i64,
    vocabulary: i64,
    expressions: i64,
    grammar: i64,
}

async fn root(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let ping = state.db_proxy().ping().await;
    let ok = ping.is_ok();
    if let Err(err) = ping {
        tracing::warn!(error = %err, "health check: database unreachable");
    }

    let started_at: DateTime<Utc> = state.started_at_system().into();
    let response = HealthResponse {
        status: if ok { "ok" } else { "degraded" },
        database: if ok { "connected" } else { "disconnected" },
        latency_ms: ok.then(|| started.elapsed().as_millis() as u64),
        timestamp: now_iso(),
        start_time: format_iso(started_at),
        uptime: state.uptime_seconds(),
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

async fn stats(State(state): State<AppState>) -> Response {
    let proxy = state.db_proxy();
    let counts = async {
        Ok::<_, sqlx::Error>(StatsResponse {
            boards: boards::count_boards(proxy.as_ref()).await?,
            vocabulary: content::count_items(proxy.as_ref(), ContentKind::Vocabulary).await?,
            expressions: content::count_items(proxy.as_ref(), ContentKind::Expression).await?,
            grammar: content::count_items(proxy.as_ref(), ContentKind::Grammar).await?,
        })
    }
    .await;

    match counts {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health stats query failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
