use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;

use crate::db::operations::ContentKind;
use crate::response::{ok, AppError};
use crate::routes::boards::parse_board_type;
use crate::routes::{non_blank, required};
use crate::services::admin_auth::AdminUser;
use crate::services::reconciliation::SweepOptions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orphans", post(sweep_orphans))
        .route("/empty-boards", post(sweep_empty_boards))
        .route("/boards-without-lessons", post(sweep_boards_without_lessons))
        .route("/report", get(integrity_report))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SweepQuery {
    kind: Option<String>,
    #[serde(rename = "type")]
    board_type: Option<String>,
    #[serde(default)]
    dry_run: bool,
    #[serde(default)]
    more: bool,
}

impl SweepQuery {
    fn options(&self) -> SweepOptions {
        SweepOptions {
            dry_run: self.dry_run,
            detailed: self.more,
        }
    }
}

async fn sweep_orphans(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(query): Query<SweepQuery>,
) -> Result<impl IntoResponse, AppError> {
    let options = query.options();
    tracing::info!(admin = %admin.username, dry_run = options.dry_run, "orphan sweep requested");

    let reports = match non_blank(query.kind) {
        Some(raw) => {
            let kind = raw.parse::<ContentKind>().map_err(AppError::validation)?;
            vec![state.integrity().sweep_orphans(kind, options).await?]
        }
        None => state.integrity().sweep_all_orphans(options).await?,
    };
    Ok(ok(reports))
}

async fn sweep_empty_boards(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<impl IntoResponse, AppError> {
    let options = query.options();
    let board_type = parse_board_type(&required(query.board_type, "type")?)?;
    let report = state
        .integrity()
        .sweep_empty_boards(board_type, options)
        .await?;
    Ok(ok(report))
}

async fn sweep_boards_without_lessons(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .integrity()
        .sweep_boards_without_lessons(query.options())
        .await?;
    Ok(ok(report))
}

async fn integrity_report(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.integrity().integrity_report().await?))
}
