use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use crate::db::operations::{boards, lessons};
use crate::db::operations::{BoardFilter, BoardPatch, BoardType, NewBoard};
use crate::response::{ok, AppError};
use crate::routes::{non_blank, required};
use crate::services::admin_auth::AdminUser;
use crate::state::AppState;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_boards))
        .route("/:id", get(get_board))
        .route("/:id/lessons", get(list_board_lessons))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_board))
        .route("/:id", put(update_board).delete(delete_board))
        .route("/:id/items", post(add_board_item))
        .route("/:id/items/:item_id", delete(remove_board_item))
}

#[derive(Debug, Deserialize)]
struct BoardQuery {
    #[serde(rename = "type")]
    board_type: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBoardRequest {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    board_type: Option<String>,
    description: Option<String>,
    color: Option<String>,
    icon: Option<String>,
    #[serde(default)]
    item_ids: Vec<String>,
    order: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MembershipRequest {
    pub item_id: Option<String>,
}

pub(crate) fn parse_board_type(raw: &str) -> Result<BoardType, AppError> {
    raw.parse::<BoardType>().map_err(AppError::validation)
}

async fn list_boards(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let board_type = non_blank(query.board_type)
        .map(|t| parse_board_type(&t))
        .transpose()?;
    let filter = BoardFilter {
        board_type,
        search: non_blank(query.search),
    };
    let items = boards::get_boards(state.db_proxy().as_ref(), &filter).await?;
    Ok(ok(items))
}

async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let board = boards::get_board(state.db_proxy().as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("board not found"))?;
    Ok(ok(board))
}

async fn list_board_lessons(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let proxy = state.db_proxy();
    if boards::get_board(proxy.as_ref(), &id).await?.is_none() {
        return Err(AppError::not_found("board not found"));
    }
    let items = lessons::get_lessons(proxy.as_ref(), Some(&id)).await?;
    Ok(ok(items))
}

async fn create_board(
    State(state): State<AppState>,
    Json(payload): Json<CreateBoardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = required(payload.name, "name")?;
    let board_type = parse_board_type(&required(payload.board_type, "type")?)?;

    let board = state
        .integrity()
        .create_board(NewBoard {
            id: payload.id,
            name,
            board_type,
            description: payload.description,
            color: payload.color,
            icon: payload.icon,
            item_ids: payload.item_ids,
            order: payload.order.unwrap_or(0),
        })
        .await?;
    Ok(ok(board))
}

async fn update_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<BoardPatch>,
) -> Result<impl IntoResponse, AppError> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("name must not be empty"));
    }
    let board = state
        .integrity()
        .update_board(&id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("board not found"))?;
    Ok(ok(board))
}

async fn delete_board(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .integrity()
        .delete_board(&id)
        .await?
        .ok_or_else(|| AppError::not_found("board not found"))?;
    tracing::info!(
        board_id = %id,
        admin = %admin.username,
        failed_children = report.failed_children(),
        "board deleted"
    );
    Ok(ok(report))
}

async fn add_board_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MembershipRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = required(payload.item_id, "itemId")?;
    let board = state
        .integrity()
        .add_item(&id, &item_id)
        .await?
        .ok_or_else(|| AppError::not_found("board not found"))?;
    Ok(ok(board))
}

async fn remove_board_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let board = state
        .integrity()
        .remove_item(&id, &item_id)
        .await?
        .ok_or_else(|| AppError::not_found("board not found"))?;
    Ok(ok(board))
}
