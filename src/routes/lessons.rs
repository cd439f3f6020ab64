use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::operations::{grammar, lessons};
use crate::db::operations::{LessonPatch, NewLesson};
use crate::response::{ok, AppError};
use crate::routes::boards::MembershipRequest;
use crate::routes::required;
use crate::state::AppState;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_lesson))
        .route("/:id/items", get(list_lesson_items))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lesson))
        .route("/:id", put(update_lesson).delete(delete_lesson))
        .route("/:id/items", post(add_lesson_item))
        .route("/:id/items/:item_id", delete(remove_lesson_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLessonRequest {
    id: Option<String>,
    board_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    order: Option<i64>,
    #[serde(default)]
    item_ids: Vec<String>,
}

async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = lessons::get_lesson(state.db_proxy().as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("lesson not found"))?;
    Ok(ok(lesson))
}

/// Grammar items of a lesson in lesson order. IDs that no longer resolve
/// are skipped.
async fn list_lesson_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let proxy = state.db_proxy();
    let lesson = lessons::get_lesson(proxy.as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("lesson not found"))?;
    let items = grammar::get_grammar_by_ids(proxy.as_ref(), &lesson.item_ids).await?;
    Ok(ok(items))
}

async fn create_lesson(
    State(state): State<AppState>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    let board_id = required(payload.board_id, "boardId")?;
    let title = required(payload.title, "title")?;

    let lesson = state
        .integrity()
        .create_lesson(NewLesson {
            id: payload.id,
            board_id,
            title,
            description: payload.description,
            order: payload.order.unwrap_or(0),
            item_ids: payload.item_ids,
        })
        .await?;
    Ok(ok(lesson))
}

async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<LessonPatch>,
) -> Result<impl IntoResponse, AppError> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::validation("title must not be empty"));
    }
    let lesson = state
        .integrity()
        .update_lesson(&id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("lesson not found"))?;
    Ok(ok(lesson))
}

async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .integrity()
        .delete_lesson(&id)
        .await?
        .ok_or_else(|| AppError::not_found("lesson not found"))?;
    Ok(ok(report))
}

async fn add_lesson_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MembershipRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = required(payload.item_id, "itemId")?;
    let lesson = state
        .integrity()
        .add_lesson_item(&id, &item_id)
        .await?
        .ok_or_else(|| AppError::not_found("lesson not found"))?;
    Ok(ok(lesson))
}

async fn remove_lesson_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = state
        .integrity()
        .remove_lesson_item(&id, &item_id)
        .await?
        .ok_or_else(|| AppError::not_found("lesson not found"))?;
    Ok(ok(lesson))
}
