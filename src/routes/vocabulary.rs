use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::operations::vocabulary;
use crate::db::operations::{ContentKind, NewVocabulary, VocabularyFilter, VocabularyMeaning, VocabularyPatch};
use crate::response::{ok, AppError};
use crate::routes::{non_blank, required};
use crate::state::AppState;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vocabulary))
        .route("/:id", get(get_vocabulary))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vocabulary))
        .route("/:id", put(update_vocabulary).delete(delete_vocabulary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVocabularyRequest {
    id: Option<String>,
    word: Option<String>,
    phonetic: Option<String>,
    #[serde(default)]
    meanings: Vec<VocabularyMeaning>,
    #[serde(default)]
    topics: Vec<String>,
}

async fn list_vocabulary(
    State(state): State<AppState>,
    Query(filter): Query<VocabularyFilter>,
) -> Result<impl IntoResponse, AppError> {
    let filter = VocabularyFilter {
        search: non_blank(filter.search),
        topic: non_blank(filter.topic),
    };
    let items = vocabulary::get_vocabulary_list(state.db_proxy().as_ref(), &filter).await?;
    Ok(ok(items))
}

async fn get_vocabulary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = vocabulary::get_vocabulary(state.db_proxy().as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("vocabulary not found"))?;
    Ok(ok(item))
}

async fn create_vocabulary(
    State(state): State<AppState>,
    Json(payload): Json<CreateVocabularyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let word = required(payload.word, "word")?;
    if payload.meanings.iter().any(|m| m.definition.trim().is_empty()) {
        return Err(AppError::validation("every meaning needs a definition"));
    }

    let item = vocabulary::insert_vocabulary(
        state.db_proxy().as_ref(),
        NewVocabulary {
            id: payload.id,
            word,
            phonetic: payload.phonetic,
            meanings: payload.meanings,
            topics: payload.topics,
        },
    )
    .await?;
    Ok(ok(item))
}

async fn update_vocabulary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<VocabularyPatch>,
) -> Result<impl IntoResponse, AppError> {
    if patch.word.as_deref().is_some_and(|w| w.trim().is_empty()) {
        return Err(AppError::validation("word must not be empty"));
    }
    let item = vocabulary::update_vocabulary(state.db_proxy().as_ref(), &id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("vocabulary not found"))?;
    Ok(ok(item))
}

async fn delete_vocabulary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.integrity().delete_item(ContentKind::Vocabulary, &id).await? {
        return Err(AppError::not_found("vocabulary not found"));
    }
    Ok(ok(serde_json::json!({ "id": id, "deleted": true })))
}
