use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::operations::grammar;
use crate::db::operations::{ContentKind, GrammarFilter, GrammarPatch, NewGrammar};
use crate::response::{ok, AppError};
use crate::routes::{non_blank, required};
use crate::state::AppState;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grammar))
        .route("/:id", get(get_grammar))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_grammar))
        .route("/:id", put(update_grammar).delete(delete_grammar))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGrammarRequest {
    id: Option<String>,
    title: Option<String>,
    structure: Option<String>,
    explanation: Option<String>,
    #[serde(default)]
    examples: Vec<String>,
    level: Option<String>,
}

async fn list_grammar(
    State(state): State<AppState>,
    Query(filter): Query<GrammarFilter>,
) -> Result<impl IntoResponse, AppError> {
    let filter = GrammarFilter {
        search: non_blank(filter.search),
        level: non_blank(filter.level),
    };
    let items = grammar::get_grammar_list(state.db_proxy().as_ref(), &filter).await?;
    Ok(ok(items))
}

async fn get_grammar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = grammar::get_grammar(state.db_proxy().as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("grammar item not found"))?;
    Ok(ok(item))
}

async fn create_grammar(
    State(state): State<AppState>,
    Json(payload): Json<CreateGrammarRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = required(payload.title, "title")?;

    let item = grammar::insert_grammar(
        state.db_proxy().as_ref(),
        NewGrammar {
            id: payload.id,
            title,
            structure: payload.structure.unwrap_or_default(),
            explanation: payload.explanation.unwrap_or_default(),
            examples: payload.examples,
            level: non_blank(payload.level),
        },
    )
    .await?;
    Ok(ok(item))
}

async fn update_grammar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<GrammarPatch>,
) -> Result<impl IntoResponse, AppError> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::validation("title must not be empty"));
    }
    let item = grammar::update_grammar(state.db_proxy().as_ref(), &id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("grammar item not found"))?;
    Ok(ok(item))
}

async fn delete_grammar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.integrity().delete_item(ContentKind::Grammar, &id).await? {
        return Err(AppError::not_found("grammar item not found"));
    }
    Ok(ok(serde_json::json!({ "id": id, "deleted": true })))
}
