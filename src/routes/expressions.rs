use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::operations::expressions;
use crate::db::operations::{ContentKind, ExpressionFilter, ExpressionPatch, NewExpression};
use crate::response::{ok, AppError};
use crate::routes::{non_blank, required};
use crate::state::AppState;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expressions))
        .route("/:id", get(get_expression))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_expression))
        .route("/:id", put(update_expression).delete(delete_expression))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExpressionRequest {
    id: Option<String>,
    expression: Option<String>,
    #[serde(rename = "type")]
    expression_type: Option<String>,
    meaning: Option<String>,
    #[serde(default)]
    examples: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
}

async fn list_expressions(
    State(state): State<AppState>,
    Query(filter): Query<ExpressionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ExpressionFilter {
        search: non_blank(filter.search),
        expression_type: non_blank(filter.expression_type),
    };
    let items = expressions::get_expressions(state.db_proxy().as_ref(), &filter).await?;
    Ok(ok(items))
}

async fn get_expression(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = expressions::get_expression(state.db_proxy().as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("expression not found"))?;
    Ok(ok(item))
}

async fn create_expression(
    State(state): State<AppState>,
    Json(payload): Json<CreateExpressionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let expression = required(payload.expression, "expression")?;
    let meaning = required(payload.meaning, "meaning")?;

    let item = expressions::insert_expression(
        state.db_proxy().as_ref(),
        NewExpression {
            id: payload.id,
            expression,
            expression_type: payload.expression_type,
            meaning,
            examples: payload.examples,
            topics: payload.topics,
        },
    )
    .await?;
    Ok(ok(item))
}

async fn update_expression(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ExpressionPatch>,
) -> Result<impl IntoResponse, AppError> {
    if patch.expression.as_deref().is_some_and(|e| e.trim().is_empty()) {
        return Err(AppError::validation("expression must not be empty"));
    }
    let item = expressions::update_expression(state.db_proxy().as_ref(), &id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("expression not found"))?;
    Ok(ok(item))
}

async fn delete_expression(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.integrity().delete_item(ContentKind::Expression, &id).await? {
        return Err(AppError::not_found("expression not found"));
    }
    Ok(ok(serde_json::json!({ "id": id, "deleted": true })))
}
