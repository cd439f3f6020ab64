use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{decode_string_list, encode_json, now_iso, DatabaseProxy};

const DEFAULT_EXPRESSION_TYPE: &str = "idiom";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    pub id: String,
    pub expression: String,
    #[serde(rename = "type")]
    pub expression_type: String,
    pub meaning: String,
    pub examples: Vec<String>,
    pub topics: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpression {
    #[serde(default)]
    pub id: Option<String>,
    pub expression: String,
    #[serde(rename = "type", default)]
    pub expression_type: Option<String>,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionPatch {
    pub expression: Option<String>,
    #[serde(rename = "type")]
    pub expression_type: Option<String>,
    pub meaning: Option<String>,
    pub examples: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpressionFilter {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub expression_type: Option<String>,
}

pub async fn get_expressions(
    proxy: &DatabaseProxy,
    filter: &ExpressionFilter,
) -> Result<Vec<Expression>, sqlx::Error> {
    let mut sql = String::from(r#"SELECT * FROM "expressions" WHERE 1 = 1"#);
    if filter.search.is_some() {
        sql.push_str(r#" AND ("expression" LIKE ? OR "meaning" LIKE ?)"#);
    }
    if filter.expression_type.is_some() {
        sql.push_str(r#" AND "type" = ?"#);
    }
    sql.push_str(r#" ORDER BY "expression" COLLATE NOCASE ASC"#);

    let mut q = sqlx::query(&sql);
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.trim());
        q = q.bind(pattern.clone()).bind(pattern);
    }
    if let Some(ref expression_type) = filter.expression_type {
        q = q.bind(expression_type.trim().to_ascii_lowercase());
    }

    let rows = q.fetch_all(proxy.pool()).await?;
    Ok(rows.iter().map(map_expression).collect())
}

pub async fn get_expression(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<Option<Expression>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "expressions" WHERE "id" = ? LIMIT 1"#)
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.map(|r| map_expression(&r)))
}

pub async fn insert_expression(
    proxy: &DatabaseProxy,
    input: NewExpression,
) -> Result<Expression, sqlx::Error> {
    let now = now_iso();
    let item = Expression {
        id: input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        expression: input.expression.trim().to_string(),
        expression_type: normalize_type(input.expression_type),
        meaning: input.meaning,
        examples: input.examples,
        topics: input.topics,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO "expressions" (
            "id", "expression", "type", "meaning", "examples", "topics", "createdAt", "updatedAt"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.expression)
    .bind(&item.expression_type)
    .bind(&item.meaning)
    .bind(encode_json(&item.examples))
    .bind(encode_json(&item.topics))
    .bind(&item.created_at)
    .bind(&item.updated_at)
    .execute(proxy.pool())
    .await?;

    Ok(item)
}

pub async fn update_expression(
    proxy: &DatabaseProxy,
    id: &str,
    patch: ExpressionPatch,
) -> Result<Option<Expression>, sqlx::Error> {
    let Some(mut item) = get_expression(proxy, id).await? else {
        return Ok(None);
    };

    if let Some(expression) = patch.expression {
        item.expression = expression.trim().to_string();
    }
    if patch.expression_type.is_some() {
        item.expression_type = normalize_type(patch.expression_type);
    }
    if let Some(meaning) = patch.meaning {
        item.meaning = meaning;
    }
    if let Some(examples) = patch.examples {
        item.examples = examples;
    }
    if let Some(topics) = patch.topics {
        item.topics = topics;
    }
    item.updated_at = now_iso();

    sqlx::query(
        r#"
        UPDATE "expressions"
        SET "expression" = ?, "type" = ?, "meaning" = ?, "examples" = ?, "topics" = ?, "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&item.expression)
    .bind(&item.expression_type)
    .bind(&item.meaning)
    .bind(encode_json(&item.examples))
    .bind(encode_json(&item.topics))
    .bind(&item.updated_at)
    .bind(&item.id)
    .execute(proxy.pool())
    .await?;

    Ok(Some(item))
}

fn normalize_type(raw: Option<String>) -> String {
    raw.map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPRESSION_TYPE.to_string())
}

fn map_expression(row: &SqliteRow) -> Expression {
    Expression {
        id: row.try_get("id").unwrap_or_default(),
        expression: row.try_get("expression").unwrap_or_default(),
        expression_type: row
            .try_get("type")
            .unwrap_or_else(|_| DEFAULT_EXPRESSION_TYPE.to_string()),
        meaning: row.try_get("meaning").unwrap_or_default(),
        examples: decode_string_list(row.try_get("examples").ok()),
        topics: decode_string_list(row.try_get("topics").ok()),
        created_at: row.try_get("createdAt").unwrap_or_default(),
        updated_at: row.try_get("updatedAt").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_type_falls_back_to_idiom() {
        assert_eq!(normalize_type(None), "idiom");
        assert_eq!(normalize_type(Some("  ".into())), "idiom");
        assert_eq!(normalize_type(Some("Phrase".into())), "phrase");
    }
}
