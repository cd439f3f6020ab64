use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{decode_string_list, encode_json, now_iso, DatabaseProxy};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grammar {
    pub id: String,
    pub title: String,
    pub structure: String,
    pub explanation: String,
    pub examples: Vec<String>,
    pub level: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGrammar {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub structure: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub examples: Vec<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarPatch {
    pub title: Option<String>,
    pub structure: Option<String>,
    pub explanation: Option<String>,
    pub examples: Option<Vec<String>>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarFilter {
    pub search: Option<String>,
    pub level: Option<String>,
}

pub async fn get_grammar_list(
    proxy: &DatabaseProxy,
    filter: &GrammarFilter,
) -> Result<Vec<Grammar>, sqlx::Error> {
    let mut sql = String::from(r#"SELECT * FROM "grammar" WHERE 1 = 1"#);
    if filter.search.is_some() {
        sql.push_str(r#" AND ("title" LIKE ? OR "structure" LIKE ?)"#);
    }
    if filter.level.is_some() {
        sql.push_str(r#" AND "level" = ?"#);
    }
    sql.push_str(r#" ORDER BY "title" COLLATE NOCASE ASC"#);

    let mut q = sqlx::query(&sql);
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.trim());
        q = q.bind(pattern.clone()).bind(pattern);
    }
    if let Some(ref level) = filter.level {
        q = q.bind(level.trim().to_string());
    }

    let rows = q.fetch_all(proxy.pool()).await?;
    Ok(rows.iter().map(map_grammar).collect())
}

pub async fn get_grammar(proxy: &DatabaseProxy, id: &str) -> Result<Option<Grammar>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "grammar" WHERE "id" = ? LIMIT 1"#)
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.map(|r| map_grammar(&r)))
}

pub async fn get_grammar_by_ids(
    proxy: &DatabaseProxy,
    ids: &[String],
) -> Result<Vec<Grammar>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!(r#"SELECT * FROM "grammar" WHERE "id" IN ({placeholders})"#);
    let mut q = sqlx::query(&sql);
    for id in ids {
        q = q.bind(id);
    }
    let rows = q.fetch_all(proxy.pool()).await?;
    let mut items: Vec<Grammar> = rows.iter().map(map_grammar).collect();

    // keep lesson order
    items.sort_by_key(|g| ids.iter().position(|id| id == &g.id).unwrap_or(usize::MAX));
    Ok(items)
}

pub async fn insert_grammar(proxy: &DatabaseProxy, input: NewGrammar) -> Result<Grammar, sqlx::Error> {
    let now = now_iso();
    let item = Grammar {
        id: input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        title: input.title.trim().to_string(),
        structure: input.structure,
        explanation: input.explanation,
        examples: input.examples,
        level: input.level,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO "grammar" (
            "id", "title", "structure", "explanation", "examples", "level", "createdAt", "updatedAt"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.title)
    .bind(&item.structure)
    .bind(&item.explanation)
    .bind(encode_json(&item.examples))
    .bind(&item.level)
    .bind(&item.created_at)
    .bind(&item.updated_at)
    .execute(proxy.pool())
    .await?;

    Ok(item)
}

pub async fn update_grammar(
    proxy: &DatabaseProxy,
    id: &str,
    patch: GrammarPatch,
) -> Result<Option<Grammar>, sqlx::Error> {
    let Some(mut item) = get_grammar(proxy, id).await? else {
        return Ok(None);
    };

    if let Some(title) = patch.title {
        item.title = title.trim().to_string();
    }
    if let Some(structure) = patch.structure {
        item.structure = structure;
    }
    if let Some(explanation) = patch.explanation {
        item.explanation = explanation;
    }
    if let Some(examples) = patch.examples {
        item.examples = examples;
    }
    if patch.level.is_some() {
        item.level = patch.level;
    }
    item.updated_at = now_iso();

    sqlx::query(
        r#"
        UPDATE "grammar"
        SET "title" = ?, "structure" = ?, "explanation" = ?, "examples" = ?, "level" = ?, "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&item.title)
    .bind(&item.structure)
    .bind(&item.explanation)
    .bind(encode_json(&item.examples))
    .bind(&item.level)
    .bind(&item.updated_at)
    .bind(&item.id)
    .execute(proxy.pool())
    .await?;

    Ok(Some(item))
}

fn map_grammar(row: &SqliteRow) -> Grammar {
    Grammar {
        id: row.try_get("id").unwrap_or_default(),
        title: row.try_get("title").unwrap_or_default(),
        structure: row.try_get("structure").unwrap_or_default(),
        explanation: row.try_get("explanation").unwrap_or_default(),
        examples: decode_string_list(row.try_get("examples").ok()),
        level: row.try_get("level").ok().flatten(),
        created_at: row.try_get("createdAt").unwrap_or_default(),
        updated_at: row.try_get("updatedAt").unwrap_or_default(),
    }
}
