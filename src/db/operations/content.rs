//! Kind-agnostic access to the three content tables.
//!
//! The integrity manager only needs identity-level operations (list IDs,
//! probe, delete), which are identical across vocabulary, expressions and
//! grammar. Typed CRUD lives in the per-kind modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Vocabulary,
    Expression,
    Grammar,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::Vocabulary,
        ContentKind::Expression,
        ContentKind::Grammar,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Vocabulary => "vocabulary",
            ContentKind::Expression => "expressions",
            ContentKind::Grammar => "grammar",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Vocabulary => "vocabulary",
            ContentKind::Expression => "expression",
            ContentKind::Grammar => "grammar",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vocabulary" | "vocab" => Ok(ContentKind::Vocabulary),
            "expression" | "expressions" | "idioms" => Ok(ContentKind::Expression),
            "grammar" => Ok(ContentKind::Grammar),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

pub async fn list_item_ids(
    proxy: &DatabaseProxy,
    kind: ContentKind,
) -> Result<Vec<String>, sqlx::Error> {
    let sql = format!(r#"SELECT "id" FROM "{}" ORDER BY "createdAt" ASC, "id" ASC"#, kind.table());
    sqlx::query_scalar(&sql).fetch_all(proxy.pool()).await
}

pub async fn item_exists(
    proxy: &DatabaseProxy,
    kind: ContentKind,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!(r#"SELECT COUNT(*) FROM "{}" WHERE "id" = ?"#, kind.table());
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(proxy.pool())
        .await?;
    Ok(count > 0)
}

/// Returns `false` when no row had that ID.
pub async fn delete_item(
    proxy: &DatabaseProxy,
    kind: ContentKind,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!(r#"DELETE FROM "{}" WHERE "id" = ?"#, kind.table());
    let result = sqlx::query(&sql).bind(id).execute(proxy.pool()).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_items(proxy: &DatabaseProxy, kind: ContentKind) -> Result<i64, sqlx::Error> {
    let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, kind.table());
    sqlx::query_scalar(&sql).fetch_one(proxy.pool()).await
}
