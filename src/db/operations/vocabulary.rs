use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{decode_string_list, encode_json, now_iso, DatabaseProxy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyMeaning {
    #[serde(default)]
    pub part_of_speech: String,
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub id: String,
    pub word: String,
    pub phonetic: Option<String>,
    pub meanings: Vec<VocabularyMeaning>,
    pub topics: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVocabulary {
    #[serde(default)]
    pub id: Option<String>,
    pub word: String,
    pub phonetic: Option<String>,
    #[serde(default)]
    pub meanings: Vec<VocabularyMeaning>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyPatch {
    pub word: Option<String>,
    pub phonetic: Option<String>,
    pub meanings: Option<Vec<VocabularyMeaning>>,
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularyFilter {
    pub search: Option<String>,
    pub topic: Option<String>,
}

pub async fn get_vocabulary_list(
    proxy: &DatabaseProxy,
    filter: &VocabularyFilter,
) -> Result<Vec<Vocabulary>, sqlx::Error> {
    let mut sql = String::from(r#"SELECT * FROM "vocabulary" WHERE 1 = 1"#);
    if filter.search.is_some() {
        sql.push_str(r#" AND "word" LIKE ?"#);
    }
    sql.push_str(r#" ORDER BY "word" COLLATE NOCASE ASC"#);

    let mut q = sqlx::query(&sql);
    if let Some(ref search) = filter.search {
        q = q.bind(format!("%{}%", search.trim()));
    }
    let rows = q.fetch_all(proxy.pool()).await?;

    let mut items: Vec<Vocabulary> = rows.iter().map(map_vocabulary).collect();
    if let Some(ref topic) = filter.topic {
        items.retain(|v| v.topics.iter().any(|t| t.eq_ignore_ascii_case(topic)));
    }
    Ok(items)
}

pub async fn get_vocabulary(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<Option<Vocabulary>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "vocabulary" WHERE "id" = ? LIMIT 1"#)
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.map(|r| map_vocabulary(&r)))
}

pub async fn insert_vocabulary(
    proxy: &DatabaseProxy,
    input: NewVocabulary,
) -> Result<Vocabulary, sqlx::Error> {
    let now = now_iso();
    let item = Vocabulary {
        id: input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        word: input.word.trim().to_string(),
        phonetic: input.phonetic,
        meanings: input.meanings,
        topics: input.topics,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO "vocabulary" ("id", "word", "phonetic", "meanings", "topics", "createdAt", "updatedAt")
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.word)
    .bind(&item.phonetic)
    .bind(encode_json(&item.meanings))
    .bind(encode_json(&item.topics))
    .bind(&item.created_at)
    .bind(&item.updated_at)
    .execute(proxy.pool())
    .await?;

    Ok(item)
}

pub async fn update_vocabulary(
    proxy: &DatabaseProxy,
    id: &str,
    patch: VocabularyPatch,
) -> Result<Option<Vocabulary>, sqlx::Error> {
    let Some(mut item) = get_vocabulary(proxy, id).await? else {
        return Ok(None);
    };

    if let Some(word) = patch.word {
        item.word = word.trim().to_string();
    }
    if patch.phonetic.is_some() {
        item.phonetic = patch.phonetic;
    }
    if let Some(meanings) = patch.meanings {
        item.meanings = meanings;
    }
    if let Some(topics) = patch.topics {
        item.topics = topics;
    }
    item.updated_at = now_iso();

    sqlx::query(
        r#"
        UPDATE "vocabulary"
        SET "word" = ?, "phonetic" = ?, "meanings" = ?, "topics" = ?, "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&item.word)
    .bind(&item.phonetic)
    .bind(encode_json(&item.meanings))
    .bind(encode_json(&item.topics))
    .bind(&item.updated_at)
    .bind(&item.id)
    .execute(proxy.pool())
    .await?;

    Ok(Some(item))
}

fn map_vocabulary(row: &SqliteRow) -> Vocabulary {
    let meanings = row
        .try_get::<String, _>("meanings")
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();
    Vocabulary {
        id: row.try_get("id").unwrap_or_default(),
        word: row.try_get("word").unwrap_or_default(),
        phonetic: row.try_get("phonetic").ok().flatten(),
        meanings,
        topics: decode_string_list(row.try_get("topics").ok()),
        created_at: row.try_get("createdAt").unwrap_or_default(),
        updated_at: row.try_get("updatedAt").unwrap_or_default(),
    }
}
