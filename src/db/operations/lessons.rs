use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::operations::boards::dedup_preserving_order;
use crate::db::{decode_id_list, encode_json, now_iso, DatabaseProxy};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub description: Option<String>,
    pub order: i64,
    pub item_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
    #[serde(default)]
    pub id: Option<String>,
    pub board_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i64>,
    pub item_ids: Option<Vec<String>>,
}

/// All lessons, or only those of `board_id` when given.
pub async fn get_lessons(
    proxy: &DatabaseProxy,
    board_id: Option<&str>,
) -> Result<Vec<Lesson>, sqlx::Error> {
    let rows = match board_id {
        Some(board_id) => {
            sqlx::query(
                r#"SELECT * FROM "lessons" WHERE "boardId" = ? ORDER BY "order" ASC, "createdAt" ASC"#,
            )
            .bind(board_id)
            .fetch_all(proxy.pool())
            .await?
        }
        None => {
            sqlx::query(r#"SELECT * FROM "lessons" ORDER BY "boardId" ASC, "order" ASC"#)
                .fetch_all(proxy.pool())
                .await?
        }
    };
    rows.iter().map(map_lesson).collect()
}

pub async fn get_lesson(
    proxy: &DatabaseProxy,
    lesson_id: &str,
) -> Result<Option<Lesson>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "lessons" WHERE "id" = ? LIMIT 1"#)
        .bind(lesson_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_lesson).transpose()
}

pub async fn count_lessons_for_board(
    proxy: &DatabaseProxy,
    board_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "lessons" WHERE "boardId" = ?"#)
        .bind(board_id)
        .fetch_one(proxy.pool())
        .await
}

pub async fn insert_lesson(proxy: &DatabaseProxy, input: NewLesson) -> Result<Lesson, sqlx::Error> {
    let now = now_iso();
    let lesson = Lesson {
        id: input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        board_id: input.board_id,
        title: input.title.trim().to_string(),
        description: input.description,
        order: input.order,
        item_ids: dedup_preserving_order(input.item_ids),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO "lessons" (
            "id", "boardId", "title", "description", "order", "itemIds", "createdAt", "updatedAt"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&lesson.id)
    .bind(&lesson.board_id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(lesson.order)
    .bind(encode_json(&lesson.item_ids))
    .bind(&lesson.created_at)
    .bind(&lesson.updated_at)
    .execute(proxy.pool())
    .await?;

    Ok(lesson)
}

pub async fn update_lesson(
    proxy: &DatabaseProxy,
    lesson_id: &str,
    patch: LessonPatch,
) -> Result<Option<Lesson>, sqlx::Error> {
    let Some(mut lesson) = get_lesson(proxy, lesson_id).await? else {
        return Ok(None);
    };

    if let Some(title) = patch.title {
        lesson.title = title.trim().to_string();
    }
    if patch.description.is_some() {
        lesson.description = patch.description;
    }
    if let Some(order) = patch.order {
        lesson.order = order;
    }
    if let Some(item_ids) = patch.item_ids {
        lesson.item_ids = dedup_preserving_order(item_ids);
    }
    lesson.updated_at = now_iso();

    let result = sqlx::query(
        r#"
        UPDATE "lessons"
        SET "title" = ?, "description" = ?, "order" = ?, "itemIds" = ?, "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(lesson.order)
    .bind(encode_json(&lesson.item_ids))
    .bind(&lesson.updated_at)
    .bind(&lesson.id)
    .execute(proxy.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(lesson))
}

pub async fn delete_lesson(proxy: &DatabaseProxy, lesson_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "lessons" WHERE "id" = ?"#)
        .bind(lesson_id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

fn map_lesson(row: &SqliteRow) -> Result<Lesson, sqlx::Error> {
    Ok(Lesson {
        id: row.try_get("id")?,
        board_id: row.try_get("boardId")?,
        title: row.try_get("title").unwrap_or_default(),
        description: row.try_get("description").ok().flatten(),
        order: row.try_get("order").unwrap_or(0),
        item_ids: decode_id_list(row.try_get("itemIds")?, "itemIds")?,
        created_at: row.try_get("createdAt").unwrap_or_default(),
        updated_at: row.try_get("updatedAt").unwrap_or_default(),
    })
}
