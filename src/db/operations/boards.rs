use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::operations::content::ContentKind;
use crate::db::{decode_id_list, encode_json, now_iso, DatabaseProxy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    Grammar,
    Vocabulary,
    Idioms,
}

impl BoardType {
    pub const ALL: [BoardType; 3] = [BoardType::Grammar, BoardType::Vocabulary, BoardType::Idioms];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoardType::Grammar => "grammar",
            BoardType::Vocabulary => "vocabulary",
            BoardType::Idioms => "idioms",
        }
    }

    /// Kind of content a board of this type references, directly through
    /// `itemIds` or, for grammar boards, through its lessons.
    pub fn content_kind(&self) -> ContentKind {
        match self {
            BoardType::Grammar => ContentKind::Grammar,
            BoardType::Vocabulary => ContentKind::Vocabulary,
            BoardType::Idioms => ContentKind::Expression,
        }
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grammar" => Ok(BoardType::Grammar),
            "vocabulary" => Ok(BoardType::Vocabulary),
            "idioms" => Ok(BoardType::Idioms),
            other => Err(format!("unknown board type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub board_type: BoardType,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub item_ids: Vec<String>,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub board_type: BoardType,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub item_ids: Vec<String>,
    #[serde(default)]
    pub order: i64,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub item_ids: Option<Vec<String>>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct BoardFilter {
    pub board_type: Option<BoardType>,
    pub search: Option<String>,
}

impl BoardFilter {
    pub fn of_type(board_type: BoardType) -> Self {
        Self {
            board_type: Some(board_type),
            search: None,
        }
    }
}

pub async fn get_boards(
    proxy: &DatabaseProxy,
    filter: &BoardFilter,
) -> Result<Vec<Board>, sqlx::Error> {
    let mut sql = String::from(r#"SELECT * FROM "boards" WHERE 1 = 1"#);
    if filter.board_type.is_some() {
        sql.push_str(r#" AND "type" = ?"#);
    }
    if filter.search.is_some() {
        sql.push_str(r#" AND "name" LIKE ?"#);
    }
    sql.push_str(r#" ORDER BY "order" ASC, "createdAt" ASC"#);

    let mut q = sqlx::query(&sql);
    if let Some(board_type) = filter.board_type {
        q = q.bind(board_type.as_str());
    }
    if let Some(ref search) = filter.search {
        q = q.bind(format!("%{}%", search.trim()));
    }

    let rows = q.fetch_all(proxy.pool()).await?;
    rows.iter().map(map_board).collect()
}

pub async fn get_board(
    proxy: &DatabaseProxy,
    board_id: &str,
) -> Result<Option<Board>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "boards" WHERE "id" = ? LIMIT 1"#)
        .bind(board_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_board).transpose()
}

pub async fn insert_board(proxy: &DatabaseProxy, input: NewBoard) -> Result<Board, sqlx::Error> {
    let now = now_iso();
    let board = Board {
        id: input
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: input.name.trim().to_string(),
        board_type: input.board_type,
        description: input.description,
        color: input.color,
        icon: input.icon,
        item_ids: dedup_preserving_order(input.item_ids),
        order: input.order,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO "boards" (
            "id", "name", "type", "description", "color", "icon",
            "itemIds", "order", "createdAt", "updatedAt"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&board.id)
    .bind(&board.name)
    .bind(board.board_type.as_str())
    .bind(&board.description)
    .bind(&board.color)
    .bind(&board.icon)
    .bind(encode_json(&board.item_ids))
    .bind(board.order)
    .bind(&board.created_at)
    .bind(&board.updated_at)
    .execute(proxy.pool())
    .await?;

    Ok(board)
}

/// Applies `patch` to the stored board. Returns `None` when the board does
/// not exist.
pub async fn update_board(
    proxy: &DatabaseProxy,
    board_id: &str,
    patch: BoardPatch,
) -> Result<Option<Board>, sqlx::Error> {
    let Some(mut board) = get_board(proxy, board_id).await? else {
        return Ok(None);
    };

    if let Some(name) = patch.name {
        board.name = name.trim().to_string();
    }
    if patch.description.is_some() {
        board.description = patch.description;
    }
    if patch.color.is_some() {
        board.color = patch.color;
    }
    if patch.icon.is_some() {
        board.icon = patch.icon;
    }
    if let Some(item_ids) = patch.item_ids {
        board.item_ids = dedup_preserving_order(item_ids);
    }
    if let Some(order) = patch.order {
        board.order = order;
    }
    board.updated_at = now_iso();

    let result = sqlx::query(
        r#"
        UPDATE "boards"
        SET "name" = ?, "description" = ?, "color" = ?, "icon" = ?,
            "itemIds" = ?, "order" = ?, "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(&board.name)
    .bind(&board.description)
    .bind(&board.color)
    .bind(&board.icon)
    .bind(encode_json(&board.item_ids))
    .bind(board.order)
    .bind(&board.updated_at)
    .bind(&board.id)
    .execute(proxy.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(board))
}

/// Removes the board row only. Cascading is the integrity manager's job.
pub async fn delete_board(proxy: &DatabaseProxy, board_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "boards" WHERE "id" = ?"#)
        .bind(board_id)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_boards(proxy: &DatabaseProxy) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "boards""#)
        .fetch_one(proxy.pool())
        .await
}

pub(crate) fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter()
        .filter(|id| !id.trim().is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Fails on an unreadable `type` or `itemIds`: both decide what a cascade
/// or sweep deletes.
fn map_board(row: &SqliteRow) -> Result<Board, sqlx::Error> {
    let raw_type: String = row.try_get("type")?;
    let board_type = raw_type
        .parse::<BoardType>()
        .map_err(|err| sqlx::Error::ColumnDecode {
            index: "type".to_string(),
            source: err.into(),
        })?;
    Ok(Board {
        id: row.try_get("id")?,
        name: row.try_get("name").unwrap_or_default(),
        board_type,
        description: row.try_get("description").ok().flatten(),
        color: row.try_get("color").ok().flatten(),
        icon: row.try_get("icon").ok().flatten(),
        item_ids: decode_id_list(row.try_get("itemIds")?, "itemIds")?,
        order: row.try_get("order").unwrap_or(0),
        created_at: row.try_get("createdAt").unwrap_or_default(),
        updated_at: row.try_get("updatedAt").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_type_round_trips_through_str() {
        for board_type in BoardType::ALL {
            assert_eq!(board_type.as_str().parse::<BoardType>(), Ok(board_type));
        }
        assert!("phrases".parse::<BoardType>().is_err());
    }

    #[test]
    fn board_type_maps_to_content_kind() {
        assert_eq!(BoardType::Idioms.content_kind(), ContentKind::Expression);
        assert_eq!(BoardType::Vocabulary.content_kind(), ContentKind::Vocabulary);
        assert_eq!(BoardType::Grammar.content_kind(), ContentKind::Grammar);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let ids = vec!["b".into(), "a".into(), "b".into(), " ".into(), "c".into()];
        assert_eq!(dedup_preserving_order(ids), vec!["b", "a", "c"]);
    }
}
