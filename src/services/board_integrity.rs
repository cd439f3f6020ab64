//! Cascading deletion and membership mutation for boards and lessons.
//!
//! Membership is recorded only on the owning side (`itemIds` on boards and
//! lessons), so every path that removes a parent has to walk its children
//! explicitly. Child deletions are best-effort: each one is recorded as an
//! [`ItemOutcome`] and a failure never stops the walk. The parent row is
//! removed last.
//!
//! All mutating entry points take the manager's exclusive guard, which keeps
//! a sweep in this process from reading a membership list that a concurrent
//! cascade or `add_item` is about to change. Other processes are not
//! coordinated with.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::db::operations::{boards, content, lessons};
use crate::db::operations::{
    Board, BoardPatch, BoardType, ContentKind, Lesson, LessonPatch, NewBoard, NewLesson,
};
use crate::db::DatabaseProxy;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("board type {0} is not supported by this sweep")]
    UnsupportedBoardType(BoardType),
    #[error("board {0} does not exist")]
    UnknownBoard(String),
    #[error("lessons can only be added to grammar boards, {0} is {1}")]
    NotAGrammarBoard(String, BoardType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Board,
    Lesson,
    Vocabulary,
    Expression,
    Grammar,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Board => "board",
            RecordKind::Lesson => "lesson",
            RecordKind::Vocabulary => "vocabulary",
            RecordKind::Expression => "expression",
            RecordKind::Grammar => "grammar",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ContentKind> for RecordKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Vocabulary => RecordKind::Vocabulary,
            ContentKind::Expression => RecordKind::Expression,
            ContentKind::Grammar => RecordKind::Grammar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Deleted,
    /// The row was already gone.
    Missing,
    Failed,
    /// Dry run: the row matched and would have been deleted.
    Planned,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub kind: RecordKind,
    pub id: String,
    pub status: DeletionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub(crate) fn planned(kind: RecordKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            status: DeletionStatus::Planned,
            error: None,
        }
    }

    fn from_result(kind: RecordKind, id: &str, result: Result<bool, sqlx::Error>) -> Self {
        let (status, error) = match result {
            Ok(true) => (DeletionStatus::Deleted, None),
            Ok(false) => (DeletionStatus::Missing, None),
            Err(err) => {
                warn!(kind = ?kind, id = %id, error = %err, "child delete failed");
                (DeletionStatus::Failed, Some(err.to_string()))
            }
        };
        Self {
            kind,
            id: id.to_string(),
            status,
            error,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == DeletionStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub root_kind: RecordKind,
    pub root_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_type: Option<BoardType>,
    /// Children in the order they were processed.
    pub children: Vec<ItemOutcome>,
    /// Whether the root row itself was removed.
    pub deleted: bool,
}

impl CascadeReport {
    pub fn failed_children(&self) -> usize {
        self.children.iter().filter(|c| c.is_failed()).count()
    }

    pub fn deleted_children(&self) -> usize {
        self.children
            .iter()
            .filter(|c| c.status == DeletionStatus::Deleted)
            .count()
    }

    /// Root removed and no child failed.
    pub fn is_complete(&self) -> bool {
        self.deleted && self.failed_children() == 0
    }
}

#[derive(Clone)]
pub struct IntegrityManager {
    proxy: Arc<DatabaseProxy>,
    lock: Arc<Mutex<()>>,
}

impl IntegrityManager {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self {
            proxy,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn proxy(&self) -> &DatabaseProxy {
        &self.proxy
    }

    pub fn proxy_arc(&self) -> Arc<DatabaseProxy> {
        Arc::clone(&self.proxy)
    }

    pub(crate) async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Deletes a board and everything it owns. Returns `None` when the board
    /// does not exist.
    pub async fn delete_board(&self, board_id: &str) -> Result<Option<CascadeReport>, IntegrityError> {
        let _guard = self.exclusive().await;
        let proxy = self.proxy();

        let Some(board) = boards::get_board(proxy, board_id).await? else {
            debug!(board_id = %board_id, "delete_board: not found");
            return Ok(None);
        };

        let mut children = Vec::new();
        match board.board_type {
            BoardType::Grammar => {
                for lesson in lessons::get_lessons(proxy, Some(&board.id)).await? {
                    self.cascade_lesson(&lesson, &mut children).await;
                }
            }
            BoardType::Vocabulary | BoardType::Idioms => {
                let kind = board.board_type.content_kind();
                for item_id in &board.item_ids {
                    children.push(self.delete_content(kind, item_id).await);
                }
            }
        }

        let deleted = boards::delete_board(proxy, &board.id).await?;
        let report = CascadeReport {
            root_kind: RecordKind::Board,
            root_id: board.id,
            board_type: Some(board.board_type),
            children,
            deleted,
        };

        info!(
            board_id = %report.root_id,
            board_type = %board.board_type,
            children_deleted = report.deleted_children(),
            children_failed = report.failed_children(),
            deleted = report.deleted,
            "board cascade finished"
        );
        Ok(Some(report))
    }

    /// Deletes a lesson and the grammar items it lists.
    pub async fn delete_lesson(&self, lesson_id: &str) -> Result<Option<CascadeReport>, IntegrityError> {
        let _guard = self.exclusive().await;

        let Some(lesson) = lessons::get_lesson(self.proxy(), lesson_id).await? else {
            return Ok(None);
        };

        let mut children = Vec::new();
        for item_id in &lesson.item_ids {
            children.push(self.delete_content(ContentKind::Grammar, item_id).await);
        }
        let deleted = lessons::delete_lesson(self.proxy(), &lesson.id).await?;

        let report = CascadeReport {
            root_kind: RecordKind::Lesson,
            root_id: lesson.id,
            board_type: None,
            children,
            deleted,
        };
        info!(
            lesson_id = %report.root_id,
            children_deleted = report.deleted_children(),
            children_failed = report.failed_children(),
            deleted = report.deleted,
            "lesson cascade finished"
        );
        Ok(Some(report))
    }

    async fn cascade_lesson(&self, lesson: &Lesson, out: &mut Vec<ItemOutcome>) {
        for item_id in &lesson.item_ids {
            out.push(self.delete_content(ContentKind::Grammar, item_id).await);
        }
        let result = lessons::delete_lesson(self.proxy(), &lesson.id).await;
        out.push(ItemOutcome::from_result(RecordKind::Lesson, &lesson.id, result));
    }

    pub(crate) async fn delete_content(&self, kind: ContentKind, id: &str) -> ItemOutcome {
        let result = content::delete_item(self.proxy(), kind, id).await;
        ItemOutcome::from_result(kind.into(), id, result)
    }

    pub(crate) async fn delete_board_row(&self, id: &str) -> ItemOutcome {
        let result = boards::delete_board(self.proxy(), id).await;
        ItemOutcome::from_result(RecordKind::Board, id, result)
    }

    /// Deletes one content item. Boards and lessons listing it are left
    /// as they are; the integrity report lists them as dangling.
    pub async fn delete_item(&self, kind: ContentKind, id: &str) -> Result<bool, IntegrityError> {
        let _guard = self.exclusive().await;
        let deleted = content::delete_item(self.proxy(), kind, id).await?;
        debug!(kind = %kind, id = %id, deleted, "content item delete");
        Ok(deleted)
    }

    /// Inserts a board under the guard; its initial `itemIds` are membership.
    pub async fn create_board(&self, input: NewBoard) -> Result<Board, IntegrityError> {
        let _guard = self.exclusive().await;
        let board = boards::insert_board(self.proxy(), input).await?;
        info!(
            board_id = %board.id,
            board_type = %board.board_type,
            items = board.item_ids.len(),
            "board created"
        );
        Ok(board)
    }

    /// Inserts a lesson under a grammar board. The board check and the
    /// insert happen under one guard.
    pub async fn create_lesson(&self, input: NewLesson) -> Result<Lesson, IntegrityError> {
        let _guard = self.exclusive().await;

        let Some(board) = boards::get_board(self.proxy(), &input.board_id).await? else {
            return Err(IntegrityError::UnknownBoard(input.board_id));
        };
        if board.board_type != BoardType::Grammar {
            return Err(IntegrityError::NotAGrammarBoard(board.id, board.board_type));
        }

        let lesson = lessons::insert_lesson(self.proxy(), input).await?;
        info!(lesson_id = %lesson.id, board_id = %lesson.board_id, "lesson created");
        Ok(lesson)
    }

    /// Patch applied under the guard, since it may rewrite `itemIds`.
    pub async fn update_board(
        &self,
        board_id: &str,
        patch: BoardPatch,
    ) -> Result<Option<Board>, IntegrityError> {
        let _guard = self.exclusive().await;
        Ok(boards::update_board(self.proxy(), board_id, patch).await?)
    }

    pub async fn update_lesson(
        &self,
        lesson_id: &str,
        patch: LessonPatch,
    ) -> Result<Option<Lesson>, IntegrityError> {
        let _guard = self.exclusive().await;
        Ok(lessons::update_lesson(self.proxy(), lesson_id, patch).await?)
    }

    /// Appends `item_id` unless already present.
    pub async fn add_item(&self, board_id: &str, item_id: &str) -> Result<Option<Board>, IntegrityError> {
        let _guard = self.exclusive().await;

        let Some(board) = boards::get_board(self.proxy(), board_id).await? else {
            return Ok(None);
        };
        if board.item_ids.iter().any(|id| id == item_id) {
            return Ok(Some(board));
        }

        let mut item_ids = board.item_ids;
        item_ids.push(item_id.to_string());
        let patch = BoardPatch {
            item_ids: Some(item_ids),
            ..Default::default()
        };
        Ok(boards::update_board(self.proxy(), board_id, patch).await?)
    }

    /// Removes every occurrence of `item_id`; persists even when absent.
    pub async fn remove_item(&self, board_id: &str, item_id: &str) -> Result<Option<Board>, IntegrityError> {
        let _guard = self.exclusive().await;

        let Some(board) = boards::get_board(self.proxy(), board_id).await? else {
            return Ok(None);
        };
        let item_ids: Vec<String> = board.item_ids.into_iter().filter(|id| id != item_id).collect();
        let patch = BoardPatch {
            item_ids: Some(item_ids),
            ..Default::default()
        };
        Ok(boards::update_board(self.proxy(), board_id, patch).await?)
    }

    pub async fn add_lesson_item(
        &self,
        lesson_id: &str,
        item_id: &str,
    ) -> Result<Option<Lesson>, IntegrityError> {
        let _guard = self.exclusive().await;

        let Some(lesson) = lessons::get_lesson(self.proxy(), lesson_id).await? else {
            return Ok(None);
        };
        if lesson.item_ids.iter().any(|id| id == item_id) {
            return Ok(Some(lesson));
        }

        let mut item_ids = lesson.item_ids;
        item_ids.push(item_id.to_string());
        let patch = LessonPatch {
            item_ids: Some(item_ids),
            ..Default::default()
        };
        Ok(lessons::update_lesson(self.proxy(), lesson_id, patch).await?)
    }

    pub async fn remove_lesson_item(
        &self,
        lesson_id: &str,
        item_id: &str,
    ) -> Result<Option<Lesson>, IntegrityError> {
        let _guard = self.exclusive().await;

        let Some(lesson) = lessons::get_lesson(self.proxy(), lesson_id).await? else {
            return Ok(None);
        };
        let item_ids: Vec<String> = lesson.item_ids.into_iter().filter(|id| id != item_id).collect();
        let patch = LessonPatch {
            item_ids: Some(item_ids),
            ..Default::default()
        };
        Ok(lessons::update_lesson(self.proxy(), lesson_id, patch).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: DeletionStatus) -> ItemOutcome {
        ItemOutcome {
            kind: RecordKind::Vocabulary,
            id: "v".into(),
            status,
            error: None,
        }
    }

    #[test]
    fn report_is_incomplete_when_a_child_failed() {
        let report = CascadeReport {
            root_kind: RecordKind::Board,
            root_id: "b1".into(),
            board_type: Some(BoardType::Vocabulary),
            children: vec![
                outcome(DeletionStatus::Deleted),
                outcome(DeletionStatus::Missing),
                outcome(DeletionStatus::Failed),
            ],
            deleted: true,
        };
        assert_eq!(report.deleted_children(), 1);
        assert_eq!(report.failed_children(), 1);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn creates_wait_for_the_exclusive_guard() {
        let proxy = DatabaseProxy::in_memory().await.unwrap();
        let manager = IntegrityManager::new(Arc::new(proxy));
        let new_board = || NewBoard {
            id: Some("g1".into()),
            name: "Tenses".into(),
            board_type: BoardType::Grammar,
            description: None,
            color: None,
            icon: None,
            item_ids: Vec::new(),
            order: 0,
        };

        let guard = manager.exclusive().await;
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            manager.create_board(new_board()),
        )
        .await;
        assert!(blocked.is_err());
        assert!(boards::get_board(manager.proxy(), "g1").await.unwrap().is_none());
        drop(guard);

        manager.create_board(new_board()).await.unwrap();
        let guard = manager.exclusive().await;
        let lesson = NewLesson {
            id: Some("l1".into()),
            board_id: "g1".into(),
            title: "Past simple".into(),
            description: None,
            order: 0,
            item_ids: Vec::new(),
        };
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            manager.create_lesson(lesson.clone()),
        )
        .await;
        assert!(blocked.is_err());
        drop(guard);

        let created = manager.create_lesson(lesson).await.unwrap();
        assert_eq!(created.board_id, "g1");
    }

    #[test]
    fn outcome_serializes_status_in_snake_case() {
        let json = serde_json::to_value(outcome(DeletionStatus::Planned)).unwrap();
        assert_eq!(json["status"], "planned");
        assert_eq!(json["kind"], "vocabulary");
        assert!(json.get("error").is_none());
    }
}
