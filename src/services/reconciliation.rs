//! Batch reconciliation sweeps.
//!
//! Each sweep enumerates candidates, tests a predicate, deletes the matches
//! one at a time and reports counts plus per-record outcomes:
//!
//! - orphan sweep per content kind: items no board or lesson lists;
//! - empty-board sweep: vocabulary/idioms boards with no `itemIds`;
//! - grammar boards that own no lessons.
//!
//! An ID listed by any board or lesson keeps the item alive, even when the
//! holder's type does not match the item's kind. Such cross-typed holds are
//! counted as `foreignReferences` and left alone.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::db::operations::{boards, content, lessons};
use crate::db::operations::{Board, BoardFilter, BoardType, ContentKind, Lesson};
use crate::services::board_integrity::{
    DeletionStatus, IntegrityError, IntegrityManager, ItemOutcome, RecordKind,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    pub dry_run: bool,
    /// Also list preserved records together with their holders.
    pub detailed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub kind: RecordKind,
    pub id: String,
    /// Content kind the holder is expected to list.
    pub expects: ContentKind,
}

/// Every ID listed by any board or lesson, with the records that list it.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    holders: HashMap<String, Vec<Holder>>,
}

impl ReferenceIndex {
    pub fn build(boards: &[Board], lessons: &[Lesson]) -> Self {
        let mut holders: HashMap<String, Vec<Holder>> = HashMap::new();
        for board in boards {
            for item_id in &board.item_ids {
                holders.entry(item_id.clone()).or_default().push(Holder {
                    kind: RecordKind::Board,
                    id: board.id.clone(),
                    expects: board.board_type.content_kind(),
                });
            }
        }
        for lesson in lessons {
            for item_id in &lesson.item_ids {
                holders.entry(item_id.clone()).or_default().push(Holder {
                    kind: RecordKind::Lesson,
                    id: lesson.id.clone(),
                    expects: ContentKind::Grammar,
                });
            }
        }
        Self { holders }
    }

    pub async fn load(manager: &IntegrityManager) -> Result<Self, sqlx::Error> {
        let boards = boards::get_boards(manager.proxy(), &BoardFilter::default()).await?;
        let lessons = lessons::get_lessons(manager.proxy(), None).await?;
        Ok(Self::build(&boards, &lessons))
    }

    pub fn is_referenced(&self, id: &str) -> bool {
        self.holders.contains_key(id)
    }

    /// Referenced by at least one holder that expects `kind`.
    pub fn is_referenced_as(&self, kind: ContentKind, id: &str) -> bool {
        self.holders(id).iter().any(|h| h.expects == kind)
    }

    pub fn holders(&self, id: &str) -> &[Holder] {
        self.holders.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.holders.keys()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreservedItem {
    pub id: String,
    pub holders: Vec<Holder>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanSweepReport {
    pub kind: ContentKind,
    pub dry_run: bool,
    pub inspected: usize,
    pub referenced: usize,
    /// Preserved only because a holder of another type lists them.
    pub foreign_references: Vec<String>,
    pub orphaned: usize,
    pub deleted: usize,
    pub failed: usize,
    pub outcomes: Vec<ItemOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preserved: Vec<PreservedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardSweepKind {
    EmptyBoards,
    BoardsWithoutLessons,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSweepReport {
    pub sweep: BoardSweepKind,
    pub board_type: BoardType,
    pub dry_run: bool,
    pub inspected: usize,
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
    pub outcomes: Vec<ItemOutcome>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub holder: Holder,
    pub item_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSummary {
    pub kind: ContentKind,
    pub total: usize,
    pub orphaned: usize,
    pub foreign_references: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub boards: usize,
    pub lessons: usize,
    pub kinds: Vec<KindSummary>,
    pub empty_boards: Vec<String>,
    pub grammar_boards_without_lessons: Vec<String>,
    /// Lessons whose `boardId` no longer resolves.
    pub detached_lessons: Vec<String>,
    /// Listed IDs that resolve to no record of the expected kind.
    pub dangling: Vec<DanglingReference>,
}

/// Splits `ids` into orphans and IDs held only by holders of another kind.
fn classify(
    index: &ReferenceIndex,
    kind: ContentKind,
    ids: &[String],
) -> (Vec<String>, Vec<String>) {
    let mut orphans = Vec::new();
    let mut foreign = Vec::new();
    for id in ids {
        if !index.is_referenced(id) {
            orphans.push(id.clone());
        } else if !index.is_referenced_as(kind, id) {
            foreign.push(id.clone());
        }
    }
    (orphans, foreign)
}

fn tally(outcomes: &[ItemOutcome]) -> (usize, usize) {
    // Missing rows count as deleted.
    let deleted = outcomes
        .iter()
        .filter(|o| matches!(o.status, DeletionStatus::Deleted | DeletionStatus::Missing))
        .count();
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    (deleted, failed)
}

impl IntegrityManager {
    pub async fn sweep_orphans(
        &self,
        kind: ContentKind,
        options: SweepOptions,
    ) -> Result<OrphanSweepReport, IntegrityError> {
        let _guard = self.exclusive().await;
        let index = ReferenceIndex::load(self).await?;
        self.sweep_orphans_with(&index, kind, options).await
    }

    /// Sweeps every content kind against a single snapshot of the
    /// membership lists.
    pub async fn sweep_all_orphans(
        &self,
        options: SweepOptions,
    ) -> Result<Vec<OrphanSweepReport>, IntegrityError> {
        let _guard = self.exclusive().await;
        let index = ReferenceIndex::load(self).await?;

        let mut reports = Vec::with_capacity(ContentKind::ALL.len());
        for kind in ContentKind::ALL {
            reports.push(self.sweep_orphans_with(&index, kind, options).await?);
        }
        Ok(reports)
    }

    async fn sweep_orphans_with(
        &self,
        index: &ReferenceIndex,
        kind: ContentKind,
        options: SweepOptions,
    ) -> Result<OrphanSweepReport, IntegrityError> {
        let ids = content::list_item_ids(self.proxy(), kind).await?;
        let (orphans, foreign_references) = classify(index, kind, &ids);

        let mut outcomes = Vec::with_capacity(orphans.len());
        for id in &orphans {
            if options.dry_run {
                outcomes.push(ItemOutcome::planned(kind.into(), id));
            } else {
                outcomes.push(self.delete_content(kind, id).await);
            }
        }

        let preserved = if options.detailed {
            ids.iter()
                .filter(|id| index.is_referenced(id))
                .map(|id| PreservedItem {
                    id: id.clone(),
                    holders: index.holders(id).to_vec(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let (deleted, failed) = tally(&outcomes);
        let report = OrphanSweepReport {
            kind,
            dry_run: options.dry_run,
            inspected: ids.len(),
            referenced: ids.len() - orphans.len(),
            foreign_references,
            orphaned: orphans.len(),
            deleted,
            failed,
            outcomes,
            preserved,
        };

        if !report.foreign_references.is_empty() {
            warn!(
                kind = %kind,
                count = report.foreign_references.len(),
                "items kept alive only by boards of another type"
            );
        }
        info!(
            kind = %kind,
            dry_run = report.dry_run,
            inspected = report.inspected,
            orphaned = report.orphaned,
            deleted = report.deleted,
            failed = report.failed,
            "orphan sweep finished"
        );
        Ok(report)
    }

    /// Deletes boards of `board_type` whose `itemIds` is empty. Grammar
    /// boards are rejected: their content hangs off lessons, so an empty
    /// list is their normal state.
    pub async fn sweep_empty_boards(
        &self,
        board_type: BoardType,
        options: SweepOptions,
    ) -> Result<BoardSweepReport, IntegrityError> {
        if board_type == BoardType::Grammar {
            return Err(IntegrityError::UnsupportedBoardType(board_type));
        }

        let _guard = self.exclusive().await;
        let candidates = boards::get_boards(self.proxy(), &BoardFilter::of_type(board_type)).await?;
        let matched: Vec<&Board> = candidates.iter().filter(|b| b.item_ids.is_empty()).collect();

        let outcomes = self
            .delete_boards(matched.iter().map(|b| b.id.as_str()), options)
            .await;
        Ok(self.finish_board_sweep(
            BoardSweepKind::EmptyBoards,
            board_type,
            options,
            candidates.len(),
            outcomes,
        ))
    }

    pub async fn sweep_boards_without_lessons(
        &self,
        options: SweepOptions,
    ) -> Result<BoardSweepReport, IntegrityError> {
        let _guard = self.exclusive().await;
        let candidates =
            boards::get_boards(self.proxy(), &BoardFilter::of_type(BoardType::Grammar)).await?;

        let mut matched = Vec::new();
        for board in &candidates {
            if lessons::count_lessons_for_board(self.proxy(), &board.id).await? == 0 {
                matched.push(board.id.as_str());
            }
        }

        let outcomes = self.delete_boards(matched.into_iter(), options).await;
        Ok(self.finish_board_sweep(
            BoardSweepKind::BoardsWithoutLessons,
            BoardType::Grammar,
            options,
            candidates.len(),
            outcomes,
        ))
    }

    async fn delete_boards<'a>(
        &self,
        ids: impl Iterator<Item = &'a str>,
        options: SweepOptions,
    ) -> Vec<ItemOutcome> {
        let mut outcomes = Vec::new();
        for id in ids {
            if options.dry_run {
                outcomes.push(ItemOutcome::planned(RecordKind::Board, id));
            } else {
                outcomes.push(self.delete_board_row(id).await);
            }
        }
        outcomes
    }

    fn finish_board_sweep(
        &self,
        sweep: BoardSweepKind,
        board_type: BoardType,
        options: SweepOptions,
        inspected: usize,
        outcomes: Vec<ItemOutcome>,
    ) -> BoardSweepReport {
        let (deleted, failed) = tally(&outcomes);
        let report = BoardSweepReport {
            sweep,
            board_type,
            dry_run: options.dry_run,
            inspected,
            matched: outcomes.len(),
            deleted,
            failed,
            outcomes,
        };
        info!(
            sweep = ?sweep,
            board_type = %board_type,
            dry_run = report.dry_run,
            inspected = report.inspected,
            matched = report.matched,
            deleted = report.deleted,
            failed = report.failed,
            "board sweep finished"
        );
        report
    }

    /// Read-only overview of every soft invariant. Nothing is repaired.
    pub async fn integrity_report(&self) -> Result<IntegrityReport, IntegrityError> {
        let _guard = self.exclusive().await;
        let proxy = self.proxy();

        let all_boards = boards::get_boards(proxy, &BoardFilter::default()).await?;
        let all_lessons = lessons::get_lessons(proxy, None).await?;
        let index = ReferenceIndex::build(&all_boards, &all_lessons);

        let mut existing: HashMap<ContentKind, HashSet<String>> = HashMap::new();
        let mut kinds = Vec::with_capacity(ContentKind::ALL.len());
        for kind in ContentKind::ALL {
            let ids = content::list_item_ids(proxy, kind).await?;
            let (orphans, foreign) = classify(&index, kind, &ids);
            kinds.push(KindSummary {
                kind,
                total: ids.len(),
                orphaned: orphans.len(),
                foreign_references: foreign.len(),
            });
            existing.insert(kind, ids.into_iter().collect());
        }

        let board_ids: HashSet<&str> = all_boards.iter().map(|b| b.id.as_str()).collect();
        let boards_with_lessons: HashSet<&str> =
            all_lessons.iter().map(|l| l.board_id.as_str()).collect();

        let empty_boards = all_boards
            .iter()
            .filter(|b| b.board_type != BoardType::Grammar && b.item_ids.is_empty())
            .map(|b| b.id.clone())
            .collect();
        let grammar_boards_without_lessons = all_boards
            .iter()
            .filter(|b| b.board_type == BoardType::Grammar)
            .filter(|b| !boards_with_lessons.contains(b.id.as_str()))
            .map(|b| b.id.clone())
            .collect();
        let detached_lessons = all_lessons
            .iter()
            .filter(|l| !board_ids.contains(l.board_id.as_str()))
            .map(|l| l.id.clone())
            .collect();

        let mut dangling = Vec::new();
        let mut listed: Vec<&String> = index.ids().collect();
        listed.sort();
        for item_id in listed {
            for holder in index.holders(item_id) {
                let resolves = existing
                    .get(&holder.expects)
                    .is_some_and(|ids| ids.contains(item_id));
                if !resolves {
                    dangling.push(DanglingReference {
                        holder: holder.clone(),
                        item_id: item_id.clone(),
                    });
                }
            }
        }

        Ok(IntegrityReport {
            boards: all_boards.len(),
            lessons: all_lessons.len(),
            kinds,
            empty_boards,
            grammar_boards_without_lessons,
            detached_lessons,
            dangling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(id: &str, board_type: BoardType, items: &[&str]) -> Board {
        Board {
            id: id.into(),
            name: id.into(),
            board_type,
            description: None,
            color: None,
            icon: None,
            item_ids: items.iter().map(|s| s.to_string()).collect(),
            order: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn lesson(id: &str, board_id: &str, items: &[&str]) -> Lesson {
        Lesson {
            id: id.into(),
            board_id: board_id.into(),
            title: id.into(),
            description: None,
            order: 0,
            item_ids: items.iter().map(|s| s.to_string()).collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn index_records_every_holder() {
        let boards = vec![
            board("b1", BoardType::Vocabulary, &["v1", "v2"]),
            board("b2", BoardType::Idioms, &["v2"]),
        ];
        let lessons = vec![lesson("l1", "g1", &["g-a"])];
        let index = ReferenceIndex::build(&boards, &lessons);

        assert_eq!(index.len(), 3);
        assert_eq!(index.holders("v2").len(), 2);
        assert!(index.is_referenced_as(ContentKind::Grammar, "g-a"));
        assert!(!index.is_referenced("v3"));
    }

    #[test]
    fn classify_keeps_foreign_references_but_flags_them() {
        let boards = vec![board("b1", BoardType::Idioms, &["v9"])];
        let index = ReferenceIndex::build(&boards, &[]);
        let ids = vec!["v1".to_string(), "v9".to_string()];

        let (orphans, foreign) = classify(&index, ContentKind::Vocabulary, &ids);
        assert_eq!(orphans, vec!["v1".to_string()]);
        assert_eq!(foreign, vec!["v9".to_string()]);
    }

    #[test]
    fn tally_counts_missing_as_deleted() {
        let make = |status| ItemOutcome {
            kind: RecordKind::Grammar,
            id: "g".into(),
            status,
            error: None,
        };
        let outcomes = vec![
            make(DeletionStatus::Deleted),
            make(DeletionStatus::Missing),
            make(DeletionStatus::Failed),
            make(DeletionStatus::Planned),
        ];
        assert_eq!(tally(&outcomes), (2, 1));
    }
}
