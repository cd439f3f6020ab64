//! Property tests for the orphan sweep.
//!
//! - an item is deleted iff no board or lesson lists its ID
//! - a second sweep with no intervening change deletes nothing
//! - adding the same member twice leaves the list as adding it once

use std::collections::HashSet;

use proptest::prelude::*;

use ielts_backend::db::operations::{content, BoardType, ContentKind};
use ielts_backend::services::reconciliation::SweepOptions;

mod common;

const RUN: SweepOptions = SweepOptions {
    dry_run: false,
    detailed: false,
};

#[derive(Debug, Clone)]
struct Layout {
    vocab: usize,
    grammar: usize,
    /// Per vocabulary board, indices into a pool that is larger than the
    /// item count, so some listed IDs do not resolve.
    boards: Vec<Vec<usize>>,
    lessons: Vec<Vec<usize>>,
}

fn arb_layout() -> impl Strategy<Value = Layout> {
    (0usize..8, 0usize..6).prop_flat_map(|(vocab, grammar)| {
        (
            Just(vocab),
            Just(grammar),
            prop::collection::vec(prop::collection::vec(0usize..10, 0..5), 0..4),
            prop::collection::vec(prop::collection::vec(0usize..8, 0..4), 0..3),
        )
            .prop_map(|(vocab, grammar, boards, lessons)| Layout {
                vocab,
                grammar,
                boards,
                lessons,
            })
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sweep_deletes_exactly_the_unreferenced_items(layout in arb_layout()) {
        runtime().block_on(async {
            let manager = common::manager().await;
            let proxy = manager.proxy();

            for i in 0..layout.vocab {
                common::vocab(proxy, &format!("v{i}")).await;
            }
            for i in 0..layout.grammar {
                common::grammar_item(proxy, &format!("g{i}")).await;
            }

            let mut referenced = HashSet::new();
            for (b, members) in layout.boards.iter().enumerate() {
                let ids: Vec<String> = members.iter().map(|i| format!("v{i}")).collect();
                referenced.extend(ids.iter().cloned());
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                common::board(proxy, &format!("b{b}"), BoardType::Vocabulary, &refs).await;
            }
            common::board(proxy, "gb", BoardType::Grammar, &[]).await;
            for (l, members) in layout.lessons.iter().enumerate() {
                let ids: Vec<String> = members.iter().map(|i| format!("g{i}")).collect();
                referenced.extend(ids.iter().cloned());
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                common::lesson(proxy, &format!("l{l}"), "gb", &refs).await;
            }

            let mut expected_deleted = HashSet::new();
            for kind in [ContentKind::Vocabulary, ContentKind::Grammar] {
                for id in content::list_item_ids(proxy, kind).await.unwrap() {
                    if !referenced.contains(&id) {
                        expected_deleted.insert(id);
                    }
                }
            }

            let first = manager.sweep_all_orphans(RUN).await.unwrap();
            let deleted: HashSet<String> = first
                .iter()
                .flat_map(|r| r.outcomes.iter().map(|o| o.id.clone()))
                .collect();
            prop_assert_eq!(&deleted, &expected_deleted);

            for id in &referenced {
                let kind = if id.starts_with('v') { ContentKind::Vocabulary } else { ContentKind::Grammar };
                let still_there = content::item_exists(proxy, kind, id).await.unwrap();
                let was_created = match kind {
                    ContentKind::Vocabulary => id[1..].parse::<usize>().unwrap() < layout.vocab,
                    _ => id[1..].parse::<usize>().unwrap() < layout.grammar,
                };
                prop_assert_eq!(still_there, was_created);
            }

            let second = manager.sweep_all_orphans(RUN).await.unwrap();
            prop_assert!(second.iter().all(|r| r.orphaned == 0 && r.deleted == 0));
            Ok(())
        })?;
    }

    #[test]
    fn repeated_add_item_matches_single_add(
        initial in prop::collection::vec("[a-d]", 0..4),
        item in "[a-f]",
        repeats in 1usize..4,
    ) {
        runtime().block_on(async {
            let manager = common::manager().await;
            let refs: Vec<&str> = initial.iter().map(String::as_str).collect();
            common::board(manager.proxy(), "b1", BoardType::Vocabulary, &refs).await;

            let once = manager.add_item("b1", &item).await.unwrap().unwrap();
            let mut last = once.clone();
            for _ in 0..repeats {
                last = manager.add_item("b1", &item).await.unwrap().unwrap();
            }
            prop_assert_eq!(&last.item_ids, &once.item_ids);
            prop_assert_eq!(once.item_ids.iter().filter(|id| **id == item).count(), 1);
            Ok(())
        })?;
    }
}
