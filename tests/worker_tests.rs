use ielts_backend::db::operations::{content, BoardType, ContentKind};
use ielts_backend::workers::{run_orphan_sweep, SweepTotals, WorkerManager, WorkerSettings};

mod common;

fn settings(leader: bool, orphan_sweep: bool, schedule: &str) -> WorkerSettings {
    WorkerSettings {
        leader,
        orphan_sweep,
        orphan_sweep_schedule: schedule.to_string(),
        orphan_sweep_dry_run: false,
    }
}

#[tokio::test]
async fn followers_schedule_nothing() {
    let manager = common::manager().await;
    let workers = WorkerManager::new(manager, settings(false, true, "0 30 3 * * *"))
        .await
        .unwrap();

    assert_eq!(workers.start().await.unwrap(), 0);
    assert!(!workers.is_running());
    workers.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leader_schedules_orphan_sweep_and_stops() {
    let manager = common::manager().await;
    let workers = WorkerManager::new(manager, settings(true, true, "0 30 3 * * *"))
        .await
        .unwrap();

    assert_eq!(workers.start().await.unwrap(), 1);
    assert!(workers.is_running());
    workers.stop().await;
    assert!(!workers.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_schedule_is_an_error() {
    let manager = common::manager().await;
    let workers = WorkerManager::new(manager, settings(true, true, "every tuesday"))
        .await
        .unwrap();

    assert!(workers.start().await.is_err());
}

#[tokio::test]
async fn scheduled_pass_sweeps_every_kind() {
    let manager = common::manager().await;
    let proxy = manager.proxy();
    common::vocab(proxy, "v1").await;
    common::vocab(proxy, "v2").await;
    common::expression(proxy, "e1").await;
    common::board(proxy, "b1", BoardType::Vocabulary, &["v1"]).await;

    let planned = run_orphan_sweep(&manager, true).await.unwrap();
    assert_eq!(
        planned,
        SweepTotals {
            orphaned: 2,
            deleted: 0,
            failed: 0
        }
    );

    let totals = run_orphan_sweep(&manager, false).await.unwrap();
    assert_eq!(totals.deleted, 2);
    assert!(content::item_exists(proxy, ContentKind::Vocabulary, "v1").await.unwrap());
    assert!(!content::item_exists(proxy, ContentKind::Expression, "e1").await.unwrap());
}
