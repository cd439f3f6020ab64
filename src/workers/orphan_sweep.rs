use tracing::{info, warn};

use crate::services::board_integrity::{IntegrityError, IntegrityManager};
use crate::services::reconciliation::SweepOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTotals {
    pub orphaned: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// One scheduled pass over every content kind.
pub async fn run_orphan_sweep(
    manager: &IntegrityManager,
    dry_run: bool,
) -> Result<SweepTotals, IntegrityError> {
    let options = SweepOptions {
        dry_run,
        detailed: false,
    };
    let reports = manager.sweep_all_orphans(options).await?;

    let totals = reports.iter().fold(SweepTotals::default(), |acc, r| SweepTotals {
        orphaned: acc.orphaned + r.orphaned,
        deleted: acc.deleted + r.deleted,
        failed: acc.failed + r.failed,
    });

    if totals.failed > 0 {
        warn!(failed = totals.failed, "scheduled orphan sweep left items behind");
    }
    info!(
        dry_run,
        orphaned = totals.orphaned,
        deleted = totals.deleted,
        "scheduled orphan sweep complete"
    );
    Ok(totals)
}
