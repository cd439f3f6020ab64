mod orphan_sweep;

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::db::config::env_bool;
use crate::services::board_integrity::IntegrityManager;

pub use orphan_sweep::{run_orphan_sweep, SweepTotals};

const DEFAULT_ORPHAN_SWEEP_SCHEDULE: &str = "0 30 3 * * *";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub leader: bool,
    pub orphan_sweep: bool,
    pub orphan_sweep_schedule: String,
    pub orphan_sweep_dry_run: bool,
}

impl WorkerSettings {
    pub fn from_env() -> Self {
        Self {
            leader: env_bool("WORKER_LEADER", false),
            orphan_sweep: env_bool("ENABLE_ORPHAN_SWEEP_WORKER", false),
            orphan_sweep_schedule: std::env::var("ORPHAN_SWEEP_SCHEDULE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ORPHAN_SWEEP_SCHEDULE.to_string()),
            orphan_sweep_dry_run: env_bool("ORPHAN_SWEEP_DRY_RUN", false),
        }
    }
}

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    integrity: IntegrityManager,
    settings: WorkerSettings,
    running: AtomicBool,
}

impl WorkerManager {
    pub async fn new(
        integrity: IntegrityManager,
        settings: WorkerSettings,
    ) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            integrity,
            settings,
            running: AtomicBool::new(false),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Returns the number of jobs scheduled. Nothing runs unless this
    /// process is the worker leader.
    pub async fn start(&self) -> Result<usize, WorkerError> {
        if !self.settings.leader {
            info!("WORKER_LEADER not set, skipping worker startup");
            return Ok(0);
        }

        let scheduler = self.scheduler.lock().await;
        let mut scheduled = 0;

        if self.settings.orphan_sweep {
            let schedule = self.settings.orphan_sweep_schedule.clone();
            let dry_run = self.settings.orphan_sweep_dry_run;
            let integrity = self.integrity.clone();
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
                let integrity = integrity.clone();
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        result = run_orphan_sweep(&integrity, dry_run) => {
                            if let Err(e) = result {
                                error!(error = %e, "orphan sweep worker error");
                            }
                        }
                    }
                })
            })?;
            scheduler.add(job).await?;
            scheduled += 1;
            info!(schedule = %schedule, dry_run, "orphan sweep worker scheduled");
        }

        if scheduled == 0 {
            info!("no workers enabled");
            return Ok(0);
        }

        scheduler.start().await?;
        self.running.store(true, Ordering::Relaxed);
        info!(jobs = scheduled, "workers started");
        Ok(scheduled)
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        info!("stopping workers");
        let _ = self.shutdown_tx.send(());
        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "error shutting down scheduler");
        }
        info!("workers stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}
