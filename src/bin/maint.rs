use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use ielts_backend::db::config::DbConfig;
use ielts_backend::db::operations::{BoardType, ContentKind};
use ielts_backend::db::DatabaseProxy;
use ielts_backend::logging::init_tracing;
use ielts_backend::services::board_integrity::{
    CascadeReport, DeletionStatus, IntegrityManager, ItemOutcome,
};
use ielts_backend::services::reconciliation::{
    BoardSweepReport, IntegrityReport, OrphanSweepReport, SweepOptions,
};

#[derive(Parser, Debug)]
#[command(name = "ielts-maint", version, about = "Board and content maintenance")]
struct Cli {
    /// SQLite URL; defaults to DATABASE_URL.
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete content items that no board or lesson lists.
    Orphans {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        dry_run: bool,
        /// Also list every preserved item and what holds it.
        #[arg(long)]
        more: bool,
    },
    /// Delete boards of a type whose item list is empty.
    EmptyBoards {
        #[arg(long = "type", value_enum)]
        board_type: BoardTypeArg,
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete grammar boards that own no lessons.
    BoardsWithoutLessons {
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete a board and everything it owns.
    DeleteBoard { id: String },
    /// Read-only integrity overview.
    Report,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Vocabulary,
    Expressions,
    Grammar,
}

impl From<KindArg> for ContentKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Vocabulary => ContentKind::Vocabulary,
            KindArg::Expressions => ContentKind::Expression,
            KindArg::Grammar => ContentKind::Grammar,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BoardTypeArg {
    Vocabulary,
    Idioms,
}

impl From<BoardTypeArg> for BoardType {
    fn from(arg: BoardTypeArg) -> Self {
        match arg {
            BoardTypeArg::Vocabulary => BoardType::Vocabulary,
            BoardTypeArg::Idioms => BoardType::Idioms,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let _log_guard = init_tracing(&level);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = DbConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.url = url;
    }
    let proxy = Arc::new(DatabaseProxy::connect(config).await?);
    let manager = IntegrityManager::new(proxy);

    match cli.command {
        Command::Orphans {
            kind,
            dry_run,
            more,
        } => {
            let options = SweepOptions {
                dry_run,
                detailed: more,
            };
            let reports = match kind {
                Some(kind) => vec![manager.sweep_orphans(kind.into(), options).await?],
                None => manager.sweep_all_orphans(options).await?,
            };
            for report in &reports {
                print_orphan_report(report);
            }
        }
        Command::EmptyBoards {
            board_type,
            dry_run,
        } => {
            let options = SweepOptions {
                dry_run,
                detailed: false,
            };
            let report = manager.sweep_empty_boards(board_type.into(), options).await?;
            print_board_report(&report);
        }
        Command::BoardsWithoutLessons { dry_run } => {
            let options = SweepOptions {
                dry_run,
                detailed: false,
            };
            let report = manager.sweep_boards_without_lessons(options).await?;
            print_board_report(&report);
        }
        Command::DeleteBoard { id } => match manager.delete_board(&id).await? {
            Some(report) => print_cascade_report(&report),
            None => {
                println!("board {id} not found");
                return Ok(false);
            }
        },
        Command::Report => print_integrity_report(&manager.integrity_report().await?),
    }
    Ok(true)
}

fn outcome_line(outcome: &ItemOutcome) -> String {
    let status = match outcome.status {
        DeletionStatus::Deleted => "deleted",
        DeletionStatus::Missing => "already gone",
        DeletionStatus::Failed => "FAILED",
        DeletionStatus::Planned => "would delete",
    };
    match &outcome.error {
        Some(err) => format!("  {status} {} {}: {err}", outcome.kind, outcome.id),
        None => format!("  {status} {} {}", outcome.kind, outcome.id),
    }
}

fn print_orphan_report(report: &OrphanSweepReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!("== {} orphans{mode}", report.kind);
    for outcome in &report.outcomes {
        println!("{}", outcome_line(outcome));
    }
    for item in &report.preserved {
        let holders: Vec<String> = item
            .holders
            .iter()
            .map(|h| format!("{} {}", h.kind, h.id))
            .collect();
        println!("  kept {} <- {}", item.id, holders.join(", "));
    }
    if !report.foreign_references.is_empty() {
        println!(
            "  note: {} item(s) kept only by a board of another type: {}",
            report.foreign_references.len(),
            report.foreign_references.join(", ")
        );
    }
    println!(
        "inspected {}, referenced {}, orphaned {}, deleted {}, failed {}",
        report.inspected, report.referenced, report.orphaned, report.deleted, report.failed
    );
}

fn print_board_report(report: &BoardSweepReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!("== {} boards, {:?}{mode}", report.board_type, report.sweep);
    for outcome in &report.outcomes {
        println!("{}", outcome_line(outcome));
    }
    println!(
        "inspected {}, matched {}, deleted {}, failed {}",
        report.inspected, report.matched, report.deleted, report.failed
    );
}

fn print_cascade_report(report: &CascadeReport) {
    println!("== delete board {}", report.root_id);
    for outcome in &report.children {
        println!("{}", outcome_line(outcome));
    }
    println!(
        "board deleted: {}, children deleted {}, failed {}",
        report.deleted,
        report.deleted_children(),
        report.failed_children()
    );
}

fn print_integrity_report(report: &IntegrityReport) {
    println!("boards: {}, lessons: {}", report.boards, report.lessons);
    for kind in &report.kinds {
        println!(
            "{}: {} total, {} orphaned, {} held by another type",
            kind.kind, kind.total, kind.orphaned, kind.foreign_references
        );
    }
    println!("empty boards: {}", report.empty_boards.join(", "));
    println!(
        "grammar boards without lessons: {}",
        report.grammar_boards_without_lessons.join(", ")
    );
    println!("detached lessons: {}", report.detached_lessons.join(", "));
    println!("dangling references: {}", report.dangling.len());
    for dangling in &report.dangling {
        println!(
            "  {} {} lists missing {} {}",
            dangling.holder.kind, dangling.holder.id, dangling.holder.expects, dangling.item_id
        );
    }
}
