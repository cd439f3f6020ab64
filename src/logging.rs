use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "ielts-backend.log";

/// Keeps the non-blocking file writer alive. Dropping it flushes and stops
/// file output.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub filter: String,
    pub file_dir: Option<PathBuf>,
}

impl LogOptions {
    pub fn from_env(log_level: &str) -> Self {
        let file_dir = parse_flag(std::env::var("ENABLE_FILE_LOGS").ok().as_deref())
            .then(|| {
                std::env::var("LOG_DIR")
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| "./logs".to_string())
            })
            .map(PathBuf::from);

        Self {
            filter: log_level.to_string(),
            file_dir,
        }
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    init_with(&LogOptions::from_env(log_level))
}

/// Stdout always; a daily-rotated file under `file_dir` when set. A file
/// directory that cannot be created degrades to stdout only.
pub fn init_with(options: &LogOptions) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&options.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    if let Some(dir) = &options.file_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer)
                    .init();
                return Some(FileLogGuard { _guard: guard });
            }
            Err(err) => eprintln!("failed to create log directory {}: {err}", dir.display()),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_truthy_values() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" 1 ")));
        assert!(parse_flag(Some("ON")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));
    }
}
