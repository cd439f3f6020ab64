use std::process::ExitCode;
use std::sync::Arc;

use ielts_backend::config::Config;
use ielts_backend::db::DatabaseProxy;
use ielts_backend::logging::init_tracing;
use ielts_backend::services::board_integrity::IntegrityManager;
use ielts_backend::services::dictionary::DictionaryClient;
use ielts_backend::state::AppState;
use ielts_backend::workers::{WorkerManager, WorkerSettings};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let db_proxy = match DatabaseProxy::from_env().await {
        Ok(proxy) => Arc::new(proxy),
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            return ExitCode::FAILURE;
        }
    };
    let integrity = IntegrityManager::new(Arc::clone(&db_proxy));

    let worker_manager = match WorkerManager::new(integrity.clone(), WorkerSettings::from_env()).await {
        Ok(manager) => {
            if let Err(e) = manager.start().await {
                tracing::error!(error = %e, "failed to start workers");
            }
            Some(manager)
        }
        Err(e) => {
            tracing::warn!(error = %e, "worker manager not initialized");
            None
        }
    };

    let addr = config.bind_addr();
    let dictionary = DictionaryClient::new(config.dictionary_api_url.clone());
    let state = AppState::with_integrity(integrity, config, dictionary);
    let app = ielts_backend::create_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "ielts-backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let exit = match server.await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    };

    tracing::info!("HTTP server stopped, shutting down workers");
    if let Some(ref manager) = worker_manager {
        manager.stop().await;
    }
    tracing::info!("shutdown complete");
    exit
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
