use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::db::DatabaseProxy;
use crate::services::board_integrity::IntegrityManager;
use crate::services::dictionary::DictionaryClient;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Arc<DatabaseProxy>,
    integrity: IntegrityManager,
    config: Arc<Config>,
    dictionary: Arc<DictionaryClient>,
}

impl AppState {
    pub fn new(db_proxy: Arc<DatabaseProxy>, config: Config) -> Self {
        let dictionary = DictionaryClient::new(config.dictionary_api_url.clone());
        Self::with_integrity(IntegrityManager::new(Arc::clone(&db_proxy)), config, dictionary)
    }

    /// Shares an existing manager, so the HTTP layer and background workers
    /// serialize against the same guard.
    pub fn with_integrity(
        integrity: IntegrityManager,
        config: Config,
        dictionary: DictionaryClient,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy: integrity.proxy_arc(),
            integrity,
            config: Arc::new(config),
            dictionary: Arc::new(dictionary),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Arc<DatabaseProxy> {
        Arc::clone(&self.db_proxy)
    }

    pub fn integrity(&self) -> &IntegrityManager {
        &self.integrity
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dictionary(&self) -> &DictionaryClient {
        &self.dictionary
    }
}
