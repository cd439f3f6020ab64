#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use ielts_backend::config::{AdminConfig, AdminCredential, Config};
use ielts_backend::db::operations::{
    boards, expressions, grammar, lessons, vocabulary, Board, BoardType, NewBoard, NewExpression,
    NewGrammar, NewLesson, NewVocabulary,
};
use ielts_backend::db::DatabaseProxy;
use ielts_backend::services::board_integrity::IntegrityManager;
use ielts_backend::state::AppState;

pub const ADMIN_USER: &str = "editor";
pub const ADMIN_PASS: &str = "letmein";
pub const SESSION_SECRET: &str = "test-session-secret";

pub async fn proxy() -> Arc<DatabaseProxy> {
    Arc::new(DatabaseProxy::in_memory().await.unwrap())
}

pub async fn manager() -> IntegrityManager {
    IntegrityManager::new(proxy().await)
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        log_level: "warn".to_string(),
        admin: AdminConfig {
            credentials: vec![AdminCredential {
                username: ADMIN_USER.to_string(),
                password: ADMIN_PASS.to_string(),
            }],
            session_secret: SESSION_SECRET.to_string(),
            session_ttl: Duration::from_secs(3600),
        },
        // Nothing listens here; lookups fail fast.
        dictionary_api_url: "http://127.0.0.1:9".to_string(),
    }
}

pub async fn create_test_app() -> (Router, IntegrityManager) {
    let proxy = proxy().await;
    let state = AppState::new(Arc::clone(&proxy), test_config());
    let manager = state.integrity().clone();
    (ielts_backend::create_app(state), manager)
}

pub async fn board(
    proxy: &DatabaseProxy,
    id: &str,
    board_type: BoardType,
    item_ids: &[&str],
) -> Board {
    boards::insert_board(
        proxy,
        NewBoard {
            id: Some(id.to_string()),
            name: format!("Board {id}"),
            board_type,
            description: None,
            color: None,
            icon: None,
            item_ids: item_ids.iter().map(|s| s.to_string()).collect(),
            order: 0,
        },
    )
    .await
    .unwrap()
}

pub async fn lesson(proxy: &DatabaseProxy, id: &str, board_id: &str, item_ids: &[&str]) {
    lessons::insert_lesson(
        proxy,
        NewLesson {
            id: Some(id.to_string()),
            board_id: board_id.to_string(),
            title: format!("Lesson {id}"),
            description: None,
            order: 0,
            item_ids: item_ids.iter().map(|s| s.to_string()).collect(),
        },
    )
    .await
    .unwrap();
}

pub async fn vocab(proxy: &DatabaseProxy, id: &str) {
    vocabulary::insert_vocabulary(
        proxy,
        NewVocabulary {
            id: Some(id.to_string()),
            word: format!("word-{id}"),
            phonetic: None,
            meanings: Vec::new(),
            topics: Vec::new(),
        },
    )
    .await
    .unwrap();
}

pub async fn expression(proxy: &DatabaseProxy, id: &str) {
    expressions::insert_expression(
        proxy,
        NewExpression {
            id: Some(id.to_string()),
            expression: format!("expr-{id}"),
            expression_type: None,
            meaning: "meaning".to_string(),
            examples: Vec::new(),
            topics: Vec::new(),
        },
    )
    .await
    .unwrap();
}

pub async fn grammar_item(proxy: &DatabaseProxy, id: &str) {
    grammar::insert_grammar(
        proxy,
        NewGrammar {
            id: Some(id.to_string()),
            title: format!("grammar-{id}"),
            structure: String::new(),
            explanation: String::new(),
            examples: Vec::new(),
            level: None,
        },
    )
    .await
    .unwrap();
}
