pub mod admin_auth;
pub mod board_integrity;
pub mod dictionary;
pub mod reconciliation;
