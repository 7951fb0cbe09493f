//! Shared helpers for the crate's unit tests.

use crate::config::DbConfig;
use crate::core::db::engine::init_engine;

/// Initializes the process-wide engine with an in-memory database.
///
/// Unit tests share one process, so only the first caller actually
/// initializes; every test thread still gets a private in-memory database
/// because connections are opened per thread.
pub fn ensure_test_engine() {
    let _ = init_engine(DbConfig::in_memory());
}
