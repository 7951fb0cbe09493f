/// Engine Module
///
/// This module owns the process-global database engine. The engine holds the
/// validated configuration and opens fresh driver connections on demand,
/// applying the configured pragmas to each one. Initializing the engine
/// performs no I/O; connections are opened lazily, one per thread, by the
/// scope guards in the context module.

use crate::config::DbConfig;
use crate::core::{LitormError, Result};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use tracing::{debug, info};

/// Global engine instance
///
/// Set exactly once by [`init_engine`]; read-only for the rest of the
/// process lifetime. It uses OnceCell so readers never need a lock.
static ENGINE: OnceCell<Engine> = OnceCell::new();

/// Connection factory configured once per process.
#[derive(Debug)]
pub struct Engine {
    config: DbConfig,
}

impl Engine {
    fn new(config: DbConfig) -> Self {
        Engine { config }
    }

    /// The configuration this engine was initialized with.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Opens a new driver connection and applies the configured pragmas.
    ///
    /// Called by the thread-local context the first time a thread touches
    /// the database inside a scope. Each call returns an independent
    /// connection; litorm never shares one across threads.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.config.path)?;

        conn.execute_batch(&format!(
            "
            PRAGMA foreign_keys = {};
            PRAGMA journal_mode = {};
            PRAGMA busy_timeout = {};
        ",
            if self.config.foreign_keys { "ON" } else { "OFF" },
            self.config.journal_mode,
            self.config.busy_timeout_ms,
        ))?;

        debug!("opened connection to {}", self.config.path);
        Ok(conn)
    }
}

/// Initializes the global engine with the given configuration.
///
/// Must be called once before any database operation. A second call fails
/// with an `Engine` error; the first configuration wins for the lifetime
/// of the process.
///
/// # Errors
///
/// Returns `LitormError::Engine` if the engine is already initialized.
pub fn init_engine(config: DbConfig) -> Result<()> {
    let path = config.path.clone();
    ENGINE
        .set(Engine::new(config))
        .map_err(|_| LitormError::Engine("engine is already initialized".to_string()))?;

    info!("initialized database engine for {}", path);
    Ok(())
}

/// Returns the global engine.
///
/// # Errors
///
/// Returns `LitormError::Engine` if [`init_engine`] has not been called.
pub fn engine() -> Result<&'static Engine> {
    ENGINE
        .get()
        .ok_or_else(|| LitormError::Engine("engine is not initialized".to_string()))
}

/// Checks whether the global engine has been initialized.
pub fn is_initialized() -> bool {
    ENGINE.get().is_some()
}
