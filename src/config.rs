use crate::core::{LitormError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Database engine configuration, parsed from a TOML file or built in code.
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    /// Path to the SQLite database file, or ":memory:" for a private
    /// in-memory database per connection.
    pub path: String,
    /// Enforce foreign key constraints on every connection.
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
    /// Journal mode pragma. WAL is only meaningful for file databases.
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

fn default_foreign_keys() -> bool {
    true
}

fn default_journal_mode() -> String {
    "WAL".to_string()
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

impl DbConfig {
    /// Creates a configuration for a file database with default pragmas.
    pub fn new(path: impl Into<String>) -> Self {
        DbConfig {
            path: path.into(),
            foreign_keys: default_foreign_keys(),
            journal_mode: default_journal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Creates a configuration for an in-memory database.
    ///
    /// In-memory databases are private to each connection, which means
    /// private to each thread under litorm's connection model.
    pub fn in_memory() -> Self {
        DbConfig {
            journal_mode: "MEMORY".to_string(),
            ..DbConfig::new(":memory:")
        }
    }

    /// Whether this configuration points at an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig::in_memory()
    }
}

/// Loads engine configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = litorm::config::load_config("litorm.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DbConfig> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| LitormError::Config(e.to_string()))
}
