/// Error Module
///
/// This module defines the error types for the litorm crate. It provides
/// structured error handling with proper error propagation across the
/// engine, connection scope, query helper, and model mapping layers.
use thiserror::Error;

/// Error type covering every failure mode of the crate.
///
/// Driver failures pass through unchanged as `Database`; the remaining
/// variants describe misuse of the crate itself:
/// - Engine lifecycle (duplicate or missing initialization)
/// - Query helper contracts (scalar selects, empty statements)
/// - Model schema declarations (primary key rules, missing key values)
/// - Configuration loading
#[derive(Error, Debug)]
pub enum LitormError {
    /// Errors surfaced by the underlying SQLite driver
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Engine lifecycle errors (duplicate init, use before init)
    #[error("Engine error: {0}")]
    Engine(String),

    /// SQL helper contract violations (scalar shape, empty statements)
    #[error("Query error: {0}")]
    Query(String),

    /// Model mapping violations (primary key rules, missing key values)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result to use LitormError as the error type.
///
/// This provides a consistent error type across the entire crate
/// instead of using `Result<T, String>` or mixed error types.
pub type Result<T> = std::result::Result<T, LitormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let db_err = LitormError::Database(rusqlite::Error::ExecuteReturnedResults);
        assert!(db_err.to_string().contains("Database error"));

        let engine_err = LitormError::Engine("engine is already initialized".to_string());
        assert!(engine_err.to_string().contains("Engine error"));

        let schema_err = LitormError::Schema("primary key not defined".to_string());
        assert!(schema_err.to_string().contains("Schema error"));
    }

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let litorm_err: LitormError = io_err.into();
        match litorm_err {
            LitormError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        // Test driver error conversion
        let sql_err = rusqlite::Error::InvalidQuery;
        let litorm_err: LitormError = sql_err.into();
        match litorm_err {
            LitormError::Database(_) => {}
            _ => panic!("Expected Database error"),
        }
    }
}
