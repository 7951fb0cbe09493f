// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;
pub mod orm;

#[cfg(test)]
mod test_support;

// Flat re-exports for the common call sites
pub use crate::config::{load_config, DbConfig};
pub use crate::core::db::context::{
    connection, has_active_scope, transaction, transaction_depth, with_connection,
    with_transaction, ConnectionScope, TransactionScope,
};
pub use crate::core::db::engine::{engine, init_engine, is_initialized, Engine};
pub use crate::core::db::query::{
    execute, insert, rewrite_placeholders, select, select_one, select_scalar, update, Row,
};
pub use crate::core::error::{LitormError, Result};
pub use crate::orm::{next_id, FieldDef, FieldDefault, Model, ModelSchema};
