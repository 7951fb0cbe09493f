/// Database Module
///
/// This module provides the core database functionality for litorm,
/// organized into focused submodules:
/// - **Engine** (`engine.rs`): The process-global connection factory and its
///   one-shot initialization.
/// - **Context** (`context.rs`): Thread-local connection state, scope guards,
///   and transaction nesting.
/// - **Query Execution** (`query.rs`): Parameterized SQL helpers and row
///   mapping.
///
/// All operations use the standardized `LitormError` type for consistent
/// error propagation.
pub mod context;
pub mod engine;
pub mod query;

pub use context::*;
pub use engine::*;
pub use query::*;
