/// ORM Module
///
/// A minimal object-relational mapping layer: declarative field metadata,
/// a validated per-type table mapping, and a `Model` trait supplying CRUD
/// on top of the SQL helpers.
pub mod field;
pub mod model;

pub use field::{next_id, FieldDef, FieldDefault};
pub use model::{Model, ModelSchema};
