/// Field Definition Module
///
/// This module defines the column metadata a model declares: name, DDL
/// fragment, primary-key flag, nullability, and which statements the column
/// participates in. Defaults may be constants or generator functions and are
/// resolved at insert time.

use chrono::Utc;
use rusqlite::types::Value;
use uuid::Uuid;

/// Default value declared on a field.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// A constant value bound as-is.
    Value(Value),
    /// A generator invoked once per resolution (ids, timestamps).
    Generator(fn() -> Value),
}

/// Metadata for one model column.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Database column name.
    pub name: &'static str,
    /// DDL fragment describing the column type, e.g. `"TEXT"` or `"REAL"`.
    pub ddl: &'static str,
    /// Whether this column is the model's primary key.
    pub primary_key: bool,
    /// Whether NULL is an acceptable stored value.
    pub nullable: bool,
    /// Whether UPDATE statements may touch this column.
    pub updatable: bool,
    /// Whether INSERT statements include this column.
    pub insertable: bool,
    /// Declared default, if any.
    pub default: Option<FieldDefault>,
}

impl FieldDef {
    /// Creates a field with the common flags: insertable, updatable,
    /// not nullable, not a primary key, no default.
    pub fn new(name: &'static str, ddl: &'static str) -> Self {
        FieldDef {
            name,
            ddl,
            primary_key: false,
            nullable: false,
            updatable: true,
            insertable: true,
            default: None,
        }
    }

    /// Marks the field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values in this column.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Excludes the column from UPDATE statements.
    pub fn not_updatable(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// Excludes the column from INSERT statements.
    pub fn not_insertable(mut self) -> Self {
        self.insertable = false;
        self
    }

    /// Declares a constant default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(FieldDefault::Value(value));
        self
    }

    /// Declares a generated default, invoked each time it is resolved.
    ///
    /// Generated defaults fire during `Model::insert` when the bound value
    /// is `Null` and the column is not nullable; the caller's struct is not
    /// written back, so callers who need the generated value (typically an
    /// id from [`next_id`]) should generate it at construction instead.
    pub fn with_default_fn(mut self, generator: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Generator(generator));
        self
    }

    /// Resolves the declared default to a concrete value, if any.
    pub fn resolve_default(&self) -> Option<Value> {
        match &self.default {
            Some(FieldDefault::Value(v)) => Some(v.clone()),
            Some(FieldDefault::Generator(f)) => Some(f()),
            None => None,
        }
    }
}

/// Generates a time-ordered unique id for text primary keys.
///
/// The id is a zero-padded millisecond timestamp followed by a uuid v4 in
/// simple form, 50 characters total, so lexical order tracks creation order.
pub fn next_id() -> String {
    format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}
