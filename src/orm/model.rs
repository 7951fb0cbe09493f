/// Model Mapping Module
///
/// This module maps declarative field lists onto tables. A `ModelSchema` is
/// computed once per model type and validated at construction: exactly one
/// primary key, coerced to non-updatable and non-nullable. The `Model` trait
/// supplies CRUD on top of the query helpers, so model operations follow the
/// same thread-scope and transaction rules as raw SQL.

use crate::core::db::query::{self, Row};
use crate::core::{LitormError, Result};
use crate::orm::field::FieldDef;
use rusqlite::types::Value;
use rusqlite::Params;
use tracing::{debug, warn};

/// Table mapping for one model type: table name, ordered columns, and the
/// primary key.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    table: String,
    fields: Vec<FieldDef>,
    primary_key: usize,
}

impl ModelSchema {
    /// Builds and validates a table mapping.
    ///
    /// A primary key declared updatable or nullable is coerced with a
    /// warning, matching how the mapping treats keys everywhere else.
    ///
    /// # Errors
    ///
    /// Returns `Schema` when no field or more than one field is marked as
    /// the primary key.
    pub fn new(table: impl Into<String>, fields: Vec<FieldDef>) -> Result<Self> {
        let table = table.into();
        let mut fields = fields;
        let mut primary_key: Option<usize> = None;

        for (i, field) in fields.iter_mut().enumerate() {
            if !field.primary_key {
                continue;
            }
            if primary_key.is_some() {
                return Err(LitormError::Schema(format!(
                    "cannot define more than one primary key for table '{}'",
                    table
                )));
            }
            if field.updatable {
                warn!("coercing primary key '{}' to non-updatable", field.name);
                field.updatable = false;
            }
            if field.nullable {
                warn!("coercing primary key '{}' to non-nullable", field.name);
                field.nullable = false;
            }
            primary_key = Some(i);
        }

        let primary_key = primary_key.ok_or_else(|| {
            LitormError::Schema(format!("primary key not defined for table '{}'", table))
        })?;

        debug!("mapped table '{}' with {} columns", table, fields.len());
        Ok(ModelSchema {
            table,
            fields,
            primary_key,
        })
    }

    /// The mapped table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All column definitions in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// The primary key column.
    pub fn primary_key(&self) -> &FieldDef {
        &self.fields[self.primary_key]
    }

    /// Looks up a column by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Comma-separated column list for SELECT statements.
    pub fn column_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generates `CREATE TABLE IF NOT EXISTS` DDL from the field fragments.
    pub fn create_table_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                let mut line = format!("    {} {}", f.name, f.ddl);
                if !f.nullable && !f.ddl.to_uppercase().contains("NOT NULL") {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect();
        lines.push(format!("    PRIMARY KEY ({})", self.primary_key().name));

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.table,
            lines.join(",\n")
        )
    }
}

/// A type mapped to a table.
///
/// Implementors provide the schema (built once, typically in a
/// `once_cell::sync::Lazy` static) and the row conversions; everything else
/// comes as provided methods built on the query helpers.
pub trait Model: Sized {
    /// The table mapping for this type, computed once.
    fn schema() -> &'static ModelSchema;

    /// Builds an instance from a result row.
    fn from_row(row: &Row) -> Result<Self>;

    /// Renders the instance as column/value pairs.
    fn to_row(&self) -> Row;

    /// Fetches the row with the given primary key value.
    fn get(pk: impl Into<Value>) -> Result<Option<Self>> {
        let schema = Self::schema();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            schema.column_list(),
            schema.table(),
            schema.primary_key().name
        );
        match query::select_one(&sql, [pk.into()])? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Fetches the first row matching `cond` (SQL after `WHERE`), if any.
    fn find_first<P: Params>(cond: &str, params: P) -> Result<Option<Self>> {
        let schema = Self::schema();
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            schema.column_list(),
            schema.table(),
            cond
        );
        match query::select_one(&sql, params)? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Fetches every row matching `cond` (SQL after `WHERE`).
    fn find_by<P: Params>(cond: &str, params: P) -> Result<Vec<Self>> {
        let schema = Self::schema();
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            schema.column_list(),
            schema.table(),
            cond
        );
        query::select(&sql, params)?
            .iter()
            .map(Self::from_row)
            .collect()
    }

    /// Fetches every row of the table.
    fn find_all() -> Result<Vec<Self>> {
        let schema = Self::schema();
        let sql = format!("SELECT {} FROM {}", schema.column_list(), schema.table());
        query::select(&sql, [])?.iter().map(Self::from_row).collect()
    }

    /// Counts every row of the table.
    fn count_all() -> Result<i64> {
        let schema = Self::schema();
        query::select_scalar(&format!("SELECT COUNT(*) FROM {}", schema.table()), [])
    }

    /// Counts rows matching `cond` (SQL after `WHERE`).
    fn count_by<P: Params>(cond: &str, params: P) -> Result<i64> {
        let schema = Self::schema();
        query::select_scalar(
            &format!("SELECT COUNT(*) FROM {} WHERE {}", schema.table(), cond),
            params,
        )
    }

    /// Inserts this instance, binding insertable columns only.
    ///
    /// A `Null` value for a non-nullable column with a declared default is
    /// replaced by the resolved default before binding.
    fn insert(&self) -> Result<usize> {
        let schema = Self::schema();
        let row = self.to_row();
        let mut values: Vec<(&str, Value)> = Vec::new();
        for field in schema.fields().iter().filter(|f| f.insertable) {
            let mut value = row.value(field.name).cloned().unwrap_or(Value::Null);
            if matches!(value, Value::Null) && !field.nullable {
                if let Some(default) = field.resolve_default() {
                    value = default;
                }
            }
            values.push((field.name, value));
        }
        query::insert(schema.table(), &values)
    }

    /// Updates this instance's row, binding updatable columns keyed by the
    /// primary key value.
    fn update(&self) -> Result<usize> {
        let schema = Self::schema();
        let row = self.to_row();
        let pk_value = primary_key_value(schema, &row)?;

        let updatable: Vec<&FieldDef> = schema.fields().iter().filter(|f| f.updatable).collect();
        if updatable.is_empty() {
            return Err(LitormError::Schema(format!(
                "no updatable columns on table '{}'",
                schema.table()
            )));
        }

        let assignments: Vec<String> = updatable.iter().map(|f| format!("{} = ?", f.name)).collect();
        let mut params: Vec<Value> = updatable
            .iter()
            .map(|f| row.value(f.name).cloned().unwrap_or(Value::Null))
            .collect();
        params.push(pk_value);

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            schema.table(),
            assignments.join(", "),
            schema.primary_key().name
        );
        query::update(&sql, rusqlite::params_from_iter(params))
    }

    /// Deletes this instance's row, keyed by the primary key value.
    fn delete(&self) -> Result<usize> {
        let schema = Self::schema();
        let row = self.to_row();
        let pk_value = primary_key_value(schema, &row)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            schema.table(),
            schema.primary_key().name
        );
        query::update(&sql, [pk_value])
    }
}

fn primary_key_value(schema: &ModelSchema, row: &Row) -> Result<Value> {
    let pk = schema.primary_key();
    row.value(pk.name)
        .cloned()
        .filter(|v| !matches!(v, Value::Null))
        .ok_or_else(|| {
            LitormError::Schema(format!("row has no value for primary key '{}'", pk.name))
        })
}
