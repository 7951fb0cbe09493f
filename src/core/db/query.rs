/// Query Execution Module
///
/// This module provides the parameterized SQL helpers and the row mapping
/// they return. Helpers run on the calling thread's connection, opening a
/// temporary connection scope when none is active, so they can be used
/// bare or inside explicit connection/transaction scopes.

use crate::core::db::context::{with_conn, with_connection};
use crate::core::{LitormError, Result};
use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::Params;
use std::ops::Index;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A single result row: an ordered, name-addressable mapping from column
/// name to owned SQLite value.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    /// Builds a row from column/value pairs.
    ///
    /// This is the construction path for model `to_row` implementations;
    /// rows coming out of queries are built by the helpers themselves.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Row {
            columns: Arc::new(columns),
            values,
        }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value of a column, or `None` when the column is absent.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Converts a column to `T` on access.
    ///
    /// # Errors
    ///
    /// Returns `Query` when the column is absent or the value does not
    /// convert to `T`.
    pub fn get<T: FromSql>(&self, column: &str) -> Result<T> {
        let value = self
            .value(column)
            .ok_or_else(|| LitormError::Query(format!("no such column: {}", column)))?;
        T::column_result(ValueRef::from(value))
            .map_err(|e| LitormError::Query(format!("column '{}': {}", column, e)))
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, column: &str) -> &Value {
        match self.value(column) {
            Some(v) => v,
            None => panic!("no such column: {}", column),
        }
    }
}

/// Rewrites bare `?` placeholders to the driver's numbered `?N` form.
///
/// Markers inside single-quoted literals are left alone; doubled quotes
/// inside a literal keep the literal open, per SQL quoting rules.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0usize;
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('?');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

fn check_statement(sql: &str) -> Result<()> {
    if sql.trim().is_empty() {
        return Err(LitormError::Query(
            "cannot execute an empty SQL statement".to_string(),
        ));
    }
    Ok(())
}

fn log_timing(start: Instant, sql: &str) {
    let elapsed = start.elapsed();
    if elapsed > Duration::from_millis(100) {
        warn!("slow statement ({:?}): {}", elapsed, sql);
    } else {
        debug!("statement took {:?}: {}", elapsed, sql);
    }
}

/// Executes a query and returns every row.
///
/// # Arguments
///
/// * `sql` - A SELECT statement with bare `?` placeholders.
/// * `params` - Positional parameters, e.g. `["alice"]` or `rusqlite::params![..]`.
pub fn select<P: Params>(sql: &str, params: P) -> Result<Vec<Row>> {
    check_statement(sql)?;
    let rewritten = rewrite_placeholders(sql);
    let start = Instant::now();

    let result = with_connection(|| {
        with_conn(|conn| {
            let mut stmt = conn.prepare(&rewritten)?;
            let columns: Arc<Vec<String>> =
                Arc::new(stmt.column_names().into_iter().map(String::from).collect());
            let column_count = stmt.column_count();

            let mut out = Vec::new();
            let mut rows = stmt.query(params)?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(row.get::<_, Value>(i)?);
                }
                out.push(Row {
                    columns: Arc::clone(&columns),
                    values,
                });
            }
            Ok(out)
        })
    });

    log_timing(start, sql);
    result
}

/// Executes a query and returns the first row, if any.
pub fn select_one<P: Params>(sql: &str, params: P) -> Result<Option<Row>> {
    check_statement(sql)?;
    let rewritten = rewrite_placeholders(sql);
    let start = Instant::now();

    let result = with_connection(|| {
        with_conn(|conn| {
            let mut stmt = conn.prepare(&rewritten)?;
            let columns: Arc<Vec<String>> =
                Arc::new(stmt.column_names().into_iter().map(String::from).collect());
            let column_count = stmt.column_count();

            let mut rows = stmt.query(params)?;
            match rows.next()? {
                Some(row) => {
                    let mut values = Vec::with_capacity(column_count);
                    for i in 0..column_count {
                        values.push(row.get::<_, Value>(i)?);
                    }
                    Ok(Some(Row { columns, values }))
                }
                None => Ok(None),
            }
        })
    });

    log_timing(start, sql);
    result
}

/// Executes a query expected to produce exactly one value.
///
/// # Errors
///
/// Returns `Query` when the result has more than one column or no rows at
/// all; conversion failures also surface as `Query`.
pub fn select_scalar<T: FromSql, P: Params>(sql: &str, params: P) -> Result<T> {
    let row = select_one(sql, params)?
        .ok_or_else(|| LitormError::Query("expected one row, got none".to_string()))?;
    if row.len() != 1 {
        return Err(LitormError::Query(format!(
            "expected a single column, got {}",
            row.len()
        )));
    }
    let column = row.columns()[0].clone();
    row.get(&column)
}

/// Inserts one row built from column/value pairs.
///
/// Generates `INSERT INTO table (c1, c2) VALUES (?1, ?2)` and executes it,
/// returning the affected-row count.
pub fn insert(table: &str, values: &[(&str, Value)]) -> Result<usize> {
    if values.is_empty() {
        return Err(LitormError::Query(format!(
            "insert into '{}' requires at least one column",
            table
        )));
    }
    let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
    let markers: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        markers.join(", ")
    );

    let start = Instant::now();
    let result = with_connection(|| {
        with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let count = stmt.execute(rusqlite::params_from_iter(values.iter().map(|(_, v)| v)))?;
            Ok(count)
        })
    });
    log_timing(start, &sql);
    result
}

/// Executes an UPDATE or DELETE statement, returning the affected-row count.
///
/// Outside a transaction scope the connection is in autocommit mode, so the
/// change commits on its own. Inside one it joins the pending transaction
/// and follows its commit/rollback fate.
pub fn update<P: Params>(sql: &str, params: P) -> Result<usize> {
    run_statement(sql, params)
}

/// Executes any non-SELECT statement (DDL and the like).
///
/// Same commit rule as [`update`].
pub fn execute<P: Params>(sql: &str, params: P) -> Result<usize> {
    run_statement(sql, params)
}

fn run_statement<P: Params>(sql: &str, params: P) -> Result<usize> {
    check_statement(sql)?;
    let rewritten = rewrite_placeholders(sql);
    let start = Instant::now();

    let result = with_connection(|| {
        with_conn(|conn| {
            let mut stmt = conn.prepare(&rewritten)?;
            let count = stmt.execute(params)?;
            Ok(count)
        })
    });

    log_timing(start, sql);
    result
}
