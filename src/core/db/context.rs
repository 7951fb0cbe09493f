/// Connection Scope Module
///
/// This module provides thread-scoped connection management and transaction
/// demarcation. Each thread owns at most one driver connection, held in
/// thread-local state and opened lazily on first use. Scope guards control
/// the connection lifetime: the outermost scope on a thread opens the
/// context and closes the connection when it ends, while nested scopes
/// reuse whatever is already active.
///
/// Transactions nest cooperatively through a counter. `BEGIN` is issued when
/// the counter leaves zero and `COMMIT`/`ROLLBACK` when it returns to zero,
/// so only the outermost transaction scope ever touches the database.

use crate::core::db::engine::engine;
use crate::core::{LitormError, Result};
use rusqlite::Connection;
use std::cell::RefCell;
use std::marker::PhantomData;
use tracing::{debug, error};

/// Per-thread database context.
///
/// `initialized` tracks whether a connection scope is active on this thread;
/// the connection itself is only opened when a statement actually runs.
struct DbContext {
    initialized: bool,
    connection: Option<Connection>,
    transactions: u32,
}

impl DbContext {
    const fn new() -> Self {
        DbContext {
            initialized: false,
            connection: None,
            transactions: 0,
        }
    }

    fn init(&mut self) {
        debug!("opening lazy connection context");
        self.initialized = true;
        self.transactions = 0;
    }

    fn cleanup(&mut self) {
        if let Some(conn) = self.connection.take() {
            drop(conn);
            debug!("closed thread connection");
        }
        self.initialized = false;
        self.transactions = 0;
    }

    /// Returns the thread's connection, opening it through the engine on
    /// first use.
    fn acquire(&mut self) -> Result<&Connection> {
        if !self.initialized {
            return Err(LitormError::Engine(
                "no active connection scope on this thread".to_string(),
            ));
        }
        if self.connection.is_none() {
            self.connection = Some(engine()?.connect()?);
        }
        self.connection
            .as_ref()
            .ok_or_else(|| LitormError::Engine("connection unavailable".to_string()))
    }
}

thread_local! {
    static DB_CTX: RefCell<DbContext> = RefCell::new(DbContext::new());
}

/// Runs `f` against the calling thread's connection.
///
/// The borrow of the thread-local context is held for the duration of `f`,
/// so `f` must not re-enter scope management. Query helpers are the only
/// callers and they treat the connection as a leaf resource.
pub(crate) fn with_conn<T, F>(f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    DB_CTX.with(|cell| {
        let mut ctx = cell.borrow_mut();
        let conn = ctx.acquire()?;
        f(conn)
    })
}

/// RAII guard for a connection scope on the calling thread.
///
/// The guard that found the context uninitialized is responsible for tearing
/// it down; nested guards are no-ops on drop. Obtained from [`connection`].
#[derive(Debug)]
pub struct ConnectionScope {
    should_cleanup: bool,
    // Ties the guard to the thread whose context it manages.
    _not_send: PhantomData<*const ()>,
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        if self.should_cleanup {
            DB_CTX.with(|cell| cell.borrow_mut().cleanup());
        }
    }
}

/// Opens a connection scope on the calling thread.
///
/// No connection is opened yet; the first statement executed inside the
/// scope opens it through the engine. Holding the returned guard keeps the
/// thread's connection alive across nested scopes.
///
/// ```no_run
/// # fn demo() -> litorm::Result<()> {
/// let _scope = litorm::connection();
/// let _rows = litorm::select("SELECT id, name FROM user", [])?;
/// # Ok(())
/// # }
/// ```
pub fn connection() -> ConnectionScope {
    DB_CTX.with(|cell| {
        let mut ctx = cell.borrow_mut();
        let should_cleanup = !ctx.initialized;
        if should_cleanup {
            ctx.init();
        }
        ConnectionScope {
            should_cleanup,
            _not_send: PhantomData,
        }
    })
}

/// RAII guard for a transaction scope on the calling thread.
///
/// Dropping the guard without calling [`TransactionScope::commit`] rolls the
/// transaction back once the outermost scope ends. Obtained from
/// [`transaction`].
#[derive(Debug)]
pub struct TransactionScope {
    finished: bool,
    conn_cleanup: bool,
    _not_send: PhantomData<*const ()>,
}

impl TransactionScope {
    fn enter() -> Result<Self> {
        DB_CTX.with(|cell| {
            let mut ctx = cell.borrow_mut();
            let conn_cleanup = !ctx.initialized;
            if conn_cleanup {
                ctx.init();
            }

            if ctx.transactions == 0 {
                let begun = ctx
                    .acquire()
                    .and_then(|conn| conn.execute_batch("BEGIN").map_err(Into::into));
                if let Err(e) = begun {
                    if conn_cleanup {
                        ctx.cleanup();
                    }
                    return Err(e);
                }
                debug!("transaction started");
            }
            ctx.transactions += 1;

            Ok(TransactionScope {
                finished: false,
                conn_cleanup,
                _not_send: PhantomData,
            })
        })
    }

    /// Commits the transaction scope.
    ///
    /// Only the transition back to zero nesting depth issues `COMMIT`;
    /// committing an inner scope merely records that it finished cleanly.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        DB_CTX.with(|cell| {
            let mut ctx = cell.borrow_mut();
            ctx.transactions -= 1;
            if ctx.transactions == 0 {
                let conn = ctx.acquire()?;
                conn.execute_batch("COMMIT")?;
                debug!("transaction committed");
            }
            Ok(())
        })
        // The guard still drops after this returns; `finished` keeps the
        // drop from rolling back, and connection cleanup happens there.
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        DB_CTX.with(|cell| {
            let mut ctx = cell.borrow_mut();
            if !self.finished {
                ctx.transactions -= 1;
                if ctx.transactions == 0 {
                    match ctx.acquire() {
                        Ok(conn) => {
                            if let Err(e) = conn.execute_batch("ROLLBACK") {
                                error!("rollback failed: {}", e);
                            } else {
                                debug!("transaction rolled back");
                            }
                        }
                        Err(e) => error!("rollback skipped, no connection: {}", e),
                    }
                }
            }
            if self.conn_cleanup {
                ctx.cleanup();
            }
        });
    }
}

/// Opens a transaction scope on the calling thread.
///
/// Entering the outermost scope issues `BEGIN`; nested scopes only bump the
/// nesting counter. Call [`TransactionScope::commit`] to finish cleanly, or
/// drop the guard to roll back.
pub fn transaction() -> Result<TransactionScope> {
    TransactionScope::enter()
}

/// Runs `f` inside a connection scope.
///
/// The functional counterpart of [`connection`]: the scope opens before `f`
/// and closes when `f` returns, unless an outer scope is already active on
/// this thread.
pub fn with_connection<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _scope = connection();
    f()
}

/// Runs `f` inside a transaction scope.
///
/// Commits when `f` returns `Ok` and the scope is outermost; rolls back and
/// re-returns the original error when `f` fails.
pub fn with_transaction<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let scope = transaction()?;
    match f() {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(e) => {
            drop(scope);
            Err(e)
        }
    }
}

/// Current transaction nesting depth on the calling thread.
pub fn transaction_depth() -> u32 {
    DB_CTX.with(|cell| cell.borrow().transactions)
}

/// Whether a connection scope is active on the calling thread.
pub fn has_active_scope() -> bool {
    DB_CTX.with(|cell| cell.borrow().initialized)
}
