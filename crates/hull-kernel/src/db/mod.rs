//! Parameterized database capability backed by `SQLite`.
//!
//! Scripts never see SQL connection handles or raw result buffers.
//! They issue parameterized statements through [`Database::query`] and
//! [`Database::exec`], with the tagged [`Value`] union as the only
//! representation crossing the boundary in either direction.
//!
//! # Statement cache
//!
//! Each connection carries a bounded prepared-statement cache keyed by
//! exact SQL text ([`STATEMENT_CACHE_CAPACITY`] entries). A cache hit
//! reuses the compiled statement with its bindings cleared; a miss at
//! capacity evicts the least-recently-used entry before inserting the
//! new statement. This bounds the number of live prepared statements
//! regardless of how many distinct queries an application issues.
//!
//! # Transaction hygiene
//!
//! One long-lived connection is reused across many independent,
//! sequentially dispatched requests. If a request dies partway
//! through an explicit transaction, the connection would otherwise
//! carry that open transaction into the next request;
//! [`Database::guard_stale_transaction`] detects the condition via the
//! autocommit flag and forces a rollback before the next request
//! proceeds.
//!
//! The capability performs no internal locking: a [`Database`] must be
//! paired 1:1 with its application instance and driven from one
//! request at a time.

mod value;

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags};

pub use value::Value;

use crate::Denied;

/// Capacity of the per-connection prepared-statement cache.
pub const STATEMENT_CACHE_CAPACITY: usize = 32;

/// One-time connection setup: WAL journaling, relaxed-but-durable
/// sync, foreign-key enforcement, enlarged page cache, in-memory temp
/// storage, a memory-map window, and an explicit WAL auto-checkpoint
/// interval.
const INIT_PRAGMAS: &str = r"
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA cache_size = -8192;
    PRAGMA temp_store = MEMORY;
    PRAGMA mmap_size = 134217728;
    PRAGMA wal_autocheckpoint = 1000;
";

/// Busy timeout applied to every connection.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// A single application-scoped `SQLite` connection with its statement
/// cache.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the application database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if the database cannot be opened or
    /// initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Denied> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            tracing::warn!(%err, "db: open failed");
            Denied
        })?;
        Self::initialize(conn)
    }

    /// Opens an in-memory database (used by hosts for ephemeral state
    /// and by tests).
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if initialization fails.
    pub fn open_in_memory() -> Result<Self, Denied> {
        let conn = Connection::open_in_memory().map_err(|err| {
            tracing::warn!(%err, "db: in-memory open failed");
            Denied
        })?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, Denied> {
        conn.execute_batch(INIT_PRAGMAS).map_err(|err| {
            tracing::warn!(%err, "db: pragma initialization failed");
            Denied
        })?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(|err| {
            tracing::warn!(%err, "db: busy timeout setup failed");
            Denied
        })?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        Ok(Self { conn })
    }

    /// Runs a row-producing statement, invoking `on_row` once per row.
    ///
    /// The callback receives column values borrowed from the current
    /// row; nothing is allocated per row beyond the one column-name
    /// vector per query. Returning [`ControlFlow::Break`] stops
    /// iteration early and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if the statement cannot be prepared, a
    /// parameter cannot be bound, or row iteration fails.
    pub fn query(
        &mut self,
        sql: &str,
        params: &[Value<'_>],
        mut on_row: impl FnMut(&ResultRow<'_, '_>) -> ControlFlow<()>,
    ) -> Result<(), Denied> {
        let mut stmt = self.conn.prepare_cached(sql).map_err(|err| {
            tracing::warn!(%err, "db: prepare failed");
            Denied
        })?;
        let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|err| {
                tracing::warn!(%err, "db: bind failed");
                Denied
            })?;

        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => return Ok(()),
                Err(err) => {
                    tracing::warn!(%err, "db: row step failed");
                    return Err(Denied);
                },
            };
            let wrapped = ResultRow {
                row,
                columns: &columns,
            };
            if on_row(&wrapped).is_break() {
                return Ok(());
            }
        }
    }

    /// Runs a non-row-producing statement and returns the number of
    /// rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] on prepare, bind, or execution failure, and
    /// for statements that do produce rows.
    pub fn exec(&mut self, sql: &str, params: &[Value<'_>]) -> Result<u64, Denied> {
        let mut stmt = self.conn.prepare_cached(sql).map_err(|err| {
            tracing::warn!(%err, "db: prepare failed");
            Denied
        })?;
        let affected = stmt
            .execute(params_from_iter(params.iter()))
            .map_err(|err| {
                tracing::warn!(%err, "db: execute failed");
                Denied
            })?;
        Ok(affected as u64)
    }

    /// Row ID of the most recent successful insert on this connection.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Opens an explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if a transaction is already open or the
    /// statement fails.
    pub fn begin(&mut self) -> Result<(), Denied> {
        self.conn.execute_batch("BEGIN").map_err(|err| {
            tracing::warn!(%err, "db: BEGIN failed");
            Denied
        })
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if no transaction is open or the commit
    /// fails.
    pub fn commit(&mut self) -> Result<(), Denied> {
        self.conn.execute_batch("COMMIT").map_err(|err| {
            tracing::warn!(%err, "db: COMMIT failed");
            Denied
        })
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if no transaction is open or the rollback
    /// fails.
    pub fn rollback(&mut self) -> Result<(), Denied> {
        self.conn.execute_batch("ROLLBACK").map_err(|err| {
            tracing::warn!(%err, "db: ROLLBACK failed");
            Denied
        })
    }

    /// Whether an explicit transaction is currently open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Rolls back a transaction left open by a previous request.
    ///
    /// A request that errored or crashed mid-transaction leaves the
    /// connection outside autocommit; the next request must not start
    /// inside someone else's half-finished transaction. Call this at
    /// the top of every request dispatch.
    pub fn guard_stale_transaction(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        tracing::warn!("db: rolling back stale transaction from a previous request");
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(%err, "db: stale transaction rollback failed");
        }
    }

    /// Shuts the connection down: `PRAGMA optimize`, a truncating WAL
    /// checkpoint, then close.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] if the connection cannot be closed cleanly.
    pub fn close(self) -> Result<(), Denied> {
        if let Err(err) = self.conn.execute_batch(
            "PRAGMA optimize;
             PRAGMA wal_checkpoint(TRUNCATE);",
        ) {
            tracing::warn!(%err, "db: shutdown pragmas failed");
        }
        self.conn.close().map_err(|(_, err)| {
            tracing::warn!(%err, "db: close failed");
            Denied
        })
    }
}

/// One result row, lent to the query callback.
///
/// Column values are borrowed from the underlying row and are valid
/// only for the duration of the callback invocation.
pub struct ResultRow<'a, 'stmt> {
    row: &'a rusqlite::Row<'stmt>,
    columns: &'a [String],
}

impl ResultRow<'_, '_> {
    /// Number of columns in the result set.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Name of column `index`, if in range.
    #[must_use]
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Value of column `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Denied`] for an out-of-range index or non-UTF-8 text.
    pub fn get(&self, index: usize) -> Result<Value<'_>, Denied> {
        let raw: ValueRef<'_> = self.row.get_ref(index).map_err(|err| {
            tracing::warn!(index, %err, "db: column read failed");
            Denied
        })?;
        Value::try_from(raw).map_err(|err| {
            tracing::warn!(index, %err, "db: non-UTF-8 text column");
            Denied
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> Database {
        let mut db = Database::open_in_memory().expect("open");
        db.exec(
            "CREATE TABLE kv (id INTEGER PRIMARY KEY, k TEXT, v BLOB, score REAL, done INTEGER)",
            &[],
        )
        .expect("create table");
        db
    }

    #[test]
    fn binds_every_value_variant() {
        let mut db = scratch();
        let affected = db
            .exec(
                "INSERT INTO kv (k, v, score, done) VALUES (?1, ?2, ?3, ?4)",
                &[
                    Value::Text("alpha"),
                    Value::Blob(&[0xde, 0xad]),
                    Value::Double(0.75),
                    Value::Bool(true),
                ],
            )
            .expect("insert");
        assert_eq!(affected, 1);

        db.exec(
            "INSERT INTO kv (k, v, score, done) VALUES (?1, ?2, ?3, ?4)",
            &[Value::Nil, Value::Nil, Value::Int(3), Value::Bool(false)],
        )
        .expect("insert nils");

        let mut rows = Vec::new();
        db.query(
            "SELECT k, v, score, done FROM kv ORDER BY id",
            &[],
            |row| {
                let k = match row.get(0).expect("k") {
                    Value::Text(s) => Some(s.to_string()),
                    Value::Nil => None,
                    other => panic!("unexpected k: {}", other.type_name()),
                };
                let done = match row.get(3).expect("done") {
                    Value::Int(i) => i,
                    other => panic!("unexpected done: {}", other.type_name()),
                };
                rows.push((k, done));
                ControlFlow::Continue(())
            },
        )
        .expect("query");

        assert_eq!(
            rows,
            vec![(Some("alpha".to_string()), 1), (None, 0)]
        );
    }

    #[test]
    fn callback_can_stop_early_without_error() {
        let mut db = scratch();
        for i in 0..10 {
            db.exec("INSERT INTO kv (done) VALUES (?1)", &[Value::Int(i)])
                .expect("insert");
        }

        let mut seen = 0;
        db.query("SELECT done FROM kv ORDER BY id", &[], |_row| {
            seen += 1;
            if seen == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .expect("query");
        assert_eq!(seen, 3);
    }

    #[test]
    fn column_names_are_exposed() {
        let mut db = scratch();
        db.exec("INSERT INTO kv (k) VALUES ('x')", &[]).expect("insert");
        db.query("SELECT k AS label, id FROM kv", &[], |row| {
            assert_eq!(row.column_count(), 2);
            assert_eq!(row.column_name(0), Some("label"));
            assert_eq!(row.column_name(1), Some("id"));
            assert_eq!(row.column_name(2), None);
            ControlFlow::Continue(())
        })
        .expect("query");
    }

    #[test]
    fn last_insert_id_tracks_rowid() {
        let mut db = scratch();
        db.exec("INSERT INTO kv (k) VALUES ('a')", &[]).expect("insert");
        let first = db.last_insert_id();
        db.exec("INSERT INTO kv (k) VALUES ('b')", &[]).expect("insert");
        assert_eq!(db.last_insert_id(), first + 1);
    }

    #[test]
    fn transactions_commit_and_roll_back() {
        let mut db = scratch();

        db.begin().expect("begin");
        db.exec("INSERT INTO kv (k) VALUES ('kept')", &[]).expect("insert");
        db.commit().expect("commit");

        db.begin().expect("begin");
        db.exec("INSERT INTO kv (k) VALUES ('dropped')", &[])
            .expect("insert");
        db.rollback().expect("rollback");

        let mut count = 0;
        db.query("SELECT k FROM kv", &[], |row| {
            assert!(matches!(row.get(0), Ok(Value::Text("kept"))));
            count += 1;
            ControlFlow::Continue(())
        })
        .expect("query");
        assert_eq!(count, 1);
    }

    #[test]
    fn stale_transaction_guard_forces_rollback() {
        let mut db = scratch();

        // Simulate a request that died mid-transaction.
        db.begin().expect("begin");
        db.exec("INSERT INTO kv (k) VALUES ('orphan')", &[])
            .expect("insert");
        assert!(db.in_transaction());

        // Next request starts here.
        db.guard_stale_transaction();
        assert!(!db.in_transaction());

        let mut count = 0;
        db.query("SELECT COUNT(*) FROM kv", &[], |row| {
            count = match row.get(0) {
                Ok(Value::Int(n)) => n,
                _ => panic!("count should be an integer"),
            };
            ControlFlow::Continue(())
        })
        .expect("query");
        assert_eq!(count, 0, "orphaned insert must be rolled back");
    }

    #[test]
    fn guard_is_a_noop_in_autocommit() {
        let mut db = scratch();
        db.guard_stale_transaction();
        assert!(!db.in_transaction());
    }

    #[test]
    fn cache_survives_eviction_pressure() {
        // Issue more distinct statements than the cache holds; evicted
        // statements are transparently recompiled on reuse.
        let mut db = scratch();
        for i in 0..=STATEMENT_CACHE_CAPACITY {
            let sql = format!("INSERT INTO kv (done) VALUES ({i})");
            db.exec(&sql, &[]).expect("insert");
        }
        // The first statement was the LRU entry and is gone from the
        // cache; re-running it must still work.
        db.exec("INSERT INTO kv (done) VALUES (0)", &[]).expect("reuse");

        let mut count = 0i64;
        db.query("SELECT COUNT(*) FROM kv", &[], |row| {
            if let Ok(Value::Int(n)) = row.get(0) {
                count = n;
            }
            ControlFlow::Continue(())
        })
        .expect("query");
        assert_eq!(count as usize, STATEMENT_CACHE_CAPACITY + 2);
    }

    #[test]
    fn cached_statement_reuse_does_not_leak_bindings() {
        let mut db = scratch();
        db.exec(
            "INSERT INTO kv (k, v) VALUES (?1, ?2)",
            &[Value::Text("first"), Value::Blob(b"one")],
        )
        .expect("insert");
        // Same SQL text, different parameters: the cached statement's
        // previous bindings must not bleed into this call.
        db.exec(
            "INSERT INTO kv (k, v) VALUES (?1, ?2)",
            &[Value::Text("second"), Value::Nil],
        )
        .expect("insert");

        let mut rows = Vec::new();
        db.query("SELECT k, v FROM kv ORDER BY id", &[], |row| {
            let k = match row.get(0) {
                Ok(Value::Text(s)) => s.to_string(),
                _ => panic!("k should be text"),
            };
            let v_is_nil = matches!(row.get(1), Ok(Value::Nil));
            rows.push((k, v_is_nil));
            ControlFlow::Continue(())
        })
        .expect("query");

        assert_eq!(
            rows,
            vec![("first".to_string(), false), ("second".to_string(), true)]
        );
    }

    #[test]
    fn malformed_sql_is_denied() {
        let mut db = scratch();
        assert_eq!(db.exec("INSERT INTO nowhere", &[]), Err(Denied));
        assert_eq!(
            db.query("SELECT * FROM nowhere", &[], |_| ControlFlow::Continue(())),
            Err(Denied)
        );
    }

    #[test]
    fn close_runs_clean() {
        let db = scratch();
        db.close().expect("close");
    }
}
