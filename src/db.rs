use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Rows};

use crate::config::Configuration;
use crate::error::RepoError;

/// Serialized connection facade.
///
/// One logical SQLite connection shared by every repository over a
/// session; all statement execution funnels through the mutex. SQL text
/// goes through a trivial normalization that strips a single trailing
/// statement terminator before execution.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open a file-backed database with the usual pragmas.
    pub fn open<P: AsRef<Path>>(path: P, config: &Configuration) -> Result<Self, RepoError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(config: &Configuration) -> Result<Self, RepoError> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a write statement, returning the affected-row count.
    pub fn execute_update(&self, sql: &str, params: &[Value]) -> Result<usize, RepoError> {
        let conn = self.conn();
        let affected = conn.execute(normalize(sql), params_from_iter(params.iter()))?;
        Ok(affected)
    }

    /// Execute an insert, returning the affected-row count and the
    /// generated rowid. Callers check the count before trusting the key.
    pub fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<(usize, i64), RepoError> {
        let conn = self.conn();
        let affected = conn.execute(normalize(sql), params_from_iter(params.iter()))?;
        Ok((affected, conn.last_insert_rowid()))
    }

    /// Run a parameterized query and hand the row cursor to `f`.
    ///
    /// The connection stays locked for the duration of `f`, so `f` must
    /// not call back into this facade; snapshot the rows and return.
    pub fn with_rows<T>(
        &self,
        sql: &str,
        params: &[Value],
        f: impl FnOnce(&mut Rows<'_>) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(normalize(sql))?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        f(&mut rows)
    }

    /// Execute a multi-statement script, e.g. schema creation.
    pub fn execute_batch(&self, script: &str) -> Result<(), RepoError> {
        let conn = self.conn();
        conn.execute_batch(script)?;
        Ok(())
    }

    /// Run the statements of a `;`-separated SQL script one by one,
    /// skipping blank fragments.
    pub fn run_script(&self, script: &str) -> Result<(), RepoError> {
        let conn = self.conn();
        let mut executed = 0usize;
        for fragment in script.split(";\n") {
            let stmt = fragment.trim();
            if stmt.is_empty() {
                continue;
            }
            conn.execute(normalize(stmt), [])?;
            executed += 1;
        }
        log::info!("script executed: {executed} statements");
        Ok(())
    }

    /// Probe whether a table exists, i.e. whether the schema was set up.
    pub fn is_set(&self, table: &str) -> bool {
        let conn = self.conn();
        // the prepared statement borrows the guard and must drop first
        let probe = conn.prepare(&format!("Select * From {table}"));
        probe.is_ok()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Trim the statement and strip one trailing `;`.
fn normalize(sql: &str) -> &str {
    let sql = sql.trim();
    sql.strip_suffix(';').unwrap_or(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Database {
        let db = Database::open_in_memory(&Configuration::default()).unwrap();
        db.execute_batch("Create Table t (id Integer Primary Key Autoincrement, name Text)")
            .unwrap();
        db
    }

    #[test]
    fn normalize_strips_one_trailing_terminator() {
        assert_eq!(normalize("Select 1;"), "Select 1");
        assert_eq!(normalize("  Select 1  "), "Select 1");
        assert_eq!(normalize("Select 1;;"), "Select 1;");
        assert_eq!(normalize("Select 1"), "Select 1");
    }

    #[test]
    fn execute_insert_reports_count_and_rowid() {
        let db = memory_db();
        let (affected, id) = db
            .execute_insert(
                "Insert into t(name) Values(?);",
                &[Value::Text("a".into())],
            )
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(id, 1);
        let (_, id2) = db
            .execute_insert("Insert into t(name) Values(?)", &[Value::Text("b".into())])
            .unwrap();
        assert_eq!(id2, 2);
    }

    #[test]
    fn execute_update_returns_affected_rows() {
        let db = memory_db();
        db.execute_insert("Insert into t(name) Values(?)", &[Value::Text("a".into())])
            .unwrap();
        let affected = db
            .execute_update(
                "Update t Set name = ? Where id = ?",
                &[Value::Text("b".into()), Value::Integer(1)],
            )
            .unwrap();
        assert_eq!(affected, 1);
        let affected = db
            .execute_update(
                "Update t Set name = ? Where id = ?",
                &[Value::Text("c".into()), Value::Integer(99)],
            )
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn with_rows_exposes_the_cursor() {
        let db = memory_db();
        db.execute_insert("Insert into t(name) Values(?)", &[Value::Text("a".into())])
            .unwrap();
        let names = db
            .with_rows("Select name From t Where 1=1", &[], |rows| {
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    out.push(row.get::<_, String>(0)?);
                }
                Ok(out)
            })
            .unwrap();
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[test]
    fn is_set_probes_for_a_table() {
        let db = memory_db();
        assert!(db.is_set("t"));
        assert!(!db.is_set("missing_table"));
    }

    #[test]
    fn run_script_executes_each_statement() {
        let db = Database::open_in_memory(&Configuration::default()).unwrap();
        db.run_script(
            "Create Table a (id Integer Primary Key);\n\nCreate Table b (id Integer Primary Key);\n",
        )
        .unwrap();
        assert!(db.is_set("a"));
        assert!(db.is_set("b"));
    }
}
