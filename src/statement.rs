use rusqlite::types::Value;

use crate::error::RepoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    fn label(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
        }
    }
}

/// Ordered column/value draft for one SQL statement.
///
/// Insertion order determines both the column order in the generated text
/// and the positional parameter order; the designated identity column is
/// always bound last for UPDATE and DELETE. The facade binds parameters
/// positionally, so the two orders must never drift apart.
#[derive(Clone, Debug)]
pub struct StatementDraft {
    kind: StatementKind,
    table: String,
    data: Vec<(String, Value)>,
    identity: Option<String>,
}

impl StatementDraft {
    pub fn select(table: impl Into<String>) -> Self {
        Self::new(StatementKind::Select, table)
    }

    pub fn insert(table: impl Into<String>) -> Self {
        Self::new(StatementKind::Insert, table)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::new(StatementKind::Update, table)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(StatementKind::Delete, table)
    }

    fn new(kind: StatementKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            data: Vec::new(),
            identity: None,
        }
    }

    /// Add a column, replacing the value in place when the column was
    /// already added; first-seen order is preserved.
    pub fn add(&mut self, column: &str, value: Value) -> &mut Self {
        match self.data.iter_mut().find(|(col, _)| col == column) {
            Some((_, slot)) => *slot = value,
            None => self.data.push((column.to_string(), value)),
        }
        self
    }

    /// Add a column and designate it as the identity for WHERE/SET logic.
    pub fn add_identity(&mut self, column: &str, value: Value) -> &mut Self {
        self.add(column, value);
        self.identity = Some(column.to_string());
        self
    }

    pub fn remove(&mut self, column: &str) -> &mut Self {
        self.data.retain(|(col, _)| col != column);
        if self.identity.as_deref() == Some(column) {
            self.identity = None;
        }
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> Vec<&str> {
        self.data.iter().map(|(col, _)| col.as_str()).collect()
    }

    /// Render the parameterized SQL text for this draft.
    pub fn sql(&self) -> Result<String, RepoError> {
        match self.kind {
            StatementKind::Select => Ok(self.select_sql()),
            StatementKind::Insert => self.insert_sql(),
            StatementKind::Update => self.update_sql(),
            StatementKind::Delete => self.delete_sql(),
        }
    }

    /// Render the SQL text with a raw suffix appended (e.g. an ORDER BY).
    pub fn sql_with(&self, suffix: &str) -> Result<String, RepoError> {
        Ok(format!("{} {suffix}", self.sql()?))
    }

    /// Bound values in placeholder order: plain columns in insertion
    /// order, the identity value last when one is designated.
    pub fn params(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.data.len());
        for (col, val) in &self.data {
            if self.identity.as_deref() == Some(col.as_str()) {
                continue;
            }
            out.push(val.clone());
        }
        if let Some(id) = &self.identity {
            if let Some((_, val)) = self.data.iter().find(|(col, _)| col == id) {
                out.push(val.clone());
            }
        }
        out
    }

    fn select_sql(&self) -> String {
        let mut sql = format!("Select * From {} Where 1=1", self.table);
        for (col, _) in &self.data {
            sql.push_str(&format!(" And {col} = ?"));
        }
        sql
    }

    fn insert_sql(&self) -> Result<String, RepoError> {
        if self.data.is_empty() {
            return Err(RepoError::EmptyStatement {
                table: self.table.clone(),
            });
        }
        let columns: Vec<&str> = self.data.iter().map(|(col, _)| col.as_str()).collect();
        let placeholders: Vec<&str> = self.data.iter().map(|_| "?").collect();
        Ok(format!(
            "Insert into {}({}) Values({})",
            self.table,
            columns.join(","),
            placeholders.join(",")
        ))
    }

    fn update_sql(&self) -> Result<String, RepoError> {
        let id = self.identity()?;
        let assignments: Vec<String> = self
            .data
            .iter()
            .filter(|(col, _)| col != id)
            .map(|(col, _)| format!("{col} = ?"))
            .collect();
        if assignments.is_empty() {
            return Err(RepoError::EmptyStatement {
                table: self.table.clone(),
            });
        }
        Ok(format!(
            "Update {} Set {} Where {id} = ?",
            self.table,
            assignments.join(",")
        ))
    }

    fn delete_sql(&self) -> Result<String, RepoError> {
        let id = self.identity()?;
        let mut sql = format!("Delete From {} Where 1=1", self.table);
        for (col, _) in &self.data {
            if col != id {
                sql.push_str(&format!(" And {col} = ?"));
            }
        }
        sql.push_str(&format!(" And {id} = ?"));
        Ok(sql)
    }

    fn identity(&self) -> Result<&str, RepoError> {
        self.identity
            .as_deref()
            .ok_or_else(|| RepoError::MissingIdentity {
                table: self.table.clone(),
                kind: self.kind.label(),
            })
    }
}
