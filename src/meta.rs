use crate::error::RepoError;

/// How a persisted field participates in statements and mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordinary column written and read verbatim.
    Plain,
    /// The primary-key column; excluded from SET lists and bound last.
    Identity,
    /// Foreign-key column holding another entity's identity.
    Link,
}

#[derive(Clone, Debug)]
pub struct FieldMeta {
    pub column: String,
    pub kind: FieldKind,
}

/// Raw, declaration-order description of an entity's table as supplied by
/// `Entity::descriptor`. Turned into a [`TableMeta`] by validation.
#[derive(Clone, Debug)]
pub struct TableDescriptor {
    table: String,
    fields: Vec<FieldMeta>,
}

impl TableDescriptor {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    pub fn identity(self, column: impl Into<String>) -> Self {
        self.push(column.into(), FieldKind::Identity)
    }

    pub fn column(self, column: impl Into<String>) -> Self {
        self.push(column.into(), FieldKind::Plain)
    }

    pub fn link(self, column: impl Into<String>) -> Self {
        self.push(column.into(), FieldKind::Link)
    }

    fn push(mut self, column: String, kind: FieldKind) -> Self {
        self.fields.push(FieldMeta { column, kind });
        self
    }
}

/// Validated, immutable metadata for one entity type.
///
/// Validation happens once when a repository is built; after that the
/// metadata is read-only, which is what makes caching it sound.
#[derive(Clone, Debug)]
pub struct TableMeta {
    table: String,
    fields: Vec<FieldMeta>,
    identity: usize,
}

impl TableMeta {
    /// Check the declaration invariants: a non-empty table name, non-empty
    /// unique column names, and exactly one identity field.
    pub fn validate(descriptor: TableDescriptor) -> Result<Self, RepoError> {
        let TableDescriptor { table, fields } = descriptor;
        if table.trim().is_empty() {
            return Err(RepoError::InvalidMetadata {
                table,
                reason: "empty table name".into(),
            });
        }
        let mut identity = None;
        for (idx, field) in fields.iter().enumerate() {
            if field.column.trim().is_empty() {
                return Err(RepoError::InvalidMetadata {
                    table,
                    reason: format!("field #{idx} has an empty column name"),
                });
            }
            if fields[..idx].iter().any(|f| f.column == field.column) {
                return Err(RepoError::InvalidMetadata {
                    table,
                    reason: format!("duplicate column {}", field.column),
                });
            }
            if field.kind == FieldKind::Identity {
                if identity.is_some() {
                    return Err(RepoError::InvalidMetadata {
                        table,
                        reason: "more than one identity field".into(),
                    });
                }
                identity = Some(idx);
            }
        }
        let identity = identity.ok_or_else(|| RepoError::InvalidMetadata {
            table: table.clone(),
            reason: "no identity field declared".into(),
        })?;
        Ok(Self {
            table,
            fields,
            identity,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn identity(&self) -> &FieldMeta {
        &self.fields[self.identity]
    }

    pub fn identity_column(&self) -> &str {
        &self.fields[self.identity].column
    }
}
