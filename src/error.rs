use thiserror::Error;

/// All failures the repository layer can report.
///
/// Variants fall into two tiers. Configuration errors mean the entity
/// declaration itself is wrong and the offending call must fail loudly;
/// they are never worth retrying. Operational errors describe a single
/// call that did not go through and are reported to the caller so it can
/// branch on the cause instead of a collapsed null/false.
#[derive(Debug, Error)]
pub enum RepoError {
    // -- configuration tier --
    #[error("invalid metadata for table {table}: {reason}")]
    InvalidMetadata { table: String, reason: String },
    #[error("{kind} statement on {table} requires an identity column")]
    MissingIdentity { table: String, kind: &'static str },
    #[error("statement on {table} has no columns to write")]
    EmptyStatement { table: String },
    #[error("unknown column {column} on {table}")]
    UnknownColumn { table: String, column: String },

    // -- operational tier --
    #[error("no row with id {id} in {table}")]
    NotFound { table: String, id: i64 },
    #[error("write to {table} could not be confirmed: {affected} rows affected")]
    WriteFailed { table: String, affected: usize },
    #[error("insert into {table} returned no generated identity")]
    NoGeneratedKey { table: String },
    #[error("cache is disabled; refresh is unavailable")]
    CacheDisabled,
    #[error("id {id} is not cached for {table}; nothing to refresh")]
    NotCached { table: String, id: i64 },
    #[error("cascading save exceeded depth {0}; link cycle suspected")]
    CascadeDepth(usize),
    #[error("unable to map column {column}: {reason}")]
    Mapping { column: String, reason: String },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl RepoError {
    /// True for the fatal tier: the entity declaration or statement
    /// construction is wrong, not the individual operation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RepoError::InvalidMetadata { .. }
                | RepoError::MissingIdentity { .. }
                | RepoError::EmptyStatement { .. }
                | RepoError::UnknownColumn { .. }
        )
    }
}
