//! Result-row to entity reconstruction.
//!
//! Mapping runs in two phases. The raw column values are snapshotted
//! while the connection is locked, then entities are hydrated (and link
//! fields resolved through their target repositories) after the lock is
//! released; resolution issues fresh queries through the same facade, so
//! it must not run under the cursor.

use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::Rows;

use crate::entity::Entity;
use crate::error::RepoError;
use crate::meta::{FieldKind, TableMeta};
use crate::session::Session;

/// Map the first row into an entity, or `None` for an empty cursor.
pub fn map_one<T: Entity>(
    session: &Arc<Session>,
    meta: &TableMeta,
    sql: &str,
    params: &[Value],
) -> Result<Option<T>, RepoError> {
    let raw = session
        .db()
        .with_rows(sql, params, |rows| snapshot(meta, rows, Some(1)))?;
    match raw.into_iter().next() {
        Some(values) => Ok(Some(hydrate(session, meta, values)?)),
        None => Ok(None),
    }
}

/// Map every row into an entity, preserving cursor order.
pub fn map_many<T: Entity>(
    session: &Arc<Session>,
    meta: &TableMeta,
    sql: &str,
    params: &[Value],
) -> Result<Vec<T>, RepoError> {
    let raw = session
        .db()
        .with_rows(sql, params, |rows| snapshot(meta, rows, None))?;
    let mut out = Vec::with_capacity(raw.len());
    for values in raw {
        out.push(hydrate(session, meta, values)?);
    }
    Ok(out)
}

/// Read the metadata columns of up to `limit` rows, by column name, in
/// field declaration order.
fn snapshot(
    meta: &TableMeta,
    rows: &mut Rows<'_>,
    limit: Option<usize>,
) -> Result<Vec<Vec<Value>>, RepoError> {
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(meta.fields().len());
        for field in meta.fields() {
            let value: Value =
                row.get(field.column.as_str())
                    .map_err(|err| RepoError::Mapping {
                        column: field.column.clone(),
                        reason: err.to_string(),
                    })?;
            values.push(value);
        }
        out.push(values);
        if limit.is_some_and(|n| out.len() >= n) {
            break;
        }
    }
    Ok(out)
}

/// Build one entity from a snapshotted row.
fn hydrate<T: Entity>(
    session: &Arc<Session>,
    meta: &TableMeta,
    values: Vec<Value>,
) -> Result<T, RepoError> {
    let mut entity = T::default();
    for (field, value) in meta.fields().iter().zip(values) {
        match field.kind {
            FieldKind::Identity => {
                entity.set_id(as_identity(&field.column, value)?);
            }
            FieldKind::Plain => {
                entity.write_column(&field.column, value)?;
            }
            FieldKind::Link => {
                let stored = match value {
                    Value::Null => 0,
                    other => as_identity(&field.column, other)?,
                };
                let slot = entity.link_slot_mut(&field.column).ok_or_else(|| {
                    RepoError::UnknownColumn {
                        table: meta.table().to_string(),
                        column: field.column.clone(),
                    }
                })?;
                slot.resolve(session, stored)?;
            }
        }
    }
    Ok(entity)
}

fn as_identity(column: &str, value: Value) -> Result<i64, RepoError> {
    match value {
        Value::Integer(id) => Ok(id),
        other => Err(RepoError::Mapping {
            column: column.to_string(),
            reason: format!("expected an integer identity, got {other:?}"),
        }),
    }
}
