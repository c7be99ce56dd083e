use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::types::Value;
use tracing::debug;

use crate::entity::Entity;
use crate::error::RepoError;
use crate::mapper;
use crate::meta::{FieldKind, TableMeta};
use crate::session::Session;
use crate::statement::StatementDraft;

/// Bound on nested cascading saves. A chain of linked transient entities
/// deeper than this is treated as a link cycle and reported, instead of
/// recursing until the stack gives out.
pub const MAX_CASCADE_DEPTH: usize = 8;

/// Per-entity-type CRUD surface with an identity-keyed cache.
///
/// A repository is a cheap handle over a shared [`Session`]; building one
/// validates the entity's metadata once and keeps it for every statement.
pub struct Repository<T: Entity> {
    session: Arc<Session>,
    meta: TableMeta,
    _marker: PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    /// Validate `T`'s declared metadata and bind a repository to the
    /// session. Fails with a configuration error on a bad declaration.
    pub fn new(session: Arc<Session>) -> Result<Self, RepoError> {
        let meta = TableMeta::validate(T::descriptor())?;
        Ok(Self {
            session,
            meta,
            _marker: PhantomData,
        })
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Dispatch on the entity's own identity.
    pub fn get(&self, entity: &T) -> Result<Option<T>, RepoError> {
        self.get_by_id(entity.id())
    }

    pub fn find(&self, entity: &T) -> Result<T, RepoError> {
        self.find_by_id(entity.id())
    }

    /// Fetch by identity. A cache hit short-circuits the query; an absent
    /// row is `Ok(None)`, not an error.
    pub fn get_by_id(&self, id: i64) -> Result<Option<T>, RepoError> {
        if self.session.cache_enabled() {
            if let Some(hit) = self.session.with_cache::<T, _>(|cache| cache.get(id)) {
                debug!(table = self.meta.table(), id, "cache hit");
                return Ok(Some(hit));
            }
        }
        let found = self.query_by_id(id)?;
        if let Some(entity) = &found {
            self.cache_one(entity);
        }
        Ok(found)
    }

    /// Fetch by identity, with an absent row reported as `NotFound`.
    pub fn find_by_id(&self, id: i64) -> Result<T, RepoError> {
        self.get_by_id(id)?.ok_or_else(|| RepoError::NotFound {
            table: self.meta.table().to_string(),
            id,
        })
    }

    /// All rows matching a single equality predicate.
    pub fn get_by_field(&self, column: &str, value: Value) -> Result<Vec<T>, RepoError> {
        let mut draft = StatementDraft::select(self.meta.table());
        draft.add(column, value);
        self.fetch(&draft)
    }

    /// All rows matching every given equality predicate.
    pub fn get_where(&self, filters: &[(&str, Value)]) -> Result<Vec<T>, RepoError> {
        let mut draft = StatementDraft::select(self.meta.table());
        for (column, value) in filters {
            draft.add(column, value.clone());
        }
        self.fetch(&draft)
    }

    pub fn get_all(&self) -> Result<Vec<T>, RepoError> {
        self.fetch(&StatementDraft::select(self.meta.table()))
    }

    /// Re-read a cached entity from storage and replace the cached copy.
    ///
    /// Recoverable failures: caching disabled, identity not currently
    /// cached, or the row no longer exists.
    pub fn refresh(&self, id: i64) -> Result<T, RepoError> {
        if !self.session.cache_enabled() {
            return Err(RepoError::CacheDisabled);
        }
        if !self.session.with_cache::<T, _>(|cache| cache.contains(id)) {
            return Err(RepoError::NotCached {
                table: self.meta.table().to_string(),
                id,
            });
        }
        let fresh = self.query_by_id(id)?.ok_or_else(|| RepoError::NotFound {
            table: self.meta.table().to_string(),
            id,
        })?;
        self.cache_one(&fresh);
        Ok(fresh)
    }

    pub fn refresh_entity(&self, entity: &T) -> Result<T, RepoError> {
        self.refresh(entity.id())
    }

    /// Persist the entity, inserting or updating based on whether it is
    /// already known.
    ///
    /// A cached identity is known to exist; a persisted identity missing
    /// from the cache (or caching off) is settled by a fresh lookup.
    /// Transient identities always insert. Loaded link targets are saved
    /// first through their own repositories (depth-bounded), and their
    /// resulting identities become the stored column values. On insert
    /// the generated identity is assigned back onto the entity.
    pub fn save(&self, entity: &mut T) -> Result<(), RepoError> {
        self.save_at_depth(entity, 0)
    }

    pub(crate) fn save_at_depth(&self, entity: &mut T, depth: usize) -> Result<(), RepoError> {
        if depth >= MAX_CASCADE_DEPTH {
            return Err(RepoError::CascadeDepth(depth));
        }
        // the bounded cache can evict a persisted identity, so a miss on
        // a positive id still has to consult storage before inserting
        let exists = if self.session.cache_enabled() {
            self.session
                .with_cache::<T, _>(|cache| cache.contains(entity.id()))
                || (entity.id() > 0 && self.query_by_id(entity.id())?.is_some())
        } else {
            self.query_by_id(entity.id())?.is_some()
        };
        if exists {
            self.update_row(entity, depth)?;
        } else {
            self.insert_row(entity, depth)?;
        }
        self.cache_one(entity);
        Ok(())
    }

    /// Delete by identity and evict the identity from the cache. Zero
    /// affected rows is reported as `NotFound` rather than swallowed.
    pub fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut draft = StatementDraft::delete(self.meta.table());
        draft.add_identity(self.meta.identity_column(), Value::Integer(id));
        let sql = draft.sql()?;
        let affected = self.session.db().execute_update(&sql, &draft.params())?;
        self.evict(id);
        match affected {
            1 => {
                debug!(table = self.meta.table(), id, "deleted");
                Ok(())
            }
            0 => Err(RepoError::NotFound {
                table: self.meta.table().to_string(),
                id,
            }),
            n => Err(RepoError::WriteFailed {
                table: self.meta.table().to_string(),
                affected: n,
            }),
        }
    }

    pub fn delete_entity(&self, entity: &T) -> Result<(), RepoError> {
        self.delete(entity.id())
    }

    /// Drop one identity from the cache.
    pub fn evict(&self, id: i64) {
        self.session.with_cache::<T, _>(|cache| {
            cache.remove(id);
        });
    }

    /// Drop every cached instance of this entity type.
    pub fn clear_cache(&self) {
        self.session.with_cache::<T, _>(|cache| cache.clear());
    }

    pub fn is_cached(&self, id: i64) -> bool {
        self.session.with_cache::<T, _>(|cache| cache.contains(id))
    }

    fn query_by_id(&self, id: i64) -> Result<Option<T>, RepoError> {
        let mut draft = StatementDraft::select(self.meta.table());
        draft.add(self.meta.identity_column(), Value::Integer(id));
        let sql = draft.sql()?;
        mapper::map_one(&self.session, &self.meta, &sql, &draft.params())
    }

    fn fetch(&self, draft: &StatementDraft) -> Result<Vec<T>, RepoError> {
        let sql = draft.sql()?;
        let list = mapper::map_many(&self.session, &self.meta, &sql, &draft.params())?;
        for entity in &list {
            self.cache_one(entity);
        }
        Ok(list)
    }

    /// Add every non-identity column to the draft, cascading into loaded
    /// link targets first so the stored value is their saved identity.
    fn write_columns(
        &self,
        entity: &mut T,
        draft: &mut StatementDraft,
        depth: usize,
    ) -> Result<(), RepoError> {
        for field in self.meta.fields() {
            match field.kind {
                FieldKind::Identity => continue,
                FieldKind::Plain => {
                    draft.add(&field.column, entity.read_column(&field.column)?);
                }
                FieldKind::Link => {
                    let slot = entity.link_slot_mut(&field.column).ok_or_else(|| {
                        RepoError::UnknownColumn {
                            table: self.meta.table().to_string(),
                            column: field.column.clone(),
                        }
                    })?;
                    let stored = slot.cascade_save(&self.session, depth + 1)?;
                    draft.add(&field.column, stored.map_or(Value::Null, Value::Integer));
                }
            }
        }
        Ok(())
    }

    fn insert_row(&self, entity: &mut T, depth: usize) -> Result<(), RepoError> {
        let mut draft = StatementDraft::insert(self.meta.table());
        self.write_columns(entity, &mut draft, depth)?;
        let sql = draft.sql()?;
        let (affected, generated) = self.session.db().execute_insert(&sql, &draft.params())?;
        if affected != 1 {
            return Err(RepoError::WriteFailed {
                table: self.meta.table().to_string(),
                affected,
            });
        }
        if generated <= 0 {
            return Err(RepoError::NoGeneratedKey {
                table: self.meta.table().to_string(),
            });
        }
        entity.set_id(generated);
        debug!(table = self.meta.table(), id = generated, "inserted");
        Ok(())
    }

    fn update_row(&self, entity: &mut T, depth: usize) -> Result<(), RepoError> {
        let mut draft = StatementDraft::update(self.meta.table());
        self.write_columns(entity, &mut draft, depth)?;
        draft.add_identity(self.meta.identity_column(), Value::Integer(entity.id()));
        let sql = draft.sql()?;
        let affected = self.session.db().execute_update(&sql, &draft.params())?;
        if affected != 1 {
            return Err(RepoError::WriteFailed {
                table: self.meta.table().to_string(),
                affected,
            });
        }
        debug!(table = self.meta.table(), id = entity.id(), "updated");
        Ok(())
    }

    /// Cache a persisted instance; transient identities are never stored.
    fn cache_one(&self, entity: &T) {
        if entity.id() <= 0 || !self.session.cache_enabled() {
            return;
        }
        self.session
            .with_cache::<T, _>(|cache| cache.insert(entity.id(), entity.clone()));
    }
}
