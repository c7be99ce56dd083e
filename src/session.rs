use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cache::EntityCache;
use crate::config::Configuration;
use crate::db::Database;
use crate::entity::Entity;
use crate::error::RepoError;

/// Owns the connection facade, the configuration, and one identity-cache
/// shard per entity type.
///
/// Repositories are thin handles over a shared `Arc<Session>`; every
/// `Repository<T>` built over the same session sees the same cache shard
/// for `T`, which keeps link resolution and direct access coherent.
pub struct Session {
    db: Database,
    config: Configuration,
    caches: Mutex<HashMap<TypeId, Box<dyn Any + Send>>>,
}

impl Session {
    pub fn new(db: Database, config: Configuration) -> Arc<Self> {
        Arc::new(Self {
            db,
            config,
            caches: Mutex::new(HashMap::new()),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P, config: Configuration) -> Result<Arc<Self>, RepoError> {
        let db = Database::open(path, &config)?;
        Ok(Self::new(db, config))
    }

    pub fn open_in_memory(config: Configuration) -> Result<Arc<Self>, RepoError> {
        let db = Database::open_in_memory(&config)?;
        Ok(Self::new(db, config))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn cache_enabled(&self) -> bool {
        self.config.cache_enabled
    }

    /// Run `f` against the cache shard for `T`, creating it on first use.
    ///
    /// The shard map stays locked while `f` runs; `f` must not re-enter
    /// the session.
    pub(crate) fn with_cache<T: Entity, R>(
        &self,
        f: impl FnOnce(&mut EntityCache<T>) -> R,
    ) -> R {
        let mut caches = self
            .caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let shard = caches
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(EntityCache::<T>::new(self.config.cache_capacity)));
        match shard.downcast_mut::<EntityCache<T>>() {
            Some(cache) => f(cache),
            // shards are keyed by TypeId, so the downcast cannot fail
            None => unreachable!("cache shard type mismatch"),
        }
    }
}
