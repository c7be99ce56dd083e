use std::sync::Arc;

use rusqlite::types::Value;

use crate::error::RepoError;
use crate::meta::TableDescriptor;
use crate::repository::Repository;
use crate::session::Session;

/// A persisted object with a numeric identity.
///
/// An identity of zero or below marks the entity as transient (not yet
/// persisted); positive identities are persisted and cache-eligible.
/// Implementations declare their table shape once via [`descriptor`] and
/// plumb column values through the read/write hooks; the repository,
/// builder and mapper drive everything else off the metadata.
///
/// [`descriptor`]: Entity::descriptor
pub trait Entity: Clone + Default + Send + 'static {
    /// Declarative description of the table: name plus the ordered
    /// persisted fields. Validated when a repository is built.
    fn descriptor() -> TableDescriptor;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Current value of a plain persisted column.
    fn read_column(&self, column: &str) -> Result<Value, RepoError>;

    /// Assign a plain persisted column from a result row.
    fn write_column(&mut self, column: &str, value: Value) -> Result<(), RepoError>;

    /// Mutable access to the link behind a link column, if any.
    fn link_slot_mut(&mut self, column: &str) -> Option<&mut dyn LinkSlot>;
}

/// In-memory state of a foreign-key relation.
///
/// `Null` stores SQL NULL; `Pending` carries a stored identity that has
/// not been (or could not be) loaded; `Loaded` owns the linked entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Link<T> {
    #[default]
    Null,
    Pending(i64),
    Loaded(Box<T>),
}

impl<T: Entity> Link<T> {
    pub fn to(entity: T) -> Self {
        Link::Loaded(Box::new(entity))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Link::Null)
    }

    /// Identity currently carried by the link, if any.
    pub fn target_id(&self) -> Option<i64> {
        match self {
            Link::Null => None,
            Link::Pending(id) => Some(*id),
            Link::Loaded(entity) => Some(entity.id()),
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Link::Loaded(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Link::Loaded(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn set(&mut self, entity: T) {
        *self = Link::Loaded(Box::new(entity));
    }
}

/// Object-safe view of a [`Link`] used by the repository and mapper.
///
/// The monomorphized `Link<T>` knows its target type, so cascade saves
/// and resolution reach the right repository without any type registry.
pub trait LinkSlot {
    /// Identity currently carried by the link, if any.
    fn stored_id(&self) -> Option<i64>;

    /// Save the loaded target through its own repository and return the
    /// identity to store in the owning row.
    fn cascade_save(
        &mut self,
        session: &Arc<Session>,
        depth: usize,
    ) -> Result<Option<i64>, RepoError>;

    /// Replace the slot from a stored foreign-key value. Zero maps to a
    /// null link and never triggers a lookup.
    fn resolve(&mut self, session: &Arc<Session>, stored: i64) -> Result<(), RepoError>;
}

impl<T: Entity> LinkSlot for Link<T> {
    fn stored_id(&self) -> Option<i64> {
        self.target_id()
    }

    fn cascade_save(
        &mut self,
        session: &Arc<Session>,
        depth: usize,
    ) -> Result<Option<i64>, RepoError> {
        match self {
            Link::Null => Ok(None),
            Link::Pending(id) => Ok(Some(*id)),
            Link::Loaded(entity) => {
                let repo = Repository::<T>::new(session.clone())?;
                repo.save_at_depth(entity, depth)?;
                Ok(Some(entity.id()))
            }
        }
    }

    fn resolve(&mut self, session: &Arc<Session>, stored: i64) -> Result<(), RepoError> {
        *self = if stored == 0 {
            Link::Null
        } else {
            let repo = Repository::<T>::new(session.clone())?;
            match repo.get_by_id(stored)? {
                Some(entity) => Link::Loaded(Box::new(entity)),
                // row is gone; keep the foreign key as an unresolved marker
                None => Link::Pending(stored),
            }
        };
        Ok(())
    }
}
