//! Metadata-driven generic repository layer over SQLite.
//!
//! Entity types declare their table shape once (table name, persisted
//! columns, the identity column, and foreign-key links to other entity
//! types); the layer derives the SQL, executes it over a shared
//! connection, and reconstructs objects from result rows, transitively
//! loading linked entities. Each entity type gets an identity-keyed,
//! size-bounded cache gated by configuration.
//!
//! ```no_run
//! use repolite::{Configuration, Repository, Session};
//! # use repolite::{Entity, RepoError, TableDescriptor};
//! # use rusqlite::types::Value;
//! # #[derive(Clone, Default)]
//! # struct Customer { id: i64, name: String }
//! # impl Entity for Customer {
//! #     fn descriptor() -> TableDescriptor {
//! #         TableDescriptor::new("customers").identity("id").column("name")
//! #     }
//! #     fn id(&self) -> i64 { self.id }
//! #     fn set_id(&mut self, id: i64) { self.id = id; }
//! #     fn read_column(&self, _: &str) -> Result<Value, RepoError> {
//! #         Ok(Value::Text(self.name.clone()))
//! #     }
//! #     fn write_column(&mut self, _: &str, _: Value) -> Result<(), RepoError> { Ok(()) }
//! #     fn link_slot_mut(&mut self, _: &str) -> Option<&mut dyn repolite::LinkSlot> { None }
//! # }
//!
//! # fn main() -> Result<(), RepoError> {
//! let session = Session::open("app.db", Configuration::from_env())?;
//! let customers = Repository::<Customer>::new(session.clone())?;
//! let mut ann = Customer { id: 0, name: "Ann".into() };
//! customers.save(&mut ann)?;
//! let again = customers.find_by_id(ann.id)?;
//! assert_eq!(again.name, ann.name);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod meta;
pub mod repository;
pub mod session;
pub mod statement;
pub mod trace;

pub use config::Configuration;
pub use db::Database;
pub use entity::{Entity, Link, LinkSlot};
pub use error::RepoError;
pub use meta::{FieldKind, FieldMeta, TableDescriptor, TableMeta};
pub use repository::{Repository, MAX_CASCADE_DEPTH};
pub use session::Session;
pub use statement::{StatementDraft, StatementKind};

// The bound value type is rusqlite's; re-exported so entity impls don't
// need a direct rusqlite dependency.
pub use rusqlite::types::Value;
