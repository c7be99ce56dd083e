// shared by several test binaries; not every binary uses every fixture
#![allow(dead_code)]

use std::sync::Arc;

use repolite::{
    Configuration, Entity, Link, RepoError, Session, TableDescriptor, Value,
};

pub const SCHEMA: &str = r#"
Create Table customers (
    id Integer Primary Key Autoincrement,
    name Text Not Null
);
Create Table orders (
    id Integer Primary Key Autoincrement,
    total Real Not Null,
    customer_id Integer
);
Create Table nodes (
    id Integer Primary Key Autoincrement,
    label Text Not Null,
    next_id Integer
);
"#;

/// Fresh in-memory session with the fixture schema installed.
pub fn memory_session(cache_enabled: bool) -> Arc<Session> {
    let config = Configuration {
        cache_enabled,
        ..Configuration::default()
    };
    let session = Session::open_in_memory(config).expect("open in-memory session");
    session.db().execute_batch(SCHEMA).expect("install schema");
    session
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

impl Customer {
    pub fn named(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
        }
    }
}

impl Entity for Customer {
    fn descriptor() -> TableDescriptor {
        TableDescriptor::new("customers").identity("id").column("name")
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn read_column(&self, column: &str) -> Result<Value, RepoError> {
        match column {
            "name" => Ok(Value::Text(self.name.clone())),
            other => Err(unknown_column("customers", other)),
        }
    }

    fn write_column(&mut self, column: &str, value: Value) -> Result<(), RepoError> {
        match (column, value) {
            ("name", Value::Text(name)) => {
                self.name = name;
                Ok(())
            }
            (column, value) => Err(mismatch(column, value)),
        }
    }

    fn link_slot_mut(&mut self, _column: &str) -> Option<&mut dyn repolite::LinkSlot> {
        None
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Order {
    pub id: i64,
    pub total: f64,
    pub customer: Link<Customer>,
}

impl Entity for Order {
    fn descriptor() -> TableDescriptor {
        TableDescriptor::new("orders")
            .identity("id")
            .column("total")
            .link("customer_id")
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn read_column(&self, column: &str) -> Result<Value, RepoError> {
        match column {
            "total" => Ok(Value::Real(self.total)),
            other => Err(unknown_column("orders", other)),
        }
    }

    fn write_column(&mut self, column: &str, value: Value) -> Result<(), RepoError> {
        match (column, value) {
            ("total", Value::Real(total)) => {
                self.total = total;
                Ok(())
            }
            // SQLite hands back integer affinity for whole numbers
            ("total", Value::Integer(total)) => {
                self.total = total as f64;
                Ok(())
            }
            (column, value) => Err(mismatch(column, value)),
        }
    }

    fn link_slot_mut(&mut self, column: &str) -> Option<&mut dyn repolite::LinkSlot> {
        match column {
            "customer_id" => Some(&mut self.customer),
            _ => None,
        }
    }
}

/// Self-linking fixture for cascade-depth tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub id: i64,
    pub label: String,
    pub next: Link<Node>,
}

impl Entity for Node {
    fn descriptor() -> TableDescriptor {
        TableDescriptor::new("nodes")
            .identity("id")
            .column("label")
            .link("next_id")
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn read_column(&self, column: &str) -> Result<Value, RepoError> {
        match column {
            "label" => Ok(Value::Text(self.label.clone())),
            other => Err(unknown_column("nodes", other)),
        }
    }

    fn write_column(&mut self, column: &str, value: Value) -> Result<(), RepoError> {
        match (column, value) {
            ("label", Value::Text(label)) => {
                self.label = label;
                Ok(())
            }
            (column, value) => Err(mismatch(column, value)),
        }
    }

    fn link_slot_mut(&mut self, column: &str) -> Option<&mut dyn repolite::LinkSlot> {
        match column {
            "next_id" => Some(&mut self.next),
            _ => None,
        }
    }
}

fn unknown_column(table: &str, column: &str) -> RepoError {
    RepoError::UnknownColumn {
        table: table.to_string(),
        column: column.to_string(),
    }
}

fn mismatch(column: &str, value: Value) -> RepoError {
    RepoError::Mapping {
        column: column.to_string(),
        reason: format!("unexpected value {value:?}"),
    }
}
