//! Entity identities and the canonical id scheme
//!
//! Tables are identified by `schema.name` when they live in a schema and by
//! `name` otherwise. Schemas are identified by their name. The two id spaces
//! are kept apart by [`EntityId`], which carries the entity kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A table, optionally namespaced by a schema.
///
/// Equality and hashing treat a missing schema and `""` alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl TableEntity {
    /// Create a table without a schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
        }
    }

    /// Create a table inside a schema
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: Some(schema.into()),
        }
    }

    /// Create a table from an optional schema, treating `""` as no schema
    pub fn from_parts(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// The owning schema name, if the table is namespaced
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref().filter(|s| !s.is_empty())
    }

    /// Canonical id: `schema.name` or `name`
    pub fn id(&self) -> String {
        match self.schema_name() {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// The schema entity owning this table
    pub fn schema_entity(&self) -> Option<SchemaEntity> {
        self.schema_name().map(SchemaEntity::new)
    }

    /// Compare two tables, treating a missing schema and `""` alike
    pub fn same_as(&self, other: &TableEntity) -> bool {
        self.name == other.name && self.schema_name() == other.schema_name()
    }

    /// Reference a column of this table
    pub fn column(&self, name: impl Into<String>) -> Column {
        Column {
            entity: self.clone(),
            name: name.into(),
        }
    }
}

impl PartialEq for TableEntity {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for TableEntity {}

impl Hash for TableEntity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.schema_name().hash(state);
    }
}

impl fmt::Display for TableEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// A schema (namespace) grouping tables
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaEntity {
    pub name: String,
}

impl SchemaEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Canonical id: the schema name
    pub fn id(&self) -> String {
        self.name.clone()
    }
}

/// The two structural node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Table,
    Schema,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::Schema => "schema",
        }
    }
}

/// Either a table or a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Table(TableEntity),
    Schema(SchemaEntity),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Table(_) => EntityKind::Table,
            Entity::Schema(_) => EntityKind::Schema,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Table(table) => &table.name,
            Entity::Schema(schema) => &schema.name,
        }
    }

    /// Canonical id within the entity's own id space
    pub fn id(&self) -> String {
        match self {
            Entity::Table(table) => table.id(),
            Entity::Schema(schema) => schema.id(),
        }
    }

    /// Id qualified by kind, safe to use as a key across both id spaces
    pub fn entity_id(&self) -> EntityId {
        EntityId::new(self.kind(), self.id())
    }
}

impl From<TableEntity> for Entity {
    fn from(table: TableEntity) -> Self {
        Entity::Table(table)
    }
}

impl From<SchemaEntity> for Entity {
    fn from(schema: SchemaEntity) -> Self {
        Entity::Schema(schema)
    }
}

/// A canonical id tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn table(table: &TableEntity) -> Self {
        Self::new(EntityKind::Table, table.id())
    }

    pub fn schema(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Schema, name)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// A column of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub entity: TableEntity,
    pub name: String,
}

impl Column {
    pub fn new(entity: TableEntity, name: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
        }
    }

    /// Column identity key `{entityId}.{columnName}`, also used as the handle id
    pub fn id(&self) -> String {
        column_id(&self.entity, &self.name)
    }
}

/// Build the column identity key for a column of `entity`
pub fn column_id(entity: &TableEntity, column: &str) -> String {
    format!("{}.{}", entity.id(), column)
}
