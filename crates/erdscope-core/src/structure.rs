//! Structures discovered by schema streaming
//!
//! These are the values held by the structural model and carried as the
//! `data` of diagram nodes and edges.

use serde::{Deserialize, Serialize};

use crate::entity::{Column, Entity, EntityId, EntityKind, SchemaEntity, TableEntity, column_id};

/// A column of a discovered table with its key flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStructure {
    pub entity: TableEntity,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    pub ordinal_position: u32,
    pub primary_key: bool,
    pub foreign_key: bool,
    pub unique_key: bool,
    pub nullable: bool,
    /// Participates in at least one incoming or outgoing foreign key
    pub has_references: bool,
}

impl ColumnStructure {
    /// Create a column with every key flag cleared
    pub fn new(entity: TableEntity, name: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
            data_type: None,
            ordinal_position: 0,
            primary_key: false,
            foreign_key: false,
            unique_key: false,
            nullable: false,
            has_references: false,
        }
    }

    /// Column identity key `{entityId}.{columnName}`
    pub fn id(&self) -> String {
        column_id(&self.entity, &self.name)
    }

    pub fn column(&self) -> Column {
        Column::new(self.entity.clone(), self.name.clone())
    }

    /// Columns shown when a table only renders its key and referenced columns
    pub fn is_key_or_referenced(&self) -> bool {
        self.primary_key || self.foreign_key || self.unique_key || self.has_references
    }
}

/// A discovered table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntityStructure {
    #[serde(flatten)]
    pub entity: TableEntity,
    pub columns: Vec<ColumnStructure>,
    /// The primary key spans more than one column
    pub is_composite: bool,
}

impl TableEntityStructure {
    pub fn new(entity: TableEntity) -> Self {
        Self {
            entity,
            columns: Vec::new(),
            is_composite: false,
        }
    }

    pub fn id(&self) -> String {
        self.entity.id()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnStructure> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnStructure> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Columns rendered on the diagram for the given column-visibility mode
    pub fn visible_columns(&self, show_all: bool) -> impl Iterator<Item = &ColumnStructure> {
        self.columns
            .iter()
            .filter(move |c| show_all || c.is_key_or_referenced())
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnStructure> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// A discovered schema and the tables found in it so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntityStructure {
    #[serde(flatten)]
    pub entity: SchemaEntity,
    pub entities: Vec<EntityStructure>,
}

impl SchemaEntityStructure {
    pub fn new(entity: SchemaEntity) -> Self {
        Self {
            entity,
            entities: Vec::new(),
        }
    }

    pub fn id(&self) -> String {
        self.entity.id()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableEntityStructure> {
        self.entities.iter().filter_map(EntityStructure::as_table)
    }

    pub fn contains_table(&self, table_id: &str) -> bool {
        self.tables().any(|t| t.id() == table_id)
    }

    /// Append a table, replacing an earlier structure with the same id
    pub fn upsert_table(&mut self, table: TableEntityStructure) {
        let id = table.id();
        let existing = self
            .entities
            .iter_mut()
            .find(|e| e.kind() == EntityKind::Table && e.id() == id);
        match existing {
            Some(slot) => *slot = EntityStructure::Table(table),
            None => self.entities.push(EntityStructure::Table(table)),
        }
    }
}

/// A table or schema structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityStructure {
    Table(TableEntityStructure),
    Schema(SchemaEntityStructure),
}

impl EntityStructure {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityStructure::Table(_) => EntityKind::Table,
            EntityStructure::Schema(_) => EntityKind::Schema,
        }
    }

    pub fn id(&self) -> String {
        match self {
            EntityStructure::Table(table) => table.id(),
            EntityStructure::Schema(schema) => schema.id(),
        }
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::new(self.kind(), self.id())
    }

    pub fn name(&self) -> &str {
        match self {
            EntityStructure::Table(table) => &table.entity.name,
            EntityStructure::Schema(schema) => &schema.entity.name,
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            EntityStructure::Table(table) => Entity::Table(table.entity.clone()),
            EntityStructure::Schema(schema) => Entity::Schema(schema.entity.clone()),
        }
    }

    /// Schema owning a table structure; schemas have no parent
    pub fn parent_schema(&self) -> Option<&str> {
        match self {
            EntityStructure::Table(table) => table.entity.schema_name(),
            EntityStructure::Schema(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableEntityStructure> {
        match self {
            EntityStructure::Table(table) => Some(table),
            EntityStructure::Schema(_) => None,
        }
    }

    pub fn as_schema(&self) -> Option<&SchemaEntityStructure> {
        match self {
            EntityStructure::Schema(schema) => Some(schema),
            EntityStructure::Table(_) => None,
        }
    }

    pub fn as_schema_mut(&mut self) -> Option<&mut SchemaEntityStructure> {
        match self {
            EntityStructure::Schema(schema) => Some(schema),
            EntityStructure::Table(_) => None,
        }
    }
}

impl From<TableEntityStructure> for EntityStructure {
    fn from(table: TableEntityStructure) -> Self {
        EntityStructure::Table(table)
    }
}

impl From<SchemaEntityStructure> for EntityStructure {
    fn from(schema: SchemaEntityStructure) -> Self {
        EntityStructure::Schema(schema)
    }
}

/// A foreign key edge between two columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnReference {
    /// Referencing column
    pub from: Column,
    /// Referenced column
    pub to: Column,
}

impl ColumnReference {
    pub fn new(from: Column, to: Column) -> Self {
        Self { from, to }
    }

    /// Edge identity key `{from column id}->{to column id}`
    pub fn id(&self) -> String {
        format!("{}->{}", self.from.id(), self.to.id())
    }

    /// The table on the other side of the reference, seen from `entity`
    pub fn far_side(&self, entity: &TableEntity) -> &TableEntity {
        if self.from.entity.same_as(entity) {
            &self.to.entity
        } else {
            &self.from.entity
        }
    }

    /// The reference points from a table to itself
    pub fn is_self_reference(&self) -> bool {
        self.from.entity.same_as(&self.to.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TableEntity {
        TableEntity::with_schema("public", "orders")
    }

    #[test]
    fn test_new_column_has_cleared_flags() {
        let column = ColumnStructure::new(orders(), "id");
        assert!(!column.primary_key);
        assert!(!column.foreign_key);
        assert!(!column.unique_key);
        assert!(!column.has_references);
        assert_eq!(column.id(), "public.orders.id");
    }

    #[test]
    fn test_visible_columns_filters_plain_columns() {
        let mut table = TableEntityStructure::new(orders());
        let mut id = ColumnStructure::new(orders(), "id");
        id.primary_key = true;
        table.columns.push(id);
        table.columns.push(ColumnStructure::new(orders(), "note"));

        let keys: Vec<_> = table.visible_columns(false).map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["id"]);
        assert_eq!(table.visible_columns(true).count(), 2);
    }

    #[test]
    fn test_schema_upsert_replaces_existing_table() {
        let mut schema = SchemaEntityStructure::new(SchemaEntity::new("public"));
        schema.upsert_table(TableEntityStructure::new(orders()));
        let mut updated = TableEntityStructure::new(orders());
        updated.is_composite = true;
        schema.upsert_table(updated);

        assert_eq!(schema.entities.len(), 1);
        assert!(schema.tables().next().unwrap().is_composite);
        assert!(schema.contains_table("public.orders"));
    }

    #[test]
    fn test_reference_id_and_far_side() {
        let customers = TableEntity::with_schema("public", "customers");
        let reference = ColumnReference::new(
            orders().column("customer_id"),
            customers.column("id"),
        );
        assert_eq!(
            reference.id(),
            "public.orders.customer_id->public.customers.id"
        );
        assert_eq!(reference.far_side(&orders()), &customers);
        assert_eq!(reference.far_side(&customers), &orders());
        assert!(!reference.is_self_reference());
    }

    #[test]
    fn test_entity_structure_serializes_with_type_tag() {
        let structure = EntityStructure::Table(TableEntityStructure::new(orders()));
        let json = serde_json::to_value(&structure).unwrap();
        assert_eq!(json["type"], "table");
        assert_eq!(json["name"], "orders");
        assert_eq!(json["schema"], "public");

        let back: EntityStructure = serde_json::from_value(json).unwrap();
        assert_eq!(back, structure);
    }
}
