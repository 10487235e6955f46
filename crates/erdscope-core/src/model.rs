//! Structural model
//!
//! The authoritative record of everything discovered during a session.
//! Entries are only ever added or refreshed, never removed, until the model
//! is cleared for a new session.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::entity::{Column, SchemaEntity, TableEntity};
use crate::structure::{ColumnStructure, SchemaEntityStructure, TableEntityStructure};

/// In-memory graph of discovered tables, schemas and columns
#[derive(Debug, Clone, Default)]
pub struct StructuralModel {
    /// Tables by canonical table id, in discovery order
    tables: IndexMap<String, TableEntityStructure>,
    /// Schemas by name, in discovery order
    schemas: IndexMap<String, SchemaEntityStructure>,
    /// Columns by column identity key
    columns: HashMap<String, ColumnStructure>,
}

impl StructuralModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Schemas ==========

    /// Create the schema structure if it is not known yet.
    ///
    /// Returns `true` when the schema was created by this call.
    pub fn ensure_schema(&mut self, name: &str) -> bool {
        if self.schemas.contains_key(name) {
            return false;
        }
        self.schemas.insert(
            name.to_string(),
            SchemaEntityStructure::new(SchemaEntity::new(name)),
        );
        true
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaEntityStructure> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &SchemaEntityStructure> {
        self.schemas.values()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    // ========== Tables ==========

    /// Register a finished table structure.
    ///
    /// Refreshes its columns in the column map and appends it to its schema
    /// structure, creating the schema on first sight.
    pub fn register_table(&mut self, table: TableEntityStructure) {
        for column in &table.columns {
            self.register_column(column.clone());
        }

        if let Some(schema) = table.entity.schema_name() {
            let schema = schema.to_string();
            self.ensure_schema(&schema);
            if let Some(structure) = self.schemas.get_mut(&schema) {
                structure.upsert_table(table.clone());
            }
        }

        self.tables.insert(table.id(), table);
    }

    pub fn table(&self, entity: &TableEntity) -> Option<&TableEntityStructure> {
        self.tables.get(&entity.id())
    }

    pub fn table_by_id(&self, id: &str) -> Option<&TableEntityStructure> {
        self.tables.get(id)
    }

    pub fn contains_table(&self, entity: &TableEntity) -> bool {
        self.tables.contains_key(&entity.id())
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableEntityStructure> {
        self.tables.values()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // ========== Columns ==========

    /// Insert or refresh a column keyed by its identity key
    pub fn register_column(&mut self, column: ColumnStructure) {
        self.columns.insert(column.id(), column);
    }

    pub fn find_column(&self, column: &Column) -> Option<&ColumnStructure> {
        self.columns.get(&column.id())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Forget everything discovered so far
    pub fn clear(&mut self) {
        tracing::debug!(
            tables = self.tables.len(),
            schemas = self.schemas.len(),
            "clearing structural model"
        );
        self.tables.clear();
        self.schemas.clear();
        self.columns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_column(schema: Option<&str>, name: &str, column: &str) -> TableEntityStructure {
        let entity = TableEntity::from_parts(schema, name);
        let mut table = TableEntityStructure::new(entity.clone());
        table.columns.push(ColumnStructure::new(entity, column));
        table
    }

    #[test]
    fn test_ensure_schema_reports_creation_once() {
        let mut model = StructuralModel::new();
        assert!(model.ensure_schema("public"));
        assert!(!model.ensure_schema("public"));
        assert_eq!(model.schema_count(), 1);
    }

    #[test]
    fn test_register_table_populates_schema_and_columns() {
        let mut model = StructuralModel::new();
        model.register_table(table_with_column(Some("public"), "orders", "id"));

        let schema = model.schema("public").expect("schema created lazily");
        assert!(schema.contains_table("public.orders"));
        let column = TableEntity::with_schema("public", "orders").column("id");
        assert!(model.find_column(&column).is_some());
        assert_eq!(model.table_count(), 1);
    }

    #[test]
    fn test_unnamespaced_table_has_no_schema() {
        let mut model = StructuralModel::new();
        model.register_table(table_with_column(None, "orders", "id"));
        assert_eq!(model.schema_count(), 0);
        assert!(model.table_by_id("orders").is_some());
    }

    #[test]
    fn test_table_and_schema_with_same_name_coexist() {
        let mut model = StructuralModel::new();
        model.register_table(table_with_column(None, "sales", "id"));
        model.ensure_schema("sales");
        assert!(model.table_by_id("sales").is_some());
        assert!(model.schema("sales").is_some());
    }

    #[test]
    fn test_register_column_refreshes_flags() {
        let mut model = StructuralModel::new();
        let entity = TableEntity::new("orders");
        model.register_column(ColumnStructure::new(entity.clone(), "id"));
        let mut updated = ColumnStructure::new(entity.clone(), "id");
        updated.primary_key = true;
        model.register_column(updated);

        assert!(model.find_column(&entity.column("id")).unwrap().primary_key);
        assert_eq!(model.column_count(), 1);
    }
}
