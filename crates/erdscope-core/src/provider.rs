//! Metadata provider interface
//!
//! The host application exposes its database introspection through this
//! trait. Every call may fail independently; callers decide which failures
//! are fatal.

use crate::Result;
use crate::entity::TableEntity;
use crate::system_schemas::DatabaseType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata provider interface
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List all tables in a schema, or in the default schema when `None`
    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableEntity>>;

    /// Get columns for a table
    async fn list_columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Get indexes for a table
    async fn list_indexes(&self, schema: Option<&str>, table: &str) -> Result<Vec<IndexInfo>>;

    /// Get primary key columns for a table
    ///
    /// Some databases report primary keys without matching index metadata,
    /// so this is queried in addition to [`MetadataProvider::list_indexes`].
    async fn list_primary_keys(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<PrimaryKeyColumn>>;

    /// Foreign keys referencing this table
    async fn list_incoming_keys(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<TableKey>>;

    /// Foreign keys declared on this table
    async fn list_outgoing_keys(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<TableKey>>;

    /// Name of the connection's default schema
    async fn get_default_schema(&self) -> Result<String>;

    /// List all schemas in the current database.
    /// Default returns an empty list for databases without schemas.
    async fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// The kind of database behind the connection, if known
    fn database_type(&self) -> Option<DatabaseType> {
        None
    }
}

/// Column information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: Option<String>,
    pub ordinal_position: u32,
    pub nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal_position: u32) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
            ordinal_position,
            nullable: false,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Index information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: Option<String>,
    pub primary: bool,
    pub unique: bool,
    pub columns: Vec<IndexColumn>,
}

impl IndexInfo {
    /// A primary key index over `columns`
    pub fn primary<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            primary: true,
            unique: true,
            columns: columns.into_iter().map(IndexColumn::new).collect(),
        }
    }

    /// A unique, non-primary index over `columns`
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            primary: false,
            unique: true,
            columns: columns.into_iter().map(IndexColumn::new).collect(),
        }
    }
}

/// Column covered by an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Column that is part of a primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyColumn {
    pub name: String,
}

impl PrimaryKeyColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A foreign key as reported by the provider
///
/// Composite keys list their columns pairwise in `from_columns` and
/// `to_columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableKey {
    pub from_table: String,
    pub from_schema: Option<String>,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_schema: Option<String>,
    pub to_columns: Vec<String>,
}

impl TableKey {
    /// A single-column foreign key `from -> to`
    pub fn single(from: &TableEntity, from_column: &str, to: &TableEntity, to_column: &str) -> Self {
        Self {
            from_table: from.name.clone(),
            from_schema: from.schema.clone(),
            from_columns: vec![from_column.to_string()],
            to_table: to.name.clone(),
            to_schema: to.schema.clone(),
            to_columns: vec![to_column.to_string()],
        }
    }

    pub fn from_entity(&self) -> TableEntity {
        TableEntity::from_parts(self.from_schema.as_deref(), self.from_table.clone())
    }

    pub fn to_entity(&self) -> TableEntity {
        TableEntity::from_parts(self.to_schema.as_deref(), self.to_table.clone())
    }

    /// `(from, to)` column name pairs
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.from_columns
            .iter()
            .zip(self.to_columns.iter())
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }
}
