//! Batches yielded by a schema stream

use erdscope_core::{
    ColumnReference, EntityStructure, SchemaEntity, SchemaEntityStructure, StructuralModel,
    TableEntityStructure,
};

/// Entities and keys discovered since the previous batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamBatch {
    pub entities: Vec<EntityStructure>,
    pub keys: Vec<ColumnReference>,
}

impl StreamBatch {
    /// Number of entities plus keys
    pub fn len(&self) -> usize {
        self.entities.len() + self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.keys.is_empty()
    }
}

/// Counters for a single stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Tables whose discovery finished, neighbours included
    pub tables_discovered: usize,
    /// Provider calls that failed and were skipped
    pub partial_failures: usize,
    pub batches_yielded: usize,
}

#[derive(Debug)]
enum PendingEntity {
    /// Resolved from the model when the batch is taken, so the schema
    /// carries every table registered up to that point
    Schema(String),
    Table(TableEntityStructure),
}

/// Batch under construction
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    entities: Vec<PendingEntity>,
    keys: Vec<ColumnReference>,
}

impl PendingBatch {
    pub fn len(&self) -> usize {
        self.entities.len() + self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_schema(&mut self, name: &str) {
        self.entities.push(PendingEntity::Schema(name.to_string()));
    }

    pub fn push_table(&mut self, table: TableEntityStructure) {
        self.entities.push(PendingEntity::Table(table));
    }

    pub fn push_key(&mut self, key: ColumnReference) {
        self.keys.push(key);
    }

    /// Take the pending entries, leaving an empty batch behind
    pub fn take(&mut self, model: &StructuralModel) -> StreamBatch {
        let entities = std::mem::take(&mut self.entities)
            .into_iter()
            .map(|entry| match entry {
                PendingEntity::Schema(name) => EntityStructure::Schema(
                    model
                        .schema(&name)
                        .cloned()
                        .unwrap_or_else(|| SchemaEntityStructure::new(SchemaEntity::new(name))),
                ),
                PendingEntity::Table(table) => EntityStructure::Table(table),
            })
            .collect();

        StreamBatch {
            entities,
            keys: std::mem::take(&mut self.keys),
        }
    }
}
