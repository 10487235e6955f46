//! Options for a schema stream

use erdscope_core::TableEntity;
use tokio_util::sync::CancellationToken;

/// Default number of entities plus keys collected before a batch is yielded
pub const DEFAULT_MIN_BATCH_SIZE: usize = 100;

/// What a stream walks
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMode {
    /// Every table of a schema, or of the default schema when `None`
    Schema { schema: Option<String> },
    /// One table, plus its direct foreign-key neighbours when `depth >= 1`
    Table { table: TableEntity, depth: u32 },
}

impl StreamMode {
    pub fn name(&self) -> &'static str {
        match self {
            StreamMode::Schema { .. } => "schema",
            StreamMode::Table { .. } => "table",
        }
    }

    /// Schema or table being walked, empty for the default schema
    pub fn target(&self) -> String {
        match self {
            StreamMode::Schema { schema } => schema.clone().unwrap_or_default(),
            StreamMode::Table { table, .. } => table.to_string(),
        }
    }
}

impl Default for StreamMode {
    fn default() -> Self {
        StreamMode::Schema { schema: None }
    }
}

/// Configuration for [`crate::SchemaStreamer::stream`]
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// A batch is yielded once `entities + keys` reaches this size
    pub min_batch_size: usize,
    pub mode: StreamMode,
    /// Cancels the stream when triggered
    pub signal: CancellationToken,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            mode: StreamMode::default(),
            signal: CancellationToken::new(),
        }
    }
}

impl StreamOptions {
    /// Stream the default schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream every table of `schema`
    pub fn for_schema(schema: impl Into<String>) -> Self {
        Self {
            mode: StreamMode::Schema {
                schema: Some(schema.into()),
            },
            ..Self::default()
        }
    }

    /// Stream a single table and, at depth 1, its neighbours
    pub fn for_table(table: TableEntity, depth: u32) -> Self {
        Self {
            mode: StreamMode::Table { table, depth },
            ..Self::default()
        }
    }

    /// Sets the minimum batch size. Zero is treated as one.
    pub fn with_min_batch_size(mut self, size: usize) -> Self {
        self.min_batch_size = size.max(1);
        self
    }

    /// Sets the cancellation signal
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = signal;
        self
    }
}
