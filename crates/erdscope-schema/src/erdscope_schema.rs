//! erdscope Schema - incremental schema discovery
//!
//! Provides:
//! - `SchemaStreamer` - walks a schema or a table neighbourhood through a
//!   `MetadataProvider` and records the results in a `StructuralModel`
//! - `SchemaStream` - pull-based, cancellable sequence of `StreamBatch`es
//! - `StreamOptions` / `StreamMode` - what to walk and how large batches are

pub mod stream;

pub use stream::{
    DEFAULT_MIN_BATCH_SIZE, SchemaStream, SchemaStreamer, SharedStructuralModel, StreamBatch,
    StreamMode, StreamOptions, StreamStats,
};
