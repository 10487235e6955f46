//! Schema streaming
//!
//! A [`SchemaStreamer`] owns the structural model of a session and starts
//! [`SchemaStream`]s that discover tables incrementally. Each pull fetches
//! tables until at least `min_batch_size` entities and keys are pending.

mod batch;
mod options;
mod streamer;


pub use batch::{StreamBatch, StreamStats};
pub use options::{DEFAULT_MIN_BATCH_SIZE, StreamMode, StreamOptions};
pub use streamer::{SchemaStream, SchemaStreamer, SharedStructuralModel};
