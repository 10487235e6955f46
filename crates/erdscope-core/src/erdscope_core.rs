//! erdscope Core - Structural types shared by the schema explorer
//!
//! This crate defines:
//!
//! - `Entity` / `TableEntity` / `SchemaEntity` and the canonical id scheme
//! - Structures discovered by streaming (`TableEntityStructure`, `ColumnReference`, ...)
//! - `StructuralModel` - the record of everything discovered in a session
//! - `MetadataProvider` - the host's database introspection interface
//! - `DiagramState` - the persisted view state

mod entity;
mod error;
mod model;
mod provider;
mod state;
mod structure;
pub mod system_schemas;

pub use entity::*;
pub use error::*;
pub use model::*;
pub use provider::*;
pub use state::*;
pub use structure::*;
pub use system_schemas::{DatabaseType, is_system_schema};
