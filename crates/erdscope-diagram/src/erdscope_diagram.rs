//! erdscope Diagram - view state of the schema diagram
//!
//! Provides:
//! - `SchemaDiagram` - nodes, edges, visibility, selection, zoom and export
//! - `DiagramCanvas` - the rendering surface the host implements
//! - `LayoutSolver` / `LayeredLayout` - per-schema table placement
//! - Floating edge geometry and PNG export helpers

mod canvas;
mod diagram;
pub mod edges;
pub mod export;
pub mod geometry;
pub mod layout;
mod node;

pub use canvas::{DiagramCanvas, RasterRequest};
pub use diagram::{DEFAULT_GROUP, SCHEMA_GAP, SchemaDiagram};
pub use edges::{EdgeParams, NodeGeometry, edge_params};
pub use export::{GeneratedImage, ImageFooter, ImageOptions};
pub use layout::{LayeredLayout, LayoutEdge, LayoutNode, LayoutSolver};
pub use node::*;
