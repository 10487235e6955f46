//! Presentation layer interface

use async_trait::async_trait;
use erdscope_core::{EntityId, Result};
use image::{Rgba, RgbaImage};

use crate::node::{DiagramEdge, DiagramNode, NodeMeasurement, Rect, Viewport};

/// Region of the diagram to render into an image
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest {
    /// Diagram-space bounds being captured
    pub bounds: Rect,
    /// Output size in diagram units, before `pixel_ratio`
    pub width: u32,
    pub height: u32,
    /// Transform that maps `bounds` into the output area
    pub transform: Viewport,
    pub pixel_ratio: f64,
    pub background: Rgba<u8>,
}

/// The rendering surface the diagram is drawn on.
///
/// Node and edge pushes are fire-and-forget; sizes are only known after a
/// render pass, so measuring is a two-step protocol of
/// [`DiagramCanvas::next_frame`] followed by [`DiagramCanvas::measure`].
#[async_trait]
pub trait DiagramCanvas: Send + Sync {
    /// New nodes were created
    fn add_nodes(&self, nodes: &[DiagramNode]);

    /// Edges were created or replaced
    fn add_edges(&self, edges: &[DiagramEdge]);

    /// Replace the full node set
    fn set_nodes(&self, nodes: &[DiagramNode]);

    /// Drop every node and edge
    fn reset(&self);

    fn viewport(&self) -> Viewport;

    fn set_viewport(&self, viewport: Viewport);

    /// Whether table nodes render all columns or only key columns
    fn set_show_all_columns(&self, _show_all: bool) {}

    /// An image export started or finished. Nodes may drop interactive
    /// decorations such as selection outlines while it is set.
    fn set_generating_image(&self, _generating: bool) {}

    /// Resolve once pending changes have been rendered
    async fn next_frame(&self);

    /// Rendered size and handles of the given nodes. Nodes that are not
    /// rendered are left out.
    async fn measure(&self, ids: &[EntityId]) -> Vec<NodeMeasurement>;

    /// Render a region of the diagram
    async fn rasterize(&self, request: RasterRequest) -> Result<RgbaImage>;
}
