//! Schema diagram
//!
//! Turns streamed structures into canvas nodes and edges and owns the view
//! state that is not structural: positions, visibility, selection, zoom and
//! the column display mode.

mod visibility;


use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use erdscope_core::{
    ColumnReference, DiagramState, EntityId, EntityKind, EntityState, EntityStructure, ErdError,
    Position, Result,
};
use erdscope_schema::{SchemaStreamer, StreamOptions};
use erdscope_settings::PreferencesFile;
use indexmap::IndexMap;

use crate::canvas::{DiagramCanvas, RasterRequest};
use crate::edges::{EdgeParams, NodeGeometry, edge_params};
use crate::export::{GeneratedImage, ImageOptions};
use crate::geometry::{
    MAX_ZOOM, MIN_ZOOM, ZOOM_STEP, rect_of_nodes, thickness_multiplier, transform_for_bounds,
    zoom_label,
};
use crate::layout::{LayeredLayout, LayoutEdge, LayoutNode, LayoutSolver};
use crate::node::{DiagramEdge, DiagramNode, NodeMeasurement, Rect, Viewport};

/// Horizontal gap between schema containers
pub const SCHEMA_GAP: f64 = 100.0;

/// Layout group of tables without a schema
pub const DEFAULT_GROUP: &str = "default";

/// Zoom limits used when fitting an exported image
const IMAGE_MIN_ZOOM: f64 = 0.1;
const IMAGE_MAX_ZOOM: f64 = 2.0;
const IMAGE_PADDING: f64 = 0.1;

/// Holds the image generation flag, on the diagram and on the canvas, until
/// export finishes or fails
struct GeneratingImage {
    flag: Arc<AtomicBool>,
    canvas: Arc<dyn DiagramCanvas>,
}

impl GeneratingImage {
    fn start(flag: &Arc<AtomicBool>, canvas: &Arc<dyn DiagramCanvas>) -> Self {
        flag.store(true, Ordering::Release);
        canvas.set_generating_image(true);
        Self {
            flag: flag.clone(),
            canvas: canvas.clone(),
        }
    }
}

impl Drop for GeneratingImage {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.canvas.set_generating_image(false);
    }
}

/// Diagram state engine
pub struct SchemaDiagram {
    canvas: Arc<dyn DiagramCanvas>,
    layout: Box<dyn LayoutSolver>,
    preferences: Option<PreferencesFile>,
    nodes: IndexMap<EntityId, DiagramNode>,
    edges: IndexMap<String, DiagramEdge>,
    show_all_columns: bool,
    generating_image: Arc<AtomicBool>,
}

impl SchemaDiagram {
    pub fn new(canvas: Arc<dyn DiagramCanvas>) -> Self {
        Self {
            canvas,
            layout: Box::new(LayeredLayout::default()),
            preferences: None,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            show_all_columns: false,
            generating_image: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_layout(mut self, layout: Box<dyn LayoutSolver>) -> Self {
        self.layout = layout;
        self
    }

    /// Load the column display mode from `preferences` and persist it there
    /// on every toggle
    pub fn with_preferences(mut self, preferences: PreferencesFile) -> Self {
        match preferences.load() {
            Ok(loaded) => self.show_all_columns = loaded.show_all_columns,
            Err(e) => tracing::warn!(error = %e, "failed to load diagram preferences"),
        }
        self.canvas.set_show_all_columns(self.show_all_columns);
        self.preferences = Some(preferences);
        self
    }

    // ========== Nodes and edges ==========

    /// Add streamed entities.
    ///
    /// Re-adding a known entity replaces its data and keeps its position and
    /// visibility. Schema visibility is recomputed whenever tables arrive.
    /// Returns the number of nodes created.
    pub fn add_entities(&mut self, structures: impl IntoIterator<Item = EntityStructure>) -> usize {
        let mut added = Vec::new();
        let mut replaced = false;
        let mut tables_changed = false;

        for structure in structures {
            tables_changed |= structure.kind() == EntityKind::Table;
            if let EntityStructure::Table(table) = &structure
                && let Some(schema) = table.entity.schema_name()
                && let Some(schema_node) = self.nodes.get_mut(&EntityId::schema(schema))
                && let Some(container) = schema_node.data.as_schema_mut()
            {
                container.upsert_table(table.clone());
            }

            let key = structure.entity_id();
            match self.nodes.get_mut(&key) {
                Some(node) => {
                    node.data = structure;
                    replaced = true;
                }
                None => {
                    let node = DiagramNode::new(structure);
                    added.push(node.clone());
                    self.nodes.insert(key, node);
                }
            }
        }

        if !added.is_empty() {
            tracing::debug!(count = added.len(), "adding diagram nodes");
            self.canvas.add_nodes(&added);
        }
        let cascaded = tables_changed && visibility::cascade_schema_visibility(&mut self.nodes);
        if replaced || cascaded {
            self.push_nodes();
        }
        added.len()
    }

    /// Add foreign keys as edges. A key with a known id replaces the edge.
    pub fn add_keys(&mut self, references: impl IntoIterator<Item = ColumnReference>) {
        let edges: Vec<DiagramEdge> = references.into_iter().map(DiagramEdge::new).collect();
        if edges.is_empty() {
            return;
        }
        for edge in &edges {
            self.edges.insert(edge.id.clone(), edge.clone());
        }
        self.canvas.add_edges(&edges);
    }

    /// Stream into the diagram, adding every batch as it arrives.
    ///
    /// Returns the number of batches received.
    pub async fn stream_into(
        &mut self,
        streamer: &SchemaStreamer,
        options: StreamOptions,
    ) -> Result<usize> {
        let mut stream = streamer.stream(options);
        let mut batches = 0;
        while let Some(batch) = stream.next_batch().await {
            let batch = batch?;
            self.add_entities(batch.entities);
            self.add_keys(batch.keys);
            batches += 1;
        }
        Ok(batches)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DiagramNode> {
        self.nodes.values()
    }

    pub fn node(&self, id: &EntityId) -> Option<&DiagramNode> {
        self.nodes.get(id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &DiagramEdge> {
        self.edges.values()
    }

    pub fn edge(&self, id: &str) -> Option<&DiagramEdge> {
        self.edges.get(id)
    }

    /// Every entity on the diagram, in the order it was added
    pub fn entities(&self) -> impl Iterator<Item = &EntityStructure> {
        self.nodes.values().map(|node| &node.data)
    }

    pub fn hidden_entities(&self) -> Vec<&EntityStructure> {
        self.nodes
            .values()
            .filter(|node| node.hidden)
            .map(|node| &node.data)
            .collect()
    }

    /// Forget every node and edge
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.canvas.reset();
    }

    fn push_nodes(&self) {
        let nodes: Vec<DiagramNode> = self.nodes.values().cloned().collect();
        self.canvas.set_nodes(&nodes);
    }

    fn apply_measurements(&mut self, measurements: &[NodeMeasurement]) {
        for measurement in measurements {
            if let Some(node) = self.nodes.get_mut(&measurement.id) {
                node.apply_measurement(measurement);
            }
        }
    }

    /// Position of a node on the canvas, resolving its parent chain
    pub fn absolute_position(&self, node: &DiagramNode) -> Position {
        let mut position = node.position;
        let mut parent = node.parent_id.as_deref();
        while let Some(parent_id) = parent {
            let Some(parent_node) = self.nodes.get(&EntityId::schema(parent_id)) else {
                break;
            };
            position = position.offset(parent_node.position);
            parent = parent_node.parent_id.as_deref();
        }
        position
    }

    fn absolute_rect(&self, node: &DiagramNode) -> Rect {
        Rect::from_position(self.absolute_position(node), node.size())
    }

    // ========== Layout ==========

    /// Lay out the tables of each schema independently.
    ///
    /// Tables without a schema form their own group. Only edges inside a
    /// group take part in its layout.
    pub fn layout(&mut self) {
        let mut groups: IndexMap<String, Vec<EntityId>> = IndexMap::new();
        for (key, node) in &self.nodes {
            if let Some(table) = node.table_entity() {
                let group = table.schema_name().unwrap_or(DEFAULT_GROUP);
                groups.entry(group.to_string()).or_default().push(key.clone());
            }
        }

        for (group, keys) in &groups {
            let layout_nodes: Vec<LayoutNode> = keys
                .iter()
                .filter_map(|key| self.nodes.get(key))
                .map(|node| LayoutNode {
                    id: node.id.clone(),
                    size: node.size(),
                })
                .collect();
            let members: HashSet<&str> =
                layout_nodes.iter().map(|n| n.id.as_str()).collect();
            let layout_edges: Vec<LayoutEdge> = self
                .edges
                .values()
                .filter(|e| members.contains(e.source.as_str()) && members.contains(e.target.as_str()))
                .map(|e| LayoutEdge {
                    source: e.source.clone(),
                    target: e.target.clone(),
                })
                .collect();

            let positions = self.layout.solve(&layout_nodes, &layout_edges);
            tracing::debug!(group = %group, tables = layout_nodes.len(), "laid out group");

            for key in keys {
                if let Some(node) = self.nodes.get_mut(key)
                    && let Some(position) = positions.get(&node.id)
                {
                    node.position = *position;
                }
            }
        }

        self.push_nodes();
    }

    /// Place schema containers left to right in the order they were added,
    /// each one gap past the previous container's measured width.
    ///
    /// Hidden schemas take no slot and keep their position.
    pub async fn layout_schema(&mut self) {
        self.canvas.next_frame().await;

        let schema_ids: Vec<EntityId> = self
            .nodes
            .values()
            .filter(|node| node.is_schema())
            .map(DiagramNode::entity_id)
            .collect();
        let measurements = self.canvas.measure(&schema_ids).await;
        self.apply_measurements(&measurements);

        let widths: HashMap<EntityId, f64> = schema_ids
            .iter()
            .map(|id| (id.clone(), self.schema_width(id)))
            .collect();

        let mut offset = 0.0;
        for (key, node) in self.nodes.iter_mut() {
            if !node.is_schema() || node.hidden {
                continue;
            }
            node.position = Position::new(offset, 0.0);
            offset += widths.get(key).copied().unwrap_or_default() + SCHEMA_GAP;
        }

        self.push_nodes();
    }

    /// Measured width of a schema container, or the extent of its visible
    /// tables when the canvas did not report one
    fn schema_width(&self, id: &EntityId) -> f64 {
        if let Some(dimensions) = self.nodes.get(id).and_then(|n| n.dimensions)
            && dimensions.width > 0.0
        {
            return dimensions.width;
        }
        let children = self
            .nodes
            .values()
            .filter(|n| !n.hidden && n.parent_id.as_deref() == Some(id.id.as_str()))
            .map(|n| Rect::from_position(n.position, n.size()));
        let bounds = rect_of_nodes(children);
        bounds.right().max(0.0)
    }

    // ========== Column display ==========

    pub fn show_all_columns(&self) -> bool {
        self.show_all_columns
    }

    /// Switch between showing all columns and only key columns.
    ///
    /// Table sizes depend on their content, so every visible table is
    /// re-measured once after its pinned size is released and once more
    /// after the new content settles. Returns the new mode.
    pub async fn toggle_show_all_columns(&mut self) -> bool {
        self.set_show_all_columns(!self.show_all_columns).await;
        self.show_all_columns
    }

    pub async fn set_show_all_columns(&mut self, show_all: bool) {
        self.show_all_columns = show_all;
        self.persist_show_all_columns();
        self.canvas.set_show_all_columns(show_all);

        let visible_tables: Vec<EntityId> = self
            .nodes
            .values()
            .filter(|node| node.is_table() && !node.hidden)
            .map(DiagramNode::entity_id)
            .collect();
        for key in &visible_tables {
            if let Some(node) = self.nodes.get_mut(key) {
                node.fixed_size = None;
            }
        }
        self.push_nodes();

        self.canvas.next_frame().await;
        let measurements = self.canvas.measure(&visible_tables).await;
        self.apply_measurements(&measurements);

        self.canvas.next_frame().await;
        let measurements = self.canvas.measure(&visible_tables).await;
        self.apply_measurements(&measurements);
        for measurement in &measurements {
            if let Some(node) = self.nodes.get_mut(&measurement.id) {
                node.fixed_size = Some(measurement.dimensions);
            }
        }
        self.push_nodes();

        self.layout_schema().await;
    }

    fn persist_show_all_columns(&self) {
        let Some(file) = &self.preferences else {
            return;
        };
        let result = file.load().and_then(|mut preferences| {
            preferences.show_all_columns = self.show_all_columns;
            file.save(&preferences)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to save diagram preferences");
        }
    }

    // ========== Selection ==========

    /// Select an entity. Unless `additive`, every other node is deselected.
    pub fn select_entity(&mut self, entity: &EntityId, additive: bool) {
        for (key, node) in self.nodes.iter_mut() {
            if key == entity {
                node.selected = !node.hidden;
            } else if !additive {
                node.selected = false;
            }
        }
        self.push_nodes();
    }

    pub fn clear_selection(&mut self) {
        for node in self.nodes.values_mut() {
            node.selected = false;
        }
        self.push_nodes();
    }

    pub fn selected_nodes(&self) -> Vec<EntityId> {
        self.nodes
            .values()
            .filter(|node| node.selected)
            .map(DiagramNode::entity_id)
            .collect()
    }

    pub fn selected_entities(&self) -> Vec<&EntityStructure> {
        self.nodes
            .values()
            .filter(|node| node.selected)
            .map(|node| &node.data)
            .collect()
    }

    // ========== Persisted state ==========

    /// Position and visibility of every node
    pub fn diagram_state(&self) -> DiagramState {
        DiagramState::new(
            self.nodes
                .values()
                .map(|node| EntityState {
                    id: node.id.clone(),
                    kind: Some(node.kind),
                    position: node.position,
                    hidden: node.hidden,
                })
                .collect(),
        )
    }

    /// Restore a saved state onto the current nodes.
    ///
    /// Nodes missing from `state` keep their current placement and entries
    /// for unknown nodes are skipped. States from another version are
    /// rejected without changing anything.
    pub fn set_diagram_state(&mut self, state: &DiagramState) -> Result<()> {
        state.ensure_supported()?;

        for entry in &state.entities {
            let mut applied = false;
            for kind in [EntityKind::Table, EntityKind::Schema] {
                if !entry.kind.is_none_or(|k| k == kind) {
                    continue;
                }
                if let Some(node) = self.nodes.get_mut(&EntityId::new(kind, entry.id.clone())) {
                    node.position = entry.position;
                    node.hidden = entry.hidden;
                    if entry.hidden {
                        node.selected = false;
                    }
                    applied = true;
                }
            }
            if !applied {
                tracing::debug!(id = %entry.id, "skipping state of unknown entity");
            }
        }

        visibility::cascade_schema_visibility(&mut self.nodes);
        self.push_nodes();
        Ok(())
    }

    // ========== Viewport ==========

    pub fn viewport(&self) -> Viewport {
        self.canvas.viewport()
    }

    pub fn zoom_value(&self) -> f64 {
        self.viewport().zoom
    }

    /// Zoom as a percentage, e.g. `"83%"`
    pub fn zoom_level(&self) -> String {
        zoom_label(self.zoom_value())
    }

    pub fn thickness_multiplier(&self) -> f64 {
        thickness_multiplier(self.zoom_value())
    }

    /// Zoom to `percent` (100 is 1:1)
    pub fn zoom_to(&self, percent: f64) {
        self.set_zoom(percent / 100.0);
    }

    pub fn zoom_in(&self) {
        self.set_zoom(self.zoom_value() * ZOOM_STEP);
    }

    pub fn zoom_out(&self) {
        self.set_zoom(self.zoom_value() / ZOOM_STEP);
    }

    fn set_zoom(&self, zoom: f64) {
        let viewport = self.viewport();
        self.canvas.set_viewport(Viewport {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            ..viewport
        });
    }

    /// Bounds of every node on the canvas
    pub fn rect_of_diagram(&self) -> Rect {
        rect_of_nodes(self.nodes.values().map(|node| self.absolute_rect(node)))
    }

    /// Endpoints of a drawn edge, if both of its tables are on the diagram
    pub fn edge_params(&self, edge_id: &str) -> Option<EdgeParams> {
        let edge = self.edges.get(edge_id)?;
        let source = self.nodes.get(&EntityId::new(EntityKind::Table, edge.source.clone()))?;
        let target = self.nodes.get(&EntityId::new(EntityKind::Table, edge.target.clone()))?;
        Some(edge_params(
            &self.geometry(source),
            &self.geometry(target),
            &edge.data,
        ))
    }

    fn geometry<'a>(&self, node: &'a DiagramNode) -> NodeGeometry<'a> {
        NodeGeometry {
            position: self.absolute_position(node),
            dimensions: node.size(),
            handles: &node.handles,
        }
    }

    // ========== Export ==========

    pub fn generating_image(&self) -> bool {
        self.generating_image.load(Ordering::Acquire)
    }

    /// Shared view of the export flag for readers that do not own the diagram
    pub fn generating_image_flag(&self) -> Arc<AtomicBool> {
        self.generating_image.clone()
    }

    /// Render every visible node into a PNG
    pub async fn generate_image(&mut self, options: ImageOptions) -> Result<GeneratedImage> {
        let _generating = GeneratingImage::start(&self.generating_image, &self.canvas);
        self.canvas.next_frame().await;

        let bounds = rect_of_nodes(
            self.nodes
                .values()
                .filter(|node| !node.hidden)
                .map(|node| self.absolute_rect(node)),
        );
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return Err(ErdError::image("no visible nodes to export"));
        }

        let width = bounds.width.ceil() as u32;
        let height = bounds.height.ceil() as u32;
        let transform = transform_for_bounds(
            bounds,
            width as f64,
            height as f64,
            IMAGE_MIN_ZOOM,
            IMAGE_MAX_ZOOM,
            IMAGE_PADDING,
        );

        tracing::info!(width, height, scale = options.pixel_ratio(), "generating diagram image");
        let raster = self
            .canvas
            .rasterize(RasterRequest {
                bounds,
                width,
                height,
                transform,
                pixel_ratio: options.pixel_ratio(),
                background: options.background,
            })
            .await?;

        let image = match &options.footer {
            Some(footer) => footer.append_to(&raster),
            None => raster,
        };
        GeneratedImage::encode(&image)
    }
}
