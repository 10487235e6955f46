//! Presentation-layer nodes and edges

use erdscope_core::{
    ColumnReference, EntityId, EntityKind, EntityStructure, Position, TableEntity,
};
use serde::{Deserialize, Serialize};

/// Rendered size of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle in diagram coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_position(position: Position, size: Dimensions) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Pan and zoom of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Side of a node an edge attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// A connection handle as laid out by the canvas, relative to its node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleBounds {
    /// `{side}-{column id}` for column handles
    pub id: Option<String>,
    pub side: Side,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Id of the handle for a column on the left or right side of its table
pub fn column_handle_id(side: Side, column: &erdscope_core::Column) -> String {
    format!("{}-{}", side.as_str(), column.id())
}

/// Size and handles of a rendered node, as reported by the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeasurement {
    pub id: EntityId,
    pub dimensions: Dimensions,
    pub handles: Vec<HandleBounds>,
}

/// A table or schema as presented on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    /// Canonical entity id
    pub id: String,
    pub kind: EntityKind,
    pub data: EntityStructure,
    /// Relative to the parent node when `parent_id` is set
    pub position: Position,
    pub hidden: bool,
    pub selected: bool,
    /// Owning schema node of a table
    pub parent_id: Option<String>,
    /// Last measured size
    pub dimensions: Option<Dimensions>,
    /// Size pinned on the rendered node; released while re-measuring
    pub fixed_size: Option<Dimensions>,
    pub handles: Vec<HandleBounds>,
}

impl DiagramNode {
    pub fn new(data: EntityStructure) -> Self {
        let parent_id = match &data {
            EntityStructure::Table(table) => table.entity.schema_name().map(str::to_string),
            EntityStructure::Schema(_) => None,
        };
        Self {
            id: data.id(),
            kind: data.kind(),
            data,
            position: Position::default(),
            hidden: false,
            selected: false,
            parent_id,
            dimensions: None,
            fixed_size: None,
            handles: Vec::new(),
        }
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::new(self.kind, self.id.clone())
    }

    pub fn is_table(&self) -> bool {
        self.kind == EntityKind::Table
    }

    pub fn is_schema(&self) -> bool {
        self.kind == EntityKind::Schema
    }

    /// Measured size, zero if never measured
    pub fn size(&self) -> Dimensions {
        self.dimensions.unwrap_or_default()
    }

    pub fn table_entity(&self) -> Option<&TableEntity> {
        self.data.as_table().map(|t| &t.entity)
    }

    pub fn apply_measurement(&mut self, measurement: &NodeMeasurement) {
        self.dimensions = Some(measurement.dimensions);
        self.handles = measurement.handles.clone();
    }
}

/// A foreign key drawn between two table nodes
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramEdge {
    pub id: String,
    /// Referencing table id
    pub source: String,
    /// Referenced table id
    pub target: String,
    pub data: ColumnReference,
}

impl DiagramEdge {
    pub fn new(reference: ColumnReference) -> Self {
        Self {
            id: reference.id(),
            source: reference.from.entity.id(),
            target: reference.to.entity.id(),
            data: reference,
        }
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}
