//! Floating edges
//!
//! Edges attach to whichever side of a table faces the other table, at the
//! handle of the referenced column.

use erdscope_core::{Column, ColumnReference, Position};

use crate::node::{Dimensions, HandleBounds, Rect, Side, column_handle_id};

/// Absolute placement of a rendered node
#[derive(Debug, Clone, Copy)]
pub struct NodeGeometry<'a> {
    pub position: Position,
    pub dimensions: Dimensions,
    pub handles: &'a [HandleBounds],
}

impl NodeGeometry<'_> {
    fn center(&self) -> Position {
        Rect::from_position(self.position, self.dimensions).center()
    }
}

/// Endpoints of a floating edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
    pub source_side: Side,
    pub target_side: Side,
}

pub fn edge_params(
    source: &NodeGeometry<'_>,
    target: &NodeGeometry<'_>,
    reference: &ColumnReference,
) -> EdgeParams {
    let (source_point, source_side) = endpoint(source, target, &reference.from);
    let (target_point, target_side) = endpoint(target, source, &reference.to);
    EdgeParams {
        sx: source_point.x,
        sy: source_point.y,
        tx: target_point.x,
        ty: target_point.y,
        source_side,
        target_side,
    }
}

fn facing_side(node: &NodeGeometry<'_>, other: &NodeGeometry<'_>) -> Side {
    let a = node.center();
    let b = other.center();
    if (a.x - b.x).abs() > (a.y - b.y).abs() {
        if a.x > b.x { Side::Left } else { Side::Right }
    } else if a.y > b.y {
        Side::Top
    } else {
        Side::Bottom
    }
}

fn endpoint(node: &NodeGeometry<'_>, other: &NodeGeometry<'_>, column: &Column) -> (Position, Side) {
    let side = facing_side(node, other);
    let handle = if side.is_horizontal() {
        let id = column_handle_id(side, column);
        node.handles
            .iter()
            .find(|h| h.id.as_deref() == Some(id.as_str()))
    } else {
        node.handles.iter().find(|h| h.side == side)
    };

    let Some(handle) = handle else {
        return (Position::default(), side);
    };

    let (offset_x, offset_y) = match side {
        Side::Left => (0.0, handle.height / 2.0),
        Side::Right => (handle.width, handle.height / 2.0),
        Side::Top => (handle.width / 2.0, 0.0),
        Side::Bottom => (handle.width / 2.0, handle.height),
    };
    let point = Position::new(
        node.position.x + handle.x + offset_x,
        node.position.y + handle.y + offset_y,
    );
    (point, side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erdscope_core::TableEntity;

    fn handle(id: Option<String>, side: Side, x: f64, y: f64) -> HandleBounds {
        HandleBounds {
            id,
            side,
            x,
            y,
            width: 8.0,
            height: 8.0,
        }
    }

    fn reference() -> ColumnReference {
        ColumnReference::new(
            TableEntity::new("orders").column("customer_id"),
            TableEntity::new("customers").column("id"),
        )
    }

    fn handles_for(column: &Column) -> Vec<HandleBounds> {
        vec![
            handle(Some(column_handle_id(Side::Left, column)), Side::Left, -4.0, 30.0),
            handle(Some(column_handle_id(Side::Right, column)), Side::Right, 96.0, 30.0),
            handle(None, Side::Top, 46.0, -4.0),
            handle(None, Side::Bottom, 46.0, 46.0),
        ]
    }

    #[test]
    fn test_horizontal_neighbours_use_column_handles() {
        let reference = reference();
        let source_handles = handles_for(&reference.from);
        let target_handles = handles_for(&reference.to);
        let source = NodeGeometry {
            position: Position::new(0.0, 0.0),
            dimensions: Dimensions::new(100.0, 50.0),
            handles: &source_handles,
        };
        let target = NodeGeometry {
            position: Position::new(300.0, 20.0),
            dimensions: Dimensions::new(100.0, 50.0),
            handles: &target_handles,
        };

        let params = edge_params(&source, &target, &reference);
        assert_eq!(params.source_side, Side::Right);
        assert_eq!(params.target_side, Side::Left);
        assert_eq!((params.sx, params.sy), (104.0, 34.0));
        assert_eq!((params.tx, params.ty), (296.0, 54.0));
    }

    #[test]
    fn test_vertical_neighbours_use_side_handles() {
        let reference = reference();
        let source_handles = handles_for(&reference.from);
        let target_handles = handles_for(&reference.to);
        let source = NodeGeometry {
            position: Position::new(0.0, 0.0),
            dimensions: Dimensions::new(100.0, 50.0),
            handles: &source_handles,
        };
        let target = NodeGeometry {
            position: Position::new(10.0, 400.0),
            dimensions: Dimensions::new(100.0, 50.0),
            handles: &target_handles,
        };

        let params = edge_params(&source, &target, &reference);
        assert_eq!(params.source_side, Side::Bottom);
        assert_eq!(params.target_side, Side::Top);
        assert_eq!((params.sx, params.sy), (50.0, 54.0));
        assert_eq!((params.tx, params.ty), (60.0, 396.0));
    }

    #[test]
    fn test_missing_handle_yields_origin() {
        let reference = reference();
        let source = NodeGeometry {
            position: Position::new(0.0, 0.0),
            dimensions: Dimensions::new(100.0, 50.0),
            handles: &[],
        };
        let target = NodeGeometry {
            position: Position::new(300.0, 0.0),
            dimensions: Dimensions::new(100.0, 50.0),
            handles: &[],
        };

        let params = edge_params(&source, &target, &reference);
        assert_eq!((params.sx, params.sy, params.tx, params.ty), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(params.source_side, Side::Right);
    }
}
