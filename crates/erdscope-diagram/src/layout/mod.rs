//! Automatic placement of table nodes

mod layered;


use std::collections::HashMap;

use erdscope_core::Position;

use crate::node::Dimensions;

pub use layered::LayeredLayout;

/// A node to place
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub size: Dimensions,
}

/// A directed dependency between two nodes, referencing table to referenced table
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
}

/// Computes node positions for one group of nodes
pub trait LayoutSolver: Send + Sync {
    /// Returns the top-left position of every node in `nodes`.
    ///
    /// Edges whose endpoints are not both in `nodes` are ignored.
    fn solve(&self, nodes: &[LayoutNode], edges: &[LayoutEdge]) -> HashMap<String, Position>;
}
