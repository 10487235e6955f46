//! Top-to-bottom layered layout
//!
//! Cycles are broken by reversing a greedy feedback arc set, ranks follow
//! the longest path to a sink, and nodes within a rank are ordered by
//! barycenter sweeps before being packed left to right.

use std::collections::{HashMap, HashSet};

use erdscope_core::Position;
use petgraph::Direction;
use petgraph::algo::{greedy_feedback_arc_set, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::{LayoutEdge, LayoutNode, LayoutSolver};
use crate::node::Dimensions;

/// Layered layout with referencing tables above the tables they reference
#[derive(Debug, Clone)]
pub struct LayeredLayout {
    /// Horizontal gap between nodes of a rank
    pub node_sep: f64,
    /// Vertical gap between ranks
    pub rank_sep: f64,
    /// Size assumed for nodes that were never measured
    pub default_size: Dimensions,
    /// Ordering passes, each one down and one up
    pub sweeps: usize,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            node_sep: 100.0,
            rank_sep: 50.0,
            default_size: Dimensions::new(150.0, 50.0),
            sweeps: 4,
        }
    }
}

impl LayeredLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_sep(mut self, node_sep: f64) -> Self {
        self.node_sep = node_sep;
        self
    }

    pub fn with_rank_sep(mut self, rank_sep: f64) -> Self {
        self.rank_sep = rank_sep;
        self
    }

    fn size_of(&self, node: &LayoutNode) -> Dimensions {
        if node.size.is_empty() {
            self.default_size
        } else {
            node.size
        }
    }

    /// Build an acyclic graph over the nodes, in input order
    fn acyclic_graph(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> DiGraph<usize, ()> {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let index: HashMap<&str, NodeIndex> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), graph.add_node(i)))
            .collect();

        let mut seen = HashSet::new();
        for edge in edges {
            let (Some(&source), Some(&target)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                continue;
            };
            if source != target && seen.insert((source, target)) {
                graph.add_edge(source, target, ());
            }
        }

        let feedback: HashSet<(NodeIndex, NodeIndex)> = greedy_feedback_arc_set(&graph)
            .map(|edge| (edge.source(), edge.target()))
            .collect();
        if feedback.is_empty() {
            return graph;
        }

        let mut dag = graph.map(|_, &i| i, |_, _| ());
        dag.clear_edges();
        for edge in graph.edge_references() {
            let (source, target) = (edge.source(), edge.target());
            if feedback.contains(&(source, target)) {
                dag.update_edge(target, source, ());
            } else {
                dag.update_edge(source, target, ());
            }
        }
        dag
    }

    /// Longest-path ranking: sinks on the last rank, sources as high as their
    /// longest chain requires
    fn ranks(graph: &DiGraph<usize, ()>) -> Vec<usize> {
        let order = toposort(graph, None).unwrap_or_else(|_| graph.node_indices().collect());
        let mut height = vec![0usize; graph.node_count()];
        for &node in order.iter().rev() {
            height[node.index()] = graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|next| height[next.index()] + 1)
                .max()
                .unwrap_or(0);
        }
        let tallest = height.iter().copied().max().unwrap_or(0);
        height.into_iter().map(|h| tallest - h).collect()
    }

    /// Reorder each rank by the mean position of its neighbours in the
    /// adjacent rank
    fn order(&self, graph: &DiGraph<usize, ()>, layers: &mut [Vec<NodeIndex>]) {
        for _ in 0..self.sweeps {
            for r in 1..layers.len() {
                let (above, rest) = layers.split_at_mut(r);
                reorder(graph, &mut rest[0], &above[r - 1], Direction::Incoming);
            }
            for r in (0..layers.len().saturating_sub(1)).rev() {
                let (head, below) = layers.split_at_mut(r + 1);
                reorder(graph, &mut head[r], &below[0], Direction::Outgoing);
            }
        }
    }
}

fn reorder(
    graph: &DiGraph<usize, ()>,
    layer: &mut Vec<NodeIndex>,
    fixed: &[NodeIndex],
    direction: Direction,
) {
    let slot: HashMap<NodeIndex, usize> = fixed.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let mut keyed: Vec<(f64, NodeIndex)> = layer
        .iter()
        .enumerate()
        .map(|(current, &node)| {
            let positions: Vec<usize> = graph
                .neighbors_directed(node, direction)
                .filter_map(|n| slot.get(&n).copied())
                .collect();
            let key = if positions.is_empty() {
                current as f64
            } else {
                positions.iter().sum::<usize>() as f64 / positions.len() as f64
            };
            (key, node)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    *layer = keyed.into_iter().map(|(_, node)| node).collect();
}

impl LayoutSolver for LayeredLayout {
    fn solve(&self, nodes: &[LayoutNode], edges: &[LayoutEdge]) -> HashMap<String, Position> {
        if nodes.is_empty() {
            return HashMap::new();
        }

        let graph = Self::acyclic_graph(nodes, edges);
        let ranks = Self::ranks(&graph);
        let rank_count = ranks.iter().copied().max().unwrap_or(0) + 1;

        let mut layers: Vec<Vec<NodeIndex>> = vec![Vec::new(); rank_count];
        for node in graph.node_indices() {
            layers[ranks[node.index()]].push(node);
        }
        self.order(&graph, &mut layers);

        let size = |node: NodeIndex| self.size_of(&nodes[graph[node]]);
        let layer_width = |layer: &[NodeIndex]| {
            let widths: f64 = layer.iter().map(|&n| size(n).width).sum();
            widths + self.node_sep * layer.len().saturating_sub(1) as f64
        };
        let widest = layers
            .iter()
            .map(|layer| layer_width(layer))
            .fold(0.0, f64::max);

        let mut positions = HashMap::with_capacity(nodes.len());
        let mut y = 0.0;
        for layer in &layers {
            let mut x = (widest - layer_width(layer)) / 2.0;
            let mut tallest: f64 = 0.0;
            for &node in layer {
                let dimensions = size(node);
                positions.insert(nodes[graph[node]].id.clone(), Position::new(x, y));
                x += dimensions.width + self.node_sep;
                tallest = tallest.max(dimensions.height);
            }
            y += tallest + self.rank_sep;
        }

        tracing::debug!(nodes = nodes.len(), ranks = rank_count, "layered layout solved");
        positions
    }
}
