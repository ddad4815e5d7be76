//! Incremental patches emitted by the canvas, folded back into the graph.

use super::types::{Graph, GraphEdge, Position};

#[derive(Clone, Debug, PartialEq)]
pub enum NodeChange {
	Position { id: String, position: Position },
	Select { id: String, selected: bool },
	Remove { id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeChange {
	/// A user-drawn connection.
	Add(GraphEdge),
}

/// Applies node patches in order. Changes for unknown ids are ignored and
/// removing a node also removes its incident edges.
///
/// Returns whether the topology changed.
pub fn apply_node_changes(graph: &mut Graph, changes: impl IntoIterator<Item = NodeChange>) -> bool {
	let mut removed = false;
	for change in changes {
		match change {
			NodeChange::Position { id, position } => {
				if let Some(node) = graph.nodes.iter_mut().find(|n| n.id == id) {
					node.position = position;
				}
			}
			NodeChange::Select { id, selected } => {
				if let Some(node) = graph.nodes.iter_mut().find(|n| n.id == id) {
					node.selected = selected;
				}
			}
			NodeChange::Remove { id } => {
				let before = graph.nodes.len();
				graph.nodes.retain(|n| n.id != id);
				if graph.nodes.len() != before {
					graph.edges.retain(|e| e.source != id && e.target != id);
					removed = true;
				}
			}
		}
	}
	removed
}

/// Applies edge patches in order. An added edge whose id is already present,
/// or whose endpoints are not both nodes, is ignored.
///
/// Returns whether the topology changed.
pub fn apply_edge_changes(graph: &mut Graph, changes: impl IntoIterator<Item = EdgeChange>) -> bool {
	let mut added = false;
	for change in changes {
		match change {
			EdgeChange::Add(edge) => {
				let known = graph.node(&edge.source).is_some() && graph.node(&edge.target).is_some();
				if known && graph.edge(&edge.id).is_none() {
					graph.edges.push(edge);
					added = true;
				}
			}
		}
	}
	added
}
