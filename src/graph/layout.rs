use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use dugong::graphlib::{Graph as DagreGraph, GraphOptions};
use dugong::{EdgeLabel, GraphLabel, NodeLabel, RankDir};
use log::debug;

use super::types::{Graph, HandleSide, Position};

/// Rank direction of the layered layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
	#[default]
	LeftRight,
	TopBottom,
}

impl Direction {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::LeftRight => "LR",
			Self::TopBottom => "TB",
		}
	}

	pub fn toggled(self) -> Self {
		match self {
			Self::LeftRight => Self::TopBottom,
			Self::TopBottom => Self::LeftRight,
		}
	}

	/// `(source, target)` handle sides for nodes laid out in this direction.
	pub fn handles(self) -> (HandleSide, HandleSide) {
		match self {
			Self::LeftRight => (HandleSide::Right, HandleSide::Left),
			Self::TopBottom => (HandleSide::Bottom, HandleSide::Top),
		}
	}
}

impl FromStr for Direction {
	type Err = std::convert::Infallible;

	/// Unrecognized directions fall back to left-to-right.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.trim().to_ascii_uppercase().as_str() {
			"TB" | "TD" => Self::TopBottom,
			_ => Self::LeftRight,
		})
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Fixed box size every node is laid out with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSize {
	pub width: f64,
	pub height: f64,
}

impl Default for NodeSize {
	fn default() -> Self {
		Self {
			width: 172.0,
			height: 36.0,
		}
	}
}

/// A layered layout engine producing center-anchored coordinates.
pub trait Layouter {
	fn center_positions(
		&self,
		graph: &Graph,
		direction: Direction,
		size: NodeSize,
	) -> HashMap<String, Position>;
}

/// Layered layout backed by the dagre port in `dugong`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DagreLayout;

impl Layouter for DagreLayout {
	fn center_positions(
		&self,
		graph: &Graph,
		direction: Direction,
		size: NodeSize,
	) -> HashMap<String, Position> {
		let mut g: DagreGraph<NodeLabel, EdgeLabel, GraphLabel> = DagreGraph::new(GraphOptions {
			multigraph: true,
			compound: false,
			directed: true,
		});
		g.set_graph(GraphLabel {
			rankdir: match direction {
				Direction::LeftRight => RankDir::LR,
				Direction::TopBottom => RankDir::TB,
			},
			nodesep: 50.0,
			ranksep: 50.0,
			..Default::default()
		});

		for node in &graph.nodes {
			g.set_node(
				node.id.clone(),
				NodeLabel {
					width: size.width,
					height: size.height,
					..Default::default()
				},
			);
		}
		for edge in &graph.edges {
			g.set_edge_named(
				edge.source.clone(),
				edge.target.clone(),
				Some(edge.id.clone()),
				Some(EdgeLabel {
					minlen: 1,
					weight: 1.0,
					..Default::default()
				}),
			);
		}

		dugong::layout(&mut g);

		graph
			.nodes
			.iter()
			.filter_map(|node| {
				let label = g.node(&node.id)?;
				Some((
					node.id.clone(),
					Position {
						x: label.x?,
						y: label.y?,
					},
				))
			})
			.collect()
	}
}

/// Assigns every node a top-left position and handle sides.
///
/// Nodes the engine leaves unplaced keep their previous position.
pub fn layout(graph: &mut Graph, direction: Direction, size: NodeSize, layouter: &impl Layouter) {
	if graph.is_empty() {
		return;
	}
	let centers = layouter.center_positions(graph, direction, size);
	let (source_handle, target_handle) = direction.handles();

	for node in &mut graph.nodes {
		if let Some(center) = centers.get(&node.id) {
			node.position = Position {
				x: center.x - size.width / 2.0,
				y: center.y - size.height / 2.0,
			};
		}
		node.source_handle = source_handle;
		node.target_handle = target_handle;
	}
	debug!(
		"laid out {} nodes ({direction}), {} placed",
		graph.nodes.len(),
		centers.len()
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::types::{GraphEdge, GraphNode, NodeKind, RelationKind};

	/// Places node `i` at center `(i * 100, i * 10)`.
	struct IndexLayout;

	impl Layouter for IndexLayout {
		fn center_positions(&self, graph: &Graph, _: Direction, _: NodeSize) -> HashMap<String, Position> {
			graph
				.nodes
				.iter()
				.enumerate()
				.map(|(i, n)| {
					(
						n.id.clone(),
						Position {
							x: i as f64 * 100.0,
							y: i as f64 * 10.0,
						},
					)
				})
				.collect()
		}
	}

	fn sample() -> Graph {
		Graph {
			nodes: vec![
				GraphNode::new("a", NodeKind::Object, "A"),
				GraphNode::new("b", NodeKind::Object, "B"),
				GraphNode::new("lonely", NodeKind::ObjectType, "Type: Lonely"),
			],
			edges: vec![GraphEdge::new(RelationKind::FieldReference, "a", "b", "owner")],
		}
	}

	#[test]
	fn direction_parses_with_fallback() {
		assert_eq!("tb".parse::<Direction>().unwrap(), Direction::TopBottom);
		assert_eq!("LR".parse::<Direction>().unwrap(), Direction::LeftRight);
		assert_eq!("diagonal".parse::<Direction>().unwrap(), Direction::LeftRight);
		assert_eq!(Direction::LeftRight.toggled(), Direction::TopBottom);
	}

	#[test]
	fn centers_are_shifted_to_top_left() {
		let mut graph = sample();
		layout(&mut graph, Direction::LeftRight, NodeSize::default(), &IndexLayout);

		assert_eq!(graph.nodes[0].position, Position { x: -86.0, y: -18.0 });
		assert_eq!(graph.nodes[1].position, Position { x: 14.0, y: -8.0 });
		assert_eq!(graph.nodes[2].position, Position { x: 114.0, y: 2.0 });
	}

	#[test]
	fn handles_follow_direction() {
		let mut graph = sample();
		layout(&mut graph, Direction::TopBottom, NodeSize::default(), &IndexLayout);
		assert!(graph
			.nodes
			.iter()
			.all(|n| n.source_handle == HandleSide::Bottom && n.target_handle == HandleSide::Top));
	}

	#[test]
	fn dagre_places_isolated_nodes() {
		let mut graph = sample();
		let centers = DagreLayout.center_positions(&graph, Direction::LeftRight, NodeSize::default());
		assert_eq!(centers.len(), 3);

		layout(&mut graph, Direction::LeftRight, NodeSize::default(), &DagreLayout);
		let a = graph.node("a").unwrap().position;
		let b = graph.node("b").unwrap().position;
		// b is ranked after a along the x axis
		assert!(b.x > a.x);
	}

	#[test]
	fn dagre_layout_is_deterministic() {
		let mut first = sample();
		let mut second = sample();
		layout(&mut first, Direction::TopBottom, NodeSize::default(), &DagreLayout);
		layout(&mut second, Direction::TopBottom, NodeSize::default(), &DagreLayout);
		assert_eq!(first, second);
	}

	#[test]
	fn empty_graph_is_untouched() {
		let mut graph = Graph::default();
		layout(&mut graph, Direction::LeftRight, NodeSize::default(), &DagreLayout);
		assert!(graph.is_empty());
	}
}
