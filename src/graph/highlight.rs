//! Click-driven neighborhood highlighting.
//!
//! Selection is a two-state machine: [`Selection::Idle`] or
//! [`Selection::Focused`] on one node. Every transition rewrites the
//! [`VisualState`] of all nodes and edges; the graph topology and the
//! records it was built from are never touched.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::types::{
	DIMMED_OPACITY, Graph, HIGHLIGHT_COLOR, HIGHLIGHT_Z_INDEX, VisualState,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	Idle,
	Focused(String),
}

impl Selection {
	pub fn focused(&self) -> Option<&str> {
		match self {
			Self::Idle => None,
			Self::Focused(id) => Some(id),
		}
	}
}

/// Node id to incident `(edge id, other endpoint)` pairs, built once per
/// graph so a focus change costs O(degree) to resolve.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
	incident: HashMap<String, Vec<(String, String)>>,
}

/// Ids lit up around a focused node.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Neighborhood<'a> {
	pub nodes: HashSet<&'a str>,
	pub edges: HashSet<&'a str>,
}

impl Adjacency {
	pub fn new(graph: &Graph) -> Self {
		let mut incident: HashMap<String, Vec<(String, String)>> = graph
			.nodes
			.iter()
			.map(|n| (n.id.clone(), Vec::new()))
			.collect();
		for edge in &graph.edges {
			if let Some(list) = incident.get_mut(&edge.source) {
				list.push((edge.id.clone(), edge.target.clone()));
			}
			if edge.target != edge.source {
				if let Some(list) = incident.get_mut(&edge.target) {
					list.push((edge.id.clone(), edge.source.clone()));
				}
			}
		}
		Self { incident }
	}

	pub fn contains(&self, node: &str) -> bool {
		self.incident.contains_key(node)
	}

	/// `node`, its incident edges and their other endpoints.
	pub fn neighborhood<'a>(&'a self, node: &'a str) -> Neighborhood<'a> {
		let mut hood = Neighborhood::default();
		let Some(list) = self.incident.get(node) else {
			return hood;
		};
		hood.nodes.insert(node);
		for (edge, other) in list {
			hood.edges.insert(edge);
			hood.nodes.insert(other);
		}
		hood
	}
}

/// Owns the selection and the adjacency index of the graph it decorates.
#[derive(Clone, Debug, Default)]
pub struct Highlighter {
	adjacency: Adjacency,
	selection: Selection,
}

impl Highlighter {
	pub fn new(graph: &Graph) -> Self {
		Self {
			adjacency: Adjacency::new(graph),
			selection: Selection::Idle,
		}
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Re-indexes after the graph's topology changed and re-applies the
	/// overlay. A focus on a node that no longer exists is dropped.
	pub fn rebuild(&mut self, graph: &mut Graph) {
		self.adjacency = Adjacency::new(graph);
		if let Some(id) = self.selection.focused() {
			if !self.adjacency.contains(id) {
				self.selection = Selection::Idle;
			}
		}
		self.apply(graph);
	}

	/// Toggles focus on `id`. Clicking the focused node, or a node that is
	/// not in the graph, returns to idle.
	pub fn click_node(&mut self, graph: &mut Graph, id: &str) {
		self.selection = match &self.selection {
			Selection::Focused(current) if current == id => Selection::Idle,
			_ if !self.adjacency.contains(id) => Selection::Idle,
			_ => Selection::Focused(id.to_owned()),
		};
		debug!("selection: {:?}", self.selection);
		self.apply(graph);
	}

	/// Background click.
	pub fn click_pane(&mut self, graph: &mut Graph) {
		self.reset(graph);
	}

	pub fn reset(&mut self, graph: &mut Graph) {
		self.selection = Selection::Idle;
		self.apply(graph);
	}

	/// Writes the overlay for the current selection onto every element.
	pub fn apply(&self, graph: &mut Graph) {
		let Some(focus) = self.selection.focused() else {
			for node in &mut graph.nodes {
				node.visual = VisualState::node_base(node.kind);
			}
			for edge in &mut graph.edges {
				edge.visual = VisualState::edge_base(edge.relation);
			}
			return;
		};

		let hood = self.adjacency.neighborhood(focus);
		for node in &mut graph.nodes {
			let mut visual = VisualState::node_base(node.kind);
			if !hood.nodes.contains(node.id.as_str()) {
				visual.opacity = DIMMED_OPACITY;
			}
			node.visual = visual;
		}
		for edge in &mut graph.edges {
			let mut visual = VisualState::edge_base(edge.relation);
			if hood.edges.contains(edge.id.as_str()) {
				visual.stroke_color = HIGHLIGHT_COLOR;
				visual.stroke_width = 3.0;
				visual.animated = true;
				visual.z_index = HIGHLIGHT_Z_INDEX;
			} else {
				visual.opacity = DIMMED_OPACITY;
			}
			edge.visual = visual;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::builder::build;
	use crate::graph::types::{RelationKind, VisualState};
	use crate::records::{Object, ObjectType};
	use serde_json::json;

	/// type-T -> A -> B, plus an unrelated object C.
	fn sample() -> Graph {
		let types: Vec<ObjectType> = serde_json::from_value(json!([
			{ "id": "T", "name": "Company", "fields": { "owner": "object" } }
		]))
		.unwrap();
		let objects: Vec<Object> = serde_json::from_value(json!([
			{
				"id": "A",
				"type_values": [{ "objectTypeId": "T", "type_values": { "owner": { "id": "B" } } }],
			},
			{ "id": "B" },
			{ "id": "C" },
		]))
		.unwrap();
		build(&objects, &types, &[]).0
	}

	fn opacity(graph: &Graph, id: &str) -> f64 {
		graph.node(id).unwrap().visual.opacity
	}

	fn assert_base(graph: &Graph) {
		for node in &graph.nodes {
			assert_eq!(node.visual, VisualState::node_base(node.kind), "{}", node.id);
		}
		for edge in &graph.edges {
			assert_eq!(edge.visual, VisualState::edge_base(edge.relation), "{}", edge.id);
		}
	}

	#[test]
	fn focusing_lights_up_the_neighborhood() {
		let mut graph = sample();
		let mut highlighter = Highlighter::new(&graph);
		highlighter.click_node(&mut graph, "A");

		assert_eq!(highlighter.selection(), &Selection::Focused("A".into()));
		assert_eq!(opacity(&graph, "A"), 1.0);
		assert_eq!(opacity(&graph, "B"), 1.0);
		assert_eq!(opacity(&graph, "type-T"), 1.0);
		assert_eq!(opacity(&graph, "C"), DIMMED_OPACITY);

		for edge in &graph.edges {
			assert_eq!(edge.visual.stroke_color, HIGHLIGHT_COLOR);
			assert_eq!(edge.visual.stroke_width, 3.0);
			assert!(edge.visual.animated);
			assert_eq!(edge.visual.z_index, HIGHLIGHT_Z_INDEX);
		}
	}

	#[test]
	fn edges_outside_the_neighborhood_dim_but_keep_base_style() {
		let mut graph = sample();
		let mut highlighter = Highlighter::new(&graph);
		highlighter.click_node(&mut graph, "type-T");

		assert_eq!(opacity(&graph, "B"), DIMMED_OPACITY);
		let reference = graph
			.edges
			.iter()
			.find(|e| e.relation == RelationKind::FieldReference)
			.unwrap();
		assert_eq!(reference.visual.opacity, DIMMED_OPACITY);
		assert_eq!(reference.visual.stroke_color, RelationKind::FieldReference.base_color());
		assert_eq!(reference.visual.stroke_width, 1.0);
		assert!(reference.visual.animated);
		assert_eq!(reference.visual.z_index, 0);
	}

	#[test]
	fn clicking_the_focused_node_again_restores_base_state() {
		let mut graph = sample();
		let untouched = graph.clone();
		let mut highlighter = Highlighter::new(&graph);

		highlighter.click_node(&mut graph, "A");
		highlighter.click_node(&mut graph, "A");

		assert_eq!(highlighter.selection(), &Selection::Idle);
		assert_eq!(graph, untouched);
		assert_base(&graph);
	}

	#[test]
	fn switching_focus_goes_straight_to_the_new_node() {
		let mut graph = sample();
		let mut highlighter = Highlighter::new(&graph);

		highlighter.click_node(&mut graph, "A");
		highlighter.click_node(&mut graph, "C");

		assert_eq!(highlighter.selection(), &Selection::Focused("C".into()));
		assert_eq!(opacity(&graph, "C"), 1.0);
		assert_eq!(opacity(&graph, "A"), DIMMED_OPACITY);
		assert!(graph.edges.iter().all(|e| e.visual.opacity == DIMMED_OPACITY));
	}

	#[test]
	fn pane_click_and_unknown_node_clear_focus() {
		let mut graph = sample();
		let mut highlighter = Highlighter::new(&graph);

		highlighter.click_node(&mut graph, "B");
		highlighter.click_pane(&mut graph);
		assert_eq!(highlighter.selection(), &Selection::Idle);
		assert_base(&graph);

		highlighter.click_node(&mut graph, "B");
		highlighter.click_node(&mut graph, "nope");
		assert_eq!(highlighter.selection(), &Selection::Idle);
		assert_base(&graph);
	}

	#[test]
	fn adjacency_indexes_self_loops_once() {
		let mut graph = sample();
		graph.edges.push(crate::graph::types::GraphEdge::new(
			RelationKind::FieldReference,
			"C",
			"C",
			"self",
		));
		let adjacency = Adjacency::new(&graph);

		assert_eq!(adjacency.neighborhood("A").edges.len(), 2);
		assert!(!adjacency.contains("missing"));
		assert_eq!(adjacency.neighborhood("missing"), Neighborhood::default());

		let hood = adjacency.neighborhood("C");
		assert_eq!(hood.nodes, HashSet::from(["C"]));
		assert_eq!(hood.edges.len(), 1);
	}

	#[test]
	fn rebuild_drops_focus_on_removed_node() {
		let mut graph = sample();
		let mut highlighter = Highlighter::new(&graph);
		highlighter.click_node(&mut graph, "C");

		graph.nodes.retain(|n| n.id != "C");
		highlighter.rebuild(&mut graph);

		assert_eq!(highlighter.selection(), &Selection::Idle);
		assert_base(&graph);
	}
}
