use std::collections::{HashMap, HashSet};

use log::debug;

use super::types::{Graph, GraphEdge, GraphNode, NodeKind, RelationKind};
use crate::records::{Funnel, Object, ObjectType, Snapshot, referenced_ids};

const INSTANCE_OF_LABEL: &str = "instance of";
const IN_STEP_LABEL: &str = "in step";

/// Counts of references dropped because their target is not in the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
	pub dangling_types: usize,
	pub dangling_targets: usize,
	pub dangling_steps: usize,
}

pub fn type_node_id(object_type_id: &str) -> String {
	format!("type-{object_type_id}")
}

pub fn step_node_id(step_id: &str) -> String {
	format!("step-{step_id}")
}

/// Accumulates nodes and edges, dropping repeated ids.
#[derive(Default)]
struct GraphAccumulator {
	graph: Graph,
	node_ids: HashSet<String>,
	edge_ids: HashSet<String>,
}

impl GraphAccumulator {
	fn add_node(&mut self, node: GraphNode) {
		if self.node_ids.insert(node.id.clone()) {
			self.graph.nodes.push(node);
		}
	}

	fn has_node(&self, id: &str) -> bool {
		self.node_ids.contains(id)
	}

	fn add_edge(&mut self, edge: GraphEdge) {
		if self.edge_ids.insert(edge.id.clone()) {
			self.graph.edges.push(edge);
		}
	}
}

/// Builds the relationship graph for `objects` against the object types and
/// funnels they refer to.
///
/// Dangling type, object and step references are dropped and only counted in
/// the returned [`BuildStats`]. The result is a pure function of the inputs.
pub fn build(
	objects: &[Object],
	object_types: &[ObjectType],
	funnels: &[Funnel],
) -> (Graph, BuildStats) {
	let mut acc = GraphAccumulator::default();
	let mut stats = BuildStats::default();

	for object_type in object_types {
		acc.add_node(GraphNode::new(
			type_node_id(&object_type.id),
			NodeKind::ObjectType,
			format!("Type: {}", object_type.name),
		));
	}
	for object in objects {
		acc.add_node(GraphNode::new(
			object.id.as_str(),
			NodeKind::Object,
			object.display_name(),
		));
	}
	for funnel in funnels {
		if funnel.steps.is_empty() {
			debug!("funnel {} has no steps", funnel.id);
		}
		for step in &funnel.steps {
			acc.add_node(GraphNode::new(
				step_node_id(&step.id),
				NodeKind::FunnelStep,
				format!("{}: {}", funnel.name, step.name),
			));
		}
	}

	// first schema per id, matching the type node it labels
	let mut types_by_id: HashMap<&str, &ObjectType> = HashMap::new();
	for object_type in object_types {
		types_by_id.entry(object_type.id.as_str()).or_insert(object_type);
	}
	let object_ids: HashSet<&str> = objects.iter().map(|o| o.id.as_str()).collect();

	for object in objects {
		for type_value in &object.type_values {
			let Some(object_type) = types_by_id.get(type_value.object_type_id.as_str()) else {
				stats.dangling_types += 1;
				continue;
			};
			acc.add_edge(GraphEdge::new(
				RelationKind::InstanceOf,
				type_node_id(&object_type.id),
				object.id.as_str(),
				INSTANCE_OF_LABEL,
			));

			for (key, value) in &type_value.type_values {
				if !object_type.is_object_field(key) {
					continue;
				}
				for target in referenced_ids(value) {
					if !object_ids.contains(target) {
						stats.dangling_targets += 1;
						continue;
					}
					acc.add_edge(GraphEdge::new(
						RelationKind::FieldReference,
						object.id.as_str(),
						target,
						key.as_str(),
					));
				}
			}
		}

		for step in &object.steps {
			let step_node = step_node_id(&step.step_id);
			if !acc.has_node(&step_node) {
				stats.dangling_steps += 1;
				continue;
			}
			acc.add_edge(GraphEdge::new(
				RelationKind::StepMembership,
				object.id.as_str(),
				step_node,
				IN_STEP_LABEL,
			));
		}
	}

	debug!(
		"built graph: {} nodes, {} edges, dropped {:?}",
		acc.graph.nodes.len(),
		acc.graph.edges.len(),
		stats
	);
	(acc.graph, stats)
}

/// [`build`] against an explicit schema snapshot.
pub fn build_from_snapshot(objects: &[Object], snapshot: &Snapshot) -> (Graph, BuildStats) {
	build(objects, &snapshot.object_types, &snapshot.funnels)
}
