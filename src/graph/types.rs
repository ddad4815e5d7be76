#[cfg(test)]
use std::collections::HashSet;

/// Stroke used for edges touching the focused node.
pub const HIGHLIGHT_COLOR: &str = "#ff0072";
/// Opacity of elements outside the focused neighborhood.
pub const DIMMED_OPACITY: f64 = 0.1;
/// Stacking order of highlighted edges.
pub const HIGHLIGHT_Z_INDEX: i32 = 999;

/// Which source collection a node was created from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Object,
	ObjectType,
	FunnelStep,
}

impl NodeKind {
	/// Box fill.
	pub fn fill(self) -> &'static str {
		match self {
			Self::Object => "#ffffff",
			Self::ObjectType => "#faf5ff",
			Self::FunnelStep => "#e6fffa",
		}
	}

	/// Box border.
	pub fn border(self) -> &'static str {
		match self {
			Self::Object => "#777777",
			Self::ObjectType => "#805ad5",
			Self::FunnelStep => "#319795",
		}
	}
}

/// Relation materialized by an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
	InstanceOf,
	FieldReference,
	StepMembership,
	/// Drawn by hand between two handles on the canvas.
	Connection,
}

impl RelationKind {
	/// Short tag used in edge ids.
	pub fn tag(self) -> &'static str {
		match self {
			Self::InstanceOf => "instance",
			Self::FieldReference => "field",
			Self::StepMembership => "step",
			Self::Connection => "connection",
		}
	}

	pub fn base_color(self) -> &'static str {
		match self {
			Self::InstanceOf => "#9f7aea",
			Self::FieldReference => "#555555",
			Self::StepMembership => "#319795",
			Self::Connection => "#b1b1b7",
		}
	}

	pub fn base_animated(self) -> bool {
		matches!(self, Self::FieldReference)
	}

	pub fn dashed(self) -> bool {
		matches!(self, Self::InstanceOf | Self::StepMembership)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// Side of a node box an edge attaches to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandleSide {
	Left,
	#[default]
	Right,
	Top,
	Bottom,
}

/// Derived presentation of a node or edge. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualState {
	pub opacity: f64,
	pub stroke_color: &'static str,
	pub stroke_width: f64,
	pub animated: bool,
	pub z_index: i32,
}

impl VisualState {
	/// Resting state of a node of `kind`.
	pub fn node_base(kind: NodeKind) -> Self {
		Self {
			opacity: 1.0,
			stroke_color: kind.border(),
			stroke_width: 1.0,
			animated: false,
			z_index: 0,
		}
	}

	/// Resting state of an edge of `relation`.
	pub fn edge_base(relation: RelationKind) -> Self {
		Self {
			opacity: 1.0,
			stroke_color: relation.base_color(),
			stroke_width: 1.0,
			animated: relation.base_animated(),
			z_index: 0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub kind: NodeKind,
	pub label: String,
	/// Top-left corner of the node box.
	pub position: Position,
	pub source_handle: HandleSide,
	pub target_handle: HandleSide,
	pub selected: bool,
	pub visual: VisualState,
}

impl GraphNode {
	pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind,
			label: label.into(),
			position: Position::default(),
			source_handle: HandleSide::Right,
			target_handle: HandleSide::Left,
			selected: false,
			visual: VisualState::node_base(kind),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub relation: RelationKind,
	pub label: String,
	pub visual: VisualState,
}

impl GraphEdge {
	/// Creates an edge whose id is derived from its relation, endpoints and
	/// label, so identical input always yields identical ids.
	pub fn new(
		relation: RelationKind,
		source: impl Into<String>,
		target: impl Into<String>,
		label: impl Into<String>,
	) -> Self {
		let (source, target, label) = (source.into(), target.into(), label.into());
		Self {
			id: edge_id(relation, &source, &target, &label),
			source,
			target,
			relation,
			label,
			visual: VisualState::edge_base(relation),
		}
	}
}

pub fn edge_id(relation: RelationKind, source: &str, target: &str, label: &str) -> String {
	format!("{}:{source}->{target}#{label}", relation.tag())
}

/// Nodes and edges of one build. Replaced wholesale on every refresh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl Graph {
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
		self.edges.iter().find(|e| e.id == id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[cfg(test)]
impl Graph {
	pub fn node_ids(&self) -> HashSet<&str> {
		self.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	pub fn edge_ids(&self) -> HashSet<&str> {
		self.edges.iter().map(|e| e.id.as_str()).collect()
	}
}
