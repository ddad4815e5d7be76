use log::debug;

use crate::graph::{
	EdgeChange, Graph, GraphEdge, GraphNode, HandleSide, Highlighter, NodeChange, NodeSize,
	Position, RelationKind, Selection, apply_edge_changes, apply_node_changes,
};

use super::scale::{self, Bounds, MAX_ZOOM, MIN_ZOOM, Minimap};

/// Pointer travel, in screen pixels, below which a press counts as a click.
const CLICK_TOLERANCE: f64 = 4.0;
/// Screen radius around a source handle that starts a connection.
pub const HANDLE_RADIUS: f64 = 6.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A connection being dragged out of a node's source handle.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectState {
	pub source_idx: usize,
	/// Pointer, in graph coordinates.
	pub pointer: (f64, f64),
}

/// Attachment point on a node box and the outward direction at that point.
pub fn handle_point(node: &GraphNode, side: HandleSide, size: NodeSize) -> ((f64, f64), (f64, f64)) {
	let (x, y) = (node.position.x, node.position.y);
	let (w, h) = (size.width, size.height);
	match side {
		HandleSide::Left => ((x, y + h / 2.0), (-1.0, 0.0)),
		HandleSide::Right => ((x + w, y + h / 2.0), (1.0, 0.0)),
		HandleSide::Top => ((x + w / 2.0, y), (0.0, -1.0)),
		HandleSide::Bottom => ((x + w / 2.0, y + h), (0.0, 1.0)),
	}
}

pub struct GraphViewState {
	pub graph: Graph,
	pub node_size: NodeSize,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub connecting: Option<ConnectState>,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	/// Unlocked: nodes can be dragged, connected and deleted.
	pub interactive: bool,
	highlighter: Highlighter,
	press: Option<(f64, f64)>,
}

impl GraphViewState {
	pub fn new(graph: Graph, node_size: NodeSize, width: f64, height: f64) -> Self {
		let mut state = Self {
			highlighter: Highlighter::new(&graph),
			graph,
			node_size,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			connecting: None,
			width,
			height,
			flow_time: 0.0,
			interactive: true,
			press: None,
		};
		state.fit_view();
		state
	}

	pub fn selection(&self) -> &Selection {
		self.highlighter.selection()
	}

	/// Zooms and centers so every node is visible.
	pub fn fit_view(&mut self) {
		let bounds = scale::graph_bounds(&self.graph, self.node_size);
		self.transform = scale::fit_transform(bounds, self.width, self.height);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Graph-space rectangle currently on screen.
	pub fn visible_bounds(&self) -> Bounds {
		let (min_x, min_y) = self.screen_to_graph(0.0, 0.0);
		let (max_x, max_y) = self.screen_to_graph(self.width, self.height);
		Bounds {
			min_x,
			min_y,
			max_x,
			max_y,
		}
	}

	pub fn minimap(&self) -> Minimap {
		Minimap::new(
			scale::graph_bounds(&self.graph, self.node_size),
			self.visible_bounds(),
			self.width,
			self.height,
		)
	}

	/// Topmost node whose source handle is under the screen point.
	pub fn source_handle_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let radius = HANDLE_RADIUS / self.transform.k;
		self.graph.nodes.iter().rposition(|node| {
			let ((hx, hy), _) = handle_point(node, node.source_handle, self.node_size);
			(gx - hx).hypot(gy - hy) <= radius
		})
	}

	/// Topmost node whose box contains the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let NodeSize { width, height } = self.node_size;
		self.graph.nodes.iter().rposition(|node| {
			let Position { x, y } = node.position;
			gx >= x && gx <= x + width && gy >= y && gy <= y + height
		})
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		self.press = Some((x, y));
		if let Some(source_idx) = self.source_handle_at(x, y).filter(|_| self.interactive) {
			self.connecting = Some(ConnectState {
				source_idx,
				pointer: self.screen_to_graph(x, y),
			});
			return;
		}
		let node = self.node_at_position(x, y);
		if !self.interactive {
			// a locked node still takes clicks, but a drag pans the view
			self.drag.node_idx = node;
			self.start_pan(x, y);
		} else if let Some(idx) = node {
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start: self.graph.nodes[idx].position,
			};
		} else {
			self.start_pan(x, y);
		}
	}

	fn start_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		let pointer = self.screen_to_graph(x, y);
		if let Some(connect) = self.connecting.as_mut() {
			connect.pointer = pointer;
		} else if self.drag.active {
			let Some(node) = self.drag.node_idx.and_then(|idx| self.graph.nodes.get(idx)) else {
				return;
			};
			let position = Position {
				x: self.drag.node_start.x + (x - self.drag.start_x) / self.transform.k,
				y: self.drag.node_start.y + (y - self.drag.start_y) / self.transform.k,
			};
			let change = NodeChange::Position {
				id: node.id.clone(),
				position,
			};
			apply_node_changes(&mut self.graph, [change]);
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	/// Ends a press. A connection dragged onto another node links the two; a
	/// press that barely moved is a click on the node under the pointer, or
	/// on the background.
	pub fn pointer_up(&mut self, x: f64, y: f64) {
		if let Some(connect) = self.connecting.take() {
			self.press = None;
			let target = self.node_at_position(x, y);
			if let (Some(source), Some(target)) = (self.graph.nodes.get(connect.source_idx), target) {
				let (source, target) = (source.id.clone(), self.graph.nodes[target].id.clone());
				self.connect(&source, &target);
			}
			return;
		}
		let clicked = self
			.press
			.take()
			.is_some_and(|(px, py)| (x - px).hypot(y - py) < CLICK_TOLERANCE);
		let pressed_node = self.drag.node_idx;
		self.release();

		if clicked {
			match pressed_node {
				Some(idx) => self.click_node(idx),
				None => self.click_pane(),
			}
		}
	}

	pub fn pointer_leave(&mut self) {
		self.press = None;
		self.release();
	}

	fn release(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
		self.connecting = None;
	}

	/// Links `source` to `target` with a hand-drawn edge. Self links and
	/// repeated links are ignored.
	pub fn connect(&mut self, source: &str, target: &str) -> bool {
		if source == target {
			return false;
		}
		let edge = GraphEdge::new(RelationKind::Connection, source, target, "");
		if !apply_edge_changes(&mut self.graph, [EdgeChange::Add(edge)]) {
			return false;
		}
		debug!("connected {source} -> {target}");
		self.highlighter.rebuild(&mut self.graph);
		true
	}

	/// Deletes the focused node and its edges. Refused while locked.
	pub fn remove_focused(&mut self) -> bool {
		if !self.interactive {
			return false;
		}
		let Some(id) = self.selection().focused().map(str::to_owned) else {
			return false;
		};
		if !apply_node_changes(&mut self.graph, [NodeChange::Remove { id: id.clone() }]) {
			return false;
		}
		debug!("removed node {id}");
		self.highlighter.rebuild(&mut self.graph);
		self.sync_selected();
		true
	}

	pub fn toggle_interactive(&mut self) {
		self.interactive = !self.interactive;
		self.release();
	}

	pub fn click_node(&mut self, idx: usize) {
		let Some(id) = self.graph.nodes.get(idx).map(|n| n.id.clone()) else {
			return;
		};
		self.highlighter.click_node(&mut self.graph, &id);
		self.sync_selected();
	}

	pub fn click_pane(&mut self) {
		self.highlighter.click_pane(&mut self.graph);
		self.sync_selected();
	}

	fn sync_selected(&mut self) {
		let focused = self.highlighter.selection().focused();
		let changes: Vec<NodeChange> = self
			.graph
			.nodes
			.iter()
			.filter(|n| n.selected != (focused == Some(n.id.as_str())))
			.map(|n| NodeChange::Select {
				id: n.id.clone(),
				selected: !n.selected,
			})
			.collect();
		apply_node_changes(&mut self.graph, changes);
	}

	/// Zooms around the screen point; `delta_y > 0` zooms out.
	pub fn zoom(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Zoom step around the viewport center, as the zoom buttons do.
	pub fn zoom_step(&mut self, zoom_in: bool) {
		let delta_y = if zoom_in { -1.0 } else { 1.0 };
		self.zoom(self.width / 2.0, self.height / 2.0, delta_y);
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::NodeKind;

	/// Two nodes side by side, identity transform.
	fn state() -> GraphViewState {
		let mut graph = Graph {
			nodes: vec![
				GraphNode::new("a", NodeKind::Object, "A"),
				GraphNode::new("b", NodeKind::Object, "B"),
			],
			edges: vec![GraphEdge::new(RelationKind::FieldReference, "a", "b", "owner")],
		};
		graph.nodes[1].position = Position { x: 300.0, y: 0.0 };
		let mut state = GraphViewState::new(graph, NodeSize::default(), 800.0, 600.0);
		state.transform = ViewTransform::default();
		state
	}

	fn click(state: &mut GraphViewState, x: f64, y: f64) {
		state.pointer_down(x, y);
		state.pointer_up(x, y);
	}

	#[test]
	fn hit_testing_uses_node_boxes() {
		let state = state();
		assert_eq!(state.node_at_position(10.0, 10.0), Some(0));
		assert_eq!(state.node_at_position(400.0, 30.0), Some(1));
		assert_eq!(state.node_at_position(200.0, 10.0), None);
	}

	#[test]
	fn click_toggles_focus_and_selected_flag() {
		let mut state = state();
		click(&mut state, 10.0, 10.0);
		assert_eq!(state.selection(), &Selection::Focused("a".into()));
		assert!(state.graph.nodes[0].selected);
		assert!(!state.graph.nodes[1].selected);

		click(&mut state, 10.0, 10.0);
		assert_eq!(state.selection(), &Selection::Idle);
		assert!(state.graph.nodes.iter().all(|n| !n.selected));
	}

	#[test]
	fn background_click_clears_focus() {
		let mut state = state();
		click(&mut state, 310.0, 10.0);
		assert_eq!(state.selection(), &Selection::Focused("b".into()));

		click(&mut state, 200.0, 300.0);
		assert_eq!(state.selection(), &Selection::Idle);
		assert!(!state.graph.nodes[1].selected);
	}

	#[test]
	fn dragging_moves_the_node_without_selecting_it() {
		let mut state = state();
		state.transform.k = 2.0;
		state.pointer_down(10.0, 10.0);
		state.pointer_move(50.0, 30.0);
		state.pointer_up(50.0, 30.0);

		assert_eq!(state.graph.nodes[0].position, Position { x: 20.0, y: 10.0 });
		assert_eq!(state.selection(), &Selection::Idle);
		assert!(!state.drag.active);
	}

	#[test]
	fn dragging_the_background_pans() {
		let mut state = state();
		state.pointer_down(200.0, 300.0);
		state.pointer_move(250.0, 280.0);
		state.pointer_up(250.0, 280.0);

		assert_eq!(state.transform.x, 50.0);
		assert_eq!(state.transform.y, -20.0);
		assert_eq!(state.selection(), &Selection::Idle);
	}

	#[test]
	fn zoom_is_clamped_and_keeps_the_anchor() {
		let mut state = state();
		state.zoom(100.0, 100.0, -1.0);
		let (gx, gy) = state.screen_to_graph(100.0, 100.0);
		assert!((gx - 100.0).abs() < 1e-9 && (gy - 100.0).abs() < 1e-9);

		for _ in 0..200 {
			state.zoom(0.0, 0.0, 1.0);
		}
		assert_eq!(state.transform.k, MIN_ZOOM);
	}

	#[test]
	fn dragging_from_a_source_handle_connects_nodes() {
		let mut state = state();
		// right-hand handle of `a`
		state.pointer_down(172.0, 18.0);
		assert_eq!(state.connecting.as_ref().map(|c| c.source_idx), Some(0));
		state.pointer_move(310.0, 12.0);
		assert_eq!(state.connecting.as_ref().unwrap().pointer, (310.0, 12.0));
		state.pointer_up(310.0, 12.0);

		assert!(state.connecting.is_none());
		assert_eq!(state.graph.nodes[0].position, Position::default());
		let link = state
			.graph
			.edges
			.iter()
			.find(|e| e.relation == RelationKind::Connection)
			.unwrap();
		assert_eq!((link.source.as_str(), link.target.as_str()), ("a", "b"));

		// the new edge takes part in highlighting right away
		click(&mut state, 10.0, 10.0);
		assert!(state.graph.edges.iter().all(|e| e.visual.stroke_width == 3.0));
	}

	#[test]
	fn connections_to_self_or_nothing_are_dropped() {
		let mut state = state();
		state.pointer_down(172.0, 18.0);
		state.pointer_up(100.0, 18.0);
		state.pointer_down(172.0, 18.0);
		state.pointer_up(200.0, 300.0);

		assert_eq!(state.graph.edges.len(), 1);
		assert!(!state.connect("a", "a"));
		assert!(state.connect("b", "a"));
		assert!(!state.connect("b", "a"));
	}

	#[test]
	fn locked_view_pans_and_still_highlights() {
		let mut state = state();
		state.toggle_interactive();

		state.pointer_down(172.0, 18.0);
		assert!(state.connecting.is_none());
		state.pointer_move(192.0, 28.0);
		state.pointer_up(192.0, 28.0);
		assert_eq!(state.graph.nodes[0].position, Position::default());
		assert_eq!((state.transform.x, state.transform.y), (20.0, 10.0));

		click(&mut state, 400.0, 10.0);
		assert_eq!(state.selection(), &Selection::Focused("b".into()));
		assert!(!state.remove_focused());
		assert_eq!(state.graph.nodes.len(), 2);
	}

	#[test]
	fn removing_the_focused_node_clears_focus() {
		let mut state = state();
		assert!(!state.remove_focused());

		click(&mut state, 10.0, 10.0);
		assert!(state.remove_focused());

		assert_eq!(state.selection(), &Selection::Idle);
		assert_eq!(state.graph.nodes.len(), 1);
		assert!(state.graph.edges.is_empty());
		assert_eq!(state.graph.nodes[0].visual.opacity, 1.0);
		assert!(!state.graph.nodes[0].selected);
	}

	#[test]
	fn zoom_buttons_anchor_on_the_viewport_center() {
		let mut state = state();
		let before = state.screen_to_graph(400.0, 300.0);
		state.zoom_step(true);
		assert!((state.transform.k - 1.1).abs() < 1e-9);
		let after = state.screen_to_graph(400.0, 300.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);

		state.zoom_step(false);
		assert!((state.transform.k - 0.99).abs() < 1e-9);
	}

	#[test]
	fn minimap_tracks_the_viewport() {
		let mut state = state();
		let visible = state.visible_bounds();
		assert_eq!((visible.max_x, visible.max_y), (800.0, 600.0));

		state.zoom_step(true);
		let zoomed = state.visible_bounds();
		assert!(zoomed.width() < visible.width());
		assert_eq!(state.minimap().left, 800.0 - scale::MINIMAP_WIDTH - 12.0);
	}
}
