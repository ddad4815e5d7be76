//! Fit-to-view math.

use crate::graph::{Graph, NodeSize};

use super::state::ViewTransform;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Fitting never magnifies past this, so small graphs stay readable.
const MAX_FIT_ZOOM: f64 = 1.5;
const FIT_PADDING: f64 = 40.0;

pub const MINIMAP_WIDTH: f64 = 200.0;
pub const MINIMAP_HEIGHT: f64 = 150.0;
/// Gap between the minimap and the canvas' bottom-right corner.
const MINIMAP_MARGIN: f64 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn union(self, other: Self) -> Self {
		Self {
			min_x: self.min_x.min(other.min_x),
			min_y: self.min_y.min(other.min_y),
			max_x: self.max_x.max(other.max_x),
			max_y: self.max_y.max(other.max_y),
		}
	}
}

/// Box enclosing every node, `None` for an empty graph.
pub fn graph_bounds(graph: &Graph, size: NodeSize) -> Option<Bounds> {
	graph.nodes.iter().fold(None, |acc, node| {
		let (x, y) = (node.position.x, node.position.y);
		let node_bounds = Bounds {
			min_x: x,
			min_y: y,
			max_x: x + size.width,
			max_y: y + size.height,
		};
		Some(match acc {
			None => node_bounds,
			Some(b) => b.union(node_bounds),
		})
	})
}

/// Transform that centers `bounds` in a `width`×`height` viewport.
pub fn fit_transform(bounds: Option<Bounds>, width: f64, height: f64) -> ViewTransform {
	let Some(bounds) = bounds else {
		return ViewTransform::default();
	};
	let (avail_w, avail_h) = (
		(width - 2.0 * FIT_PADDING).max(1.0),
		(height - 2.0 * FIT_PADDING).max(1.0),
	);
	let k = (avail_w / bounds.width().max(1.0))
		.min(avail_h / bounds.height().max(1.0))
		.clamp(MIN_ZOOM, MAX_FIT_ZOOM);
	let (cx, cy) = (
		(bounds.min_x + bounds.max_x) / 2.0,
		(bounds.min_y + bounds.max_y) / 2.0,
	);
	ViewTransform {
		x: width / 2.0 - cx * k,
		y: height / 2.0 - cy * k,
		k,
	}
}

/// Placement of the overview in the corner of the canvas: graph coordinates
/// scaled into a fixed screen-space box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Minimap {
	/// Screen position of the box's top-left corner.
	pub left: f64,
	pub top: f64,
	pub scale: f64,
	/// Graph point drawn at the box's top-left corner.
	origin_x: f64,
	origin_y: f64,
}

impl Minimap {
	/// Fits the union of the graph and the `visible` area into the box at
	/// the bottom-right of a `width`×`height` canvas, centered.
	pub fn new(graph: Option<Bounds>, visible: Bounds, width: f64, height: f64) -> Self {
		let area = graph.map_or(visible, |g| g.union(visible));
		let scale = (MINIMAP_WIDTH / area.width().max(1.0)).min(MINIMAP_HEIGHT / area.height().max(1.0));
		let slack_x = (MINIMAP_WIDTH - area.width() * scale) / 2.0;
		let slack_y = (MINIMAP_HEIGHT - area.height() * scale) / 2.0;
		Self {
			left: width - MINIMAP_WIDTH - MINIMAP_MARGIN,
			top: height - MINIMAP_HEIGHT - MINIMAP_MARGIN,
			scale,
			origin_x: area.min_x - slack_x / scale,
			origin_y: area.min_y - slack_y / scale,
		}
	}

	pub fn to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			self.left + (gx - self.origin_x) * self.scale,
			self.top + (gy - self.origin_y) * self.scale,
		)
	}
}
