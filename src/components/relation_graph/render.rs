use std::borrow::Cow;
use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scale::{MINIMAP_HEIGHT, MINIMAP_WIDTH};
use super::state::{GraphViewState, HANDLE_RADIUS, handle_point};
use crate::graph::{GraphEdge, GraphNode, NodeSize};

const BACKGROUND: &str = "#f7fafc";
const GRID_DOT: &str = "#cbd5e0";
const GRID_GAP: f64 = 16.0;
const LABEL_COLOR: &str = "#1a202c";
const MAX_LABEL_CHARS: usize = 24;
const HANDLE_FILL: &str = "#1a192b";
const CONNECTION_LINE: &str = "#b1b1b7";
const MINIMAP_BACKGROUND: &str = "#ffffff";
const MINIMAP_MASK: &str = "rgba(240, 240, 240, 0.6)";

pub fn render(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_grid(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	draw_connection(state, ctx);
	ctx.restore();
	draw_minimap(state, ctx);
}

fn draw_grid(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	if k < 0.4 {
		return;
	}
	let (x0, y0) = state.screen_to_graph(0.0, 0.0);
	let (x1, y1) = state.screen_to_graph(state.width, state.height);
	let radius = 0.8 / k;
	ctx.set_fill_style_str(GRID_DOT);
	let mut gx = (x0 / GRID_GAP).floor() * GRID_GAP;
	while gx <= x1 {
		let mut gy = (y0 / GRID_GAP).floor() * GRID_GAP;
		while gy <= y1 {
			ctx.fill_rect(gx - radius, gy - radius, radius * 2.0, radius * 2.0);
			gy += GRID_GAP;
		}
		gx += GRID_GAP;
	}
}

fn draw_edges(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let nodes: HashMap<&str, &GraphNode> = state
		.graph
		.nodes
		.iter()
		.map(|n| (n.id.as_str(), n))
		.collect();

	let mut edges: Vec<&GraphEdge> = state.graph.edges.iter().collect();
	edges.sort_by_key(|e| e.visual.z_index);

	let (dash, gap, arrow_size) = (5.0, 5.0, 8.0);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);

	for edge in edges {
		let (Some(source), Some(target)) =
			(nodes.get(edge.source.as_str()), nodes.get(edge.target.as_str()))
		else {
			continue;
		};
		let ((x1, y1), (nx1, ny1)) = handle_point(source, source.source_handle, state.node_size);
		let ((x2, y2), (nx2, ny2)) = handle_point(target, target.target_handle, state.node_size);
		let bend = ((x2 - x1).hypot(y2 - y1) / 2.0).clamp(20.0, 120.0);
		let (c1x, c1y) = (x1 + nx1 * bend, y1 + ny1 * bend);
		let (c2x, c2y) = (x2 + nx2 * (bend + arrow_size), y2 + ny2 * (bend + arrow_size));
		let (end_x, end_y) = (x2 + nx2 * arrow_size, y2 + ny2 * arrow_size);

		let visual = edge.visual;
		ctx.set_global_alpha(visual.opacity);
		ctx.set_stroke_style_str(visual.stroke_color);
		ctx.set_line_width(visual.stroke_width / k.max(0.5));

		if edge.relation.dashed() || visual.animated {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(if visual.animated { dash_offset } else { 0.0 });
		}
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.bezier_curve_to(c1x, c1y, c2x, c2y, end_x, end_y);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		// arrowhead points back into the target along its handle normal
		let (ux, uy) = (-nx2, -ny2);
		let (back_x, back_y) = (x2 - ux * arrow_size, y2 - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.set_fill_style_str(visual.stroke_color);
		ctx.begin_path();
		ctx.move_to(x2, y2);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		// label at the curve midpoint
		let (mx, my) = (
			0.125 * x1 + 0.375 * c1x + 0.375 * c2x + 0.125 * end_x,
			0.125 * y1 + 0.375 * c1y + 0.375 * c2y + 0.125 * end_y,
		);
		ctx.set_font("10px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		ctx.set_fill_style_str(BACKGROUND);
		let half = edge.label.chars().count() as f64 * 3.0 + 3.0;
		ctx.fill_rect(mx - half, my - 7.0, half * 2.0, 14.0);
		ctx.set_fill_style_str(LABEL_COLOR);
		let _ = ctx.fill_text(&edge.label, mx, my);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let NodeSize { width, height } = state.node_size;
	let k = state.transform.k;

	for node in &state.graph.nodes {
		let (x, y) = (node.position.x, node.position.y);
		ctx.set_global_alpha(node.visual.opacity);

		ctx.set_fill_style_str(node.kind.fill());
		ctx.fill_rect(x, y, width, height);
		ctx.set_stroke_style_str(node.visual.stroke_color);
		let border = if node.selected { 2.0 } else { 1.0 };
		ctx.set_line_width(border / k.max(0.5));
		ctx.stroke_rect(x, y, width, height);

		ctx.set_fill_style_str(LABEL_COLOR);
		ctx.set_font("12px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let label = fit_label(&node.label, MAX_LABEL_CHARS);
		let _ = ctx.fill_text(&label, x + width / 2.0, y + height / 2.0);

		if state.interactive {
			ctx.set_fill_style_str(HANDLE_FILL);
			for side in [node.source_handle, node.target_handle] {
				let ((hx, hy), _) = handle_point(node, side, state.node_size);
				ctx.begin_path();
				let _ = ctx.arc(hx, hy, 3.0 / k.max(0.5), 0.0, std::f64::consts::TAU);
				ctx.fill();
			}
		}
	}
	ctx.set_global_alpha(1.0);
}

/// Line from the source handle to the pointer while a connection is dragged.
fn draw_connection(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let Some(connect) = &state.connecting else {
		return;
	};
	let Some(source) = state.graph.nodes.get(connect.source_idx) else {
		return;
	};
	let ((x1, y1), _) = handle_point(source, source.source_handle, state.node_size);
	let (x2, y2) = connect.pointer;
	let k = state.transform.k;
	ctx.set_stroke_style_str(CONNECTION_LINE);
	ctx.set_line_width(1.0 / k.max(0.5));
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2, y2);
	ctx.stroke();
	ctx.begin_path();
	let _ = ctx.arc(x2, y2, HANDLE_RADIUS / k, 0.0, std::f64::consts::TAU);
	ctx.stroke();
}

/// Overview of the whole graph with the visible area left unmasked, drawn
/// in screen space.
fn draw_minimap(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	if state.graph.is_empty() {
		return;
	}
	let map = state.minimap();
	let NodeSize { width, height } = state.node_size;

	ctx.set_fill_style_str(MINIMAP_BACKGROUND);
	ctx.fill_rect(map.left, map.top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
	for node in &state.graph.nodes {
		let (x, y) = map.to_screen(node.position.x, node.position.y);
		ctx.set_fill_style_str(node.kind.border());
		ctx.fill_rect(x, y, (width * map.scale).max(1.0), (height * map.scale).max(1.0));
	}

	let visible = state.visible_bounds();
	let (vx0, vy0) = map.to_screen(visible.min_x, visible.min_y);
	let (vx1, vy1) = map.to_screen(visible.max_x, visible.max_y);
	ctx.save();
	ctx.begin_path();
	ctx.rect(map.left, map.top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
	ctx.clip();
	ctx.set_fill_style_str(MINIMAP_MASK);
	ctx.begin_path();
	ctx.rect(map.left, map.top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
	ctx.rect(vx0, vy0, vx1 - vx0, vy1 - vy0);
	ctx.fill_with_canvas_winding_rule(web_sys::CanvasWindingRule::Evenodd);
	ctx.restore();

	ctx.set_stroke_style_str(GRID_DOT);
	ctx.set_line_width(1.0);
	ctx.stroke_rect(map.left, map.top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
}

/// Shortens `label` to at most `max` characters, ending in an ellipsis.
fn fit_label(label: &str, max: usize) -> Cow<'_, str> {
	if label.chars().count() <= max {
		return Cow::Borrowed(label);
	}
	let mut short: String = label.chars().take(max.saturating_sub(1)).collect();
	short.push('…');
	Cow::Owned(short)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn long_labels_are_ellipsized() {
		assert_eq!(fit_label("Type: Company", 24), "Type: Company");
		assert_eq!(fit_label("Sales pipeline: Qualified lead", 10), "Sales pip…");
		assert_eq!(fit_label("Ünïcödé nämé", 5).chars().count(), 5);
	}
}
