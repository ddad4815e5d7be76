use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::render;
use super::state::GraphViewState;
use crate::graph::{Graph, NodeSize};

type SharedState = Rc<RefCell<Option<GraphViewState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

const FRAME_SECONDS: f64 = 0.016;

/// Bookkeeping for the pending animation frame of one canvas.
#[derive(Debug, Default)]
struct FrameSlot {
	pending: Option<i32>,
	stopped: bool,
}

impl FrameSlot {
	fn is_stopped(&self) -> bool {
		self.stopped
	}

	fn scheduled(&mut self, request_id: i32) {
		self.pending = Some(request_id);
	}

	fn fired(&mut self) {
		self.pending = None;
	}

	/// Stops the loop; returns the request that still has to be cancelled.
	fn stop(&mut self) -> Option<i32> {
		self.stopped = true;
		self.pending.take()
	}
}

/// Browser-side handles of a mounted canvas, released on unmount.
struct CanvasRuntime {
	animate: FrameCallback,
	resize: FrameCallback,
	frame: Rc<RefCell<FrameSlot>>,
}

impl CanvasRuntime {
	fn teardown(&self) {
		let window = web_sys::window();
		let pending = self.frame.borrow_mut().stop();
		if let (Some(win), Some(id)) = (&window, pending) {
			let _ = win.cancel_animation_frame(id);
		}
		if let Some(cb) = self.resize.borrow_mut().take() {
			if let Some(win) = &window {
				let _ =
					win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
		// the frame closure owns a handle to itself; dropping it ends the cycle
		self.animate.borrow_mut().take();
		debug!("graph canvas released");
	}
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((800.0, 600.0))
}

/// Pointer position relative to the canvas' top-left corner.
fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas view of a laid-out relationship graph.
///
/// Clicking a node focuses its neighborhood, clicking it again or the
/// background clears the focus. Nodes can be dragged, the background pans
/// and the wheel zooms. Dragging from a node's source handle onto another
/// node connects the two, Delete or Backspace removes the focused node. The
/// lock control freezes dragging, connecting and deleting.
#[component]
pub fn RelationGraphCanvas(
	#[prop(into)] graph: Signal<Graph>,
	#[prop(default = NodeSize::default())] node_size: NodeSize,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let frame = Rc::new(RefCell::new(FrameSlot::default()));
	let (state_init, animate_init, resize_cb_init, frame_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), frame.clone());
	let locked = RwSignal::new(false);

	let runtime = StoredValue::new_local(CanvasRuntime {
		animate,
		resize: resize_cb,
		frame,
	});
	on_cleanup(move || {
		runtime.try_with_value(CanvasRuntime::teardown);
	});

	Effect::new(move |_| {
		let graph = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		debug!(
			"graph canvas: {} nodes, {} edges at {w}x{h}",
			graph.nodes.len(),
			graph.edges.len()
		);
		let mut view_state = GraphViewState::new(graph, node_size, w, h);
		view_state.interactive = !locked.get_untracked();
		*state_init.borrow_mut() = Some(view_state);

		// The resize listener and frame loop outlive graph refreshes.
		if frame_init.borrow().is_stopped() {
			return;
		}
		if resize_cb_init.borrow().is_none() {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let (nw, nh) = parent_size(&canvas_resize);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("canvas 2d context unavailable");
				return;
			}
		};
		let (state_anim, animate_inner, frame_anim) =
			(state_init.clone(), animate_init.clone(), frame_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			frame_anim.borrow_mut().fired();
			if frame_anim.borrow().is_stopped() {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(FRAME_SECONDS);
				render::render(s, &ctx);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
					frame_anim.borrow_mut().scheduled(id);
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				frame_init.borrow_mut().scheduled(id);
			}
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up(x, y);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	let state_key = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if !matches!(ev.key().as_str(), "Delete" | "Backspace") {
			return;
		}
		if let Some(ref mut s) = *state_key.borrow_mut() {
			if s.remove_focused() {
				ev.prevent_default();
			}
		}
	};

	let state_fit = state.clone();
	let on_fit = move |_| {
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			s.fit_view();
		}
	};

	let state_zoom_in = state.clone();
	let on_zoom_in = move |_| {
		if let Some(ref mut s) = *state_zoom_in.borrow_mut() {
			s.zoom_step(true);
		}
	};

	let state_zoom_out = state.clone();
	let on_zoom_out = move |_| {
		if let Some(ref mut s) = *state_zoom_out.borrow_mut() {
			s.zoom_step(false);
		}
	};

	let state_lock = state.clone();
	let on_lock = move |_| {
		if let Some(ref mut s) = *state_lock.borrow_mut() {
			s.toggle_interactive();
			locked.set(!s.interactive);
		}
	};

	view! {
		<div class="relation-graph">
			<canvas
				node_ref=canvas_ref
				class="relation-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				tabindex="0"
				style="display: block; cursor: grab; outline: none;"
			/>
			<div class="relation-graph-controls">
				<button title="Zoom in" on:click=on_zoom_in>
					"+"
				</button>
				<button title="Zoom out" on:click=on_zoom_out>
					"−"
				</button>
				<button title="Fit view" on:click=on_fit>
					"Fit"
				</button>
				<button title="Toggle interactivity" on:click=on_lock>
					{move || if locked.get() { "Unlock" } else { "Lock" }}
				</button>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stopped_frame_slot_hands_back_the_pending_request_once() {
		let mut slot = FrameSlot::default();
		slot.scheduled(7);
		assert!(!slot.is_stopped());

		assert_eq!(slot.stop(), Some(7));
		assert!(slot.is_stopped());
		assert_eq!(slot.stop(), None);
	}

	#[test]
	fn fired_frame_leaves_nothing_to_cancel() {
		let mut slot = FrameSlot::default();
		slot.scheduled(3);
		slot.fired();
		assert_eq!(slot.stop(), None);
	}
}
