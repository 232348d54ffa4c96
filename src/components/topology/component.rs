use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, ResizeObserver};

use super::bridge::{self, now_ms};
use super::config::TopologyConfig;
use super::render;
use super::state::TopologyState;
use super::types::{NodeDescriptor, Point};

type FrameCallback = Closure<dyn FnMut(f64)>;

fn request_frame(callback: &FrameCallback) -> Option<i32> {
	web_sys::window()?
		.request_animation_frame(callback.as_ref().unchecked_ref())
		.ok()
}

fn device_pixel_ratio() -> f64 {
	web_sys::window().map_or(1.0, |w| w.device_pixel_ratio().max(1.0))
}

fn container_size(container: &HtmlElement) -> (f64, f64) {
	(
		container.client_width() as f64,
		container.client_height() as f64,
	)
}

fn size_canvas(canvas: &HtmlCanvasElement, width: f64, height: f64, dpr: f64) {
	canvas.set_width((width * dpr) as u32);
	canvas.set_height((height * dpr) as u32);
	// leptos' ElementExt also has a `style`, so name the inherent one
	let style = HtmlElement::style(canvas);
	let _ = style.set_property("width", &format!("{width}px"));
	let _ = style.set_property("height", &format!("{height}px"));
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// A self-rescheduling animation frame loop. `step` returns false to stop.
struct FrameLoop {
	handle: Rc<Cell<Option<i32>>>,
	callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl FrameLoop {
	fn start(mut step: impl FnMut(f64) -> bool + 'static) -> Self {
		let handle = Rc::new(Cell::new(None));
		let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
		let (handle_inner, callback_inner) = (handle.clone(), Rc::downgrade(&callback));
		*callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			handle_inner.set(None);
			if !step(timestamp) {
				return;
			}
			if let Some(callback) = callback_inner.upgrade() {
				if let Some(ref cb) = *callback.borrow() {
					handle_inner.set(request_frame(cb));
				}
			}
		}));
		if let Some(ref cb) = *callback.borrow() {
			handle.set(request_frame(cb));
		}
		Self { handle, callback }
	}

	fn cancel(&self) {
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.callback.borrow_mut().take();
	}
}

/// Owns every callback a mounted topology registers: both frame loops, the
/// resize observer and the bridge handle. `dispose` (or drop) tears all of
/// them down.
pub struct TopologyController {
	state: Rc<RefCell<TopologyState>>,
	host_loop: FrameLoop,
	flow_loop: FrameLoop,
	observer: Option<ResizeObserver>,
	_on_resize: Closure<dyn FnMut(js_sys::Array)>,
	disposed: Cell<bool>,
}

impl TopologyController {
	pub fn start(
		container: HtmlElement,
		graph: HtmlCanvasElement,
		overlay: HtmlCanvasElement,
		config: TopologyConfig,
		agents: &[NodeDescriptor],
		seed: u64,
	) -> Option<Self> {
		let (width, height) = container_size(&container);
		let dpr = device_pixel_ratio();
		size_canvas(&graph, width, height, dpr);
		size_canvas(&overlay, width, height, dpr);
		let graph_ctx = context_2d(&graph)?;
		let overlay_ctx = context_2d(&overlay)?;

		let state = Rc::new(RefCell::new(TopologyState::new(
			config, agents, seed, width, height,
		)));
		bridge::install(&state);

		let (state_host, container_host) = (state.clone(), container.clone());
		let host_loop = FrameLoop::start(move |now| {
			if !container_host.is_connected() {
				bridge::release(&state_host);
				if let Ok(mut s) = state_host.try_borrow_mut() {
					s.dispose();
				}
				debug!("topology container detached, host loop stopped");
				return false;
			}
			let Ok(mut s) = state_host.try_borrow_mut() else {
				return true;
			};
			let dpr = device_pixel_ratio();
			if s.advance_host(now) {
				size_canvas(&graph, s.surface.width, s.surface.height, dpr);
				size_canvas(&overlay, s.surface.width, s.surface.height, dpr);
			}
			render::render_graph(&s, &graph_ctx, dpr);
			true
		});

		let (state_flow, container_flow) = (state.clone(), container.clone());
		let flow_loop = FrameLoop::start(move |now| {
			if !container_flow.is_connected() {
				return false;
			}
			let Ok(mut s) = state_flow.try_borrow_mut() else {
				return true;
			};
			s.advance_flow(now);
			render::render_flow(&s, &overlay_ctx, device_pixel_ratio());
			true
		});

		let (state_resize, container_resize) = (state.clone(), container.clone());
		let on_resize = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries| {
			let (w, h) = container_size(&container_resize);
			if let Ok(mut s) = state_resize.try_borrow_mut() {
				s.request_resize(w, h, now_ms());
			}
		});
		let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref()).ok();
		match &observer {
			Some(observer) => observer.observe(&container),
			None => warn!("ResizeObserver unavailable, layout will not follow the container"),
		}

		Some(Self {
			state,
			host_loop,
			flow_loop,
			observer,
			_on_resize: on_resize,
			disposed: Cell::new(false),
		})
	}

	pub fn click(&self, dom: Point) {
		let Ok(mut s) = self.state.try_borrow_mut() else {
			return;
		};
		if let Some(outcome) = s.handle_click(dom, now_ms()) {
			debug!("click: {outcome:?}");
		}
	}

	pub fn hover(&self, dom: Option<Point>) {
		let Ok(mut s) = self.state.try_borrow_mut() else {
			return;
		};
		match dom {
			Some(dom) => {
				s.hover_at(dom);
			}
			None => s.clear_hover(),
		}
	}

	/// Cancel both frame loops, disconnect the observer and forget the bridge
	/// handle. Safe to call more than once.
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}
		self.host_loop.cancel();
		self.flow_loop.cancel();
		if let Some(observer) = &self.observer {
			observer.disconnect();
		}
		bridge::release(&self.state);
		if let Ok(mut s) = self.state.try_borrow_mut() {
			s.dispose();
		}
	}
}

impl Drop for TopologyController {
	fn drop(&mut self) {
		self.dispose();
	}
}

#[component]
pub fn TopologyCanvas(
	#[prop(optional)] config: TopologyConfig,
	#[prop(into)] agents: Vec<NodeDescriptor>,
	#[prop(default = 7)] seed: u64,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let graph_ref = NodeRef::<leptos::html::Canvas>::new();
	let overlay_ref = NodeRef::<leptos::html::Canvas>::new();
	let controller = StoredValue::new_local(None::<TopologyController>);

	Effect::new(move |_| {
		let (Some(container), Some(graph), Some(overlay)) =
			(container_ref.get(), graph_ref.get(), overlay_ref.get())
		else {
			return;
		};
		if controller.with_value(|c| c.is_some()) {
			return;
		}
		let started = TopologyController::start(
			container.into(),
			graph,
			overlay,
			config.clone(),
			&agents,
			seed,
		);
		if started.is_none() {
			warn!("topology canvas has no 2d context");
		}
		controller.set_value(started);
	});

	on_cleanup(move || {
		let _ = controller.try_update_value(|c| c.take());
	});

	let local_point = move |ev: &MouseEvent| {
		let rect = container_ref.get()?.get_bounding_client_rect();
		Some(Point::new(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let on_click = move |ev: MouseEvent| {
		let Some(dom) = local_point(&ev) else {
			return;
		};
		controller.with_value(|c| {
			if let Some(c) = c {
				c.click(dom);
			}
		});
	};

	let on_mouse_move = move |ev: MouseEvent| {
		let dom = local_point(&ev);
		controller.with_value(|c| {
			if let Some(c) = c {
				c.hover(dom);
			}
		});
	};

	let on_mouse_leave = move |_: MouseEvent| {
		controller.with_value(|c| {
			if let Some(c) = c {
				c.hover(None);
			}
		});
	};

	view! {
		<div
			node_ref=container_ref
			class="topology"
			on:click=on_click
			on:mousemove=on_mouse_move
			on:mouseleave=on_mouse_leave
			style="position: relative; width: 100%; height: 100%; overflow: hidden;"
		>
			<canvas
				node_ref=graph_ref
				class="topology-graph"
				style="position: absolute; inset: 0; display: block;"
			/>
			<canvas
				node_ref=overlay_ref
				class="topology-flow"
				style="position: absolute; inset: 0; display: block; pointer-events: none;"
			/>
		</div>
	}
}
