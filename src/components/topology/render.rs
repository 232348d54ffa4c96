use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::catalog::Icon;
use super::edges::{EdgeStyle, FLOW_COLOR, Smooth};
use super::state::{HoverInfo, TopologyState};
use super::types::{Layer, Point};

const BACKGROUND: &str = "#f5f7fb";
const LABEL_COLOR: &str = "#1b1b1b";
const TOOLTIP_FONT: f64 = 12.0;
const TOOLTIP_PADDING: f64 = 6.0;
/// Dash offset advance of the static graph, px/s.
const GRAPH_DASH_SPEED: f64 = 12.0;

fn set_dashes(ctx: &CanvasRenderingContext2d, dashes: [f64; 2], k: f64) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dashes[0] / k),
		&JsValue::from_f64(dashes[1] / k),
	));
}

fn stroke_curve(ctx: &CanvasRenderingContext2d, start: Point, end: Point, smooth: Smooth) {
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	match smooth.control_point(start, end) {
		Some(c) => ctx.quadratic_curve_to(c.x, c.y, end.x, end.y),
		None => ctx.line_to(end.x, end.y),
	}
	ctx.stroke();
}

/// Static graph: edges, nodes and labels in canvas space.
pub fn render_graph(state: &TopologyState, ctx: &CanvasRenderingContext2d, dpr: f64) {
	let surface = &state.surface;
	let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, surface.width, surface.height);
	ctx.save();
	let _ = ctx.translate(surface.transform.x, surface.transform.y);
	let _ = ctx.scale(surface.transform.k, surface.transform.k);
	draw_bands(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn band_colors(layer: Layer) -> (&'static str, &'static str) {
	match layer {
		Layer::Cloud => ("rgba(59, 130, 246, 0.06)", "#1a73e8"),
		Layer::Edge => ("rgba(245, 124, 0, 0.06)", "#f57c00"),
		Layer::Terminal => ("rgba(123, 31, 162, 0.06)", "#7b1fa2"),
	}
}

fn draw_bands(state: &TopologyState, ctx: &CanvasRenderingContext2d) {
	let k = state.surface.transform.k;
	ctx.set_font(&format!("bold {}px sans-serif", 11.0 / k.max(0.5)));
	ctx.set_text_align("left");
	for band in state.band_rects() {
		let (face, title) = band_colors(band.layer);
		ctx.set_fill_style_str(face);
		ctx.fill_rect(band.origin.x, band.origin.y, band.width, band.height);
		ctx.set_fill_style_str(title);
		let _ = ctx.fill_text(band.layer.title(), band.origin.x + 10.0, band.origin.y + 18.0);
	}
}

fn draw_edges(state: &TopologyState, ctx: &CanvasRenderingContext2d) {
	let surface = &state.surface;
	let k = surface.transform.k;
	let dash_offset = -(state.graph_time * GRAPH_DASH_SPEED) % 24.0;

	surface.graph.visit_edges(|n1, n2, _| {
		if n1.data.user_data.hidden || n2.data.user_data.hidden {
			return;
		}
		let Some(edge) = surface.edge_for(n1.index(), n2.index()) else {
			return;
		};
		let (mut start, mut end) = (
			Point::new(n1.x() as f64, n1.y() as f64),
			Point::new(n2.x() as f64, n2.y() as f64),
		);
		if edge.from != n1.data.user_data.id {
			std::mem::swap(&mut start, &mut end);
		}
		if start.distance(end) < 0.001 {
			return;
		}

		let EdgeStyle {
			color,
			width,
			dashes,
			smooth,
		} = state.edge_style(edge);
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width / k);
		set_dashes(ctx, dashes, k);
		ctx.set_line_dash_offset(dash_offset / k);
		stroke_curve(ctx, start, end, smooth);
	});
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_icon(ctx: &CanvasRenderingContext2d, icon: Icon, x: f64, y: f64, r: f64) {
	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.begin_path();
	match icon {
		Icon::Bot => {
			ctx.rect(x - r * 0.5, y - r * 0.35, r, r * 0.7);
			ctx.fill();
			ctx.set_fill_style_str("#ffffff");
			ctx.begin_path();
			let _ = ctx.arc(x - r * 0.2, y - r * 0.05, r * 0.1, 0.0, 2.0 * PI);
			let _ = ctx.arc(x + r * 0.2, y - r * 0.05, r * 0.1, 0.0, 2.0 * PI);
		}
		Icon::Gateway => {
			ctx.move_to(x, y - r * 0.6);
			ctx.line_to(x + r * 0.6, y);
			ctx.line_to(x, y + r * 0.6);
			ctx.line_to(x - r * 0.6, y);
			ctx.close_path();
		}
		Icon::Phone => ctx.rect(x - r * 0.3, y - r * 0.55, r * 0.6, r * 1.1),
		Icon::Desktop => {
			ctx.rect(x - r * 0.6, y - r * 0.45, r * 1.2, r * 0.75);
			ctx.rect(x - r * 0.1, y + r * 0.3, r * 0.2, r * 0.25);
		}
		Icon::User => {
			let _ = ctx.arc(x, y - r * 0.25, r * 0.28, 0.0, 2.0 * PI);
			ctx.fill();
			ctx.begin_path();
			let _ = ctx.arc(x, y + r * 0.55, r * 0.5, PI, 2.0 * PI);
		}
	}
	ctx.fill();
}

fn draw_nodes(state: &TopologyState, ctx: &CanvasRenderingContext2d) {
	let k = state.surface.transform.k;

	state.surface.graph.visit_nodes(|node| {
		let host = &node.data.user_data;
		if host.hidden {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let style = host.style;
		let radius = state.node_radius(&host.id, style.radius);

		if state.is_highlighted(&host.id) {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.5, x, y, radius * 1.8) {
				let _ = gradient.add_color_stop(0.0, "rgba(255, 215, 0, 0.45)");
				let _ = gradient.add_color_stop(1.0, "rgba(255, 215, 0, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius * 1.8, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(style.fill);
		ctx.fill();
		ctx.set_stroke_style_str(style.border);
		ctx.set_line_width(style.border_width / k);
		ctx.stroke();

		if let Some(icon) = style.icon {
			draw_icon(ctx, icon, x, y, radius);
		}

		ctx.set_fill_style_str(LABEL_COLOR);
		ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
		ctx.set_text_align("center");
		let _ = ctx.fill_text(&host.label, x, y + radius + 13.0 / k.max(0.5));
	});
}

/// Flow overlay: dashed segments and particles in container pixels. The
/// overlay is always cleared, so an expired flow leaves nothing behind.
pub fn render_flow(state: &TopologyState, ctx: &CanvasRenderingContext2d, dpr: f64) {
	let surface = &state.surface;
	let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
	ctx.clear_rect(0.0, 0.0, surface.width, surface.height);

	let radius = state.config.flow.dot_radius;
	for segment in state.flow.frame(surface, state.store.edges()) {
		ctx.set_stroke_style_str(FLOW_COLOR);
		ctx.set_line_width(segment.style.width.max(2.0));
		set_dashes(ctx, [10.0, 8.0], 1.0);
		ctx.set_line_dash_offset(-segment.dash_offset);
		ctx.begin_path();
		ctx.move_to(segment.start.x, segment.start.y);
		match segment.control {
			Some(c) => ctx.quadratic_curve_to(c.x, c.y, segment.end.x, segment.end.y),
			None => ctx.line_to(segment.end.x, segment.end.y),
		}
		ctx.stroke();

		ctx.set_fill_style_str(FLOW_COLOR);
		for p in &segment.particles {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
			ctx.fill();
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	if let Some(hover) = &state.hover {
		draw_tooltip(ctx, hover, surface.width, surface.height);
	}
}

/// Tooltip box below-right of the pointer, kept inside the container.
fn draw_tooltip(ctx: &CanvasRenderingContext2d, hover: &HoverInfo, width: f64, height: f64) {
	ctx.set_font(&format!("{TOOLTIP_FONT}px sans-serif"));
	ctx.set_text_align("left");
	let text_width = hover
		.lines
		.iter()
		.filter_map(|line| ctx.measure_text(line).ok())
		.map(|metrics| metrics.width())
		.fold(0.0, f64::max);
	let line_height = TOOLTIP_FONT * 1.35;
	let box_w = text_width + TOOLTIP_PADDING * 2.0;
	let box_h = line_height * hover.lines.len() as f64 + TOOLTIP_PADDING * 2.0;
	let x = (hover.at.x + 12.0).min(width - box_w - 4.0).max(4.0);
	let y = (hover.at.y + 12.0).min(height - box_h - 4.0).max(4.0);

	ctx.set_fill_style_str("rgba(27, 27, 27, 0.88)");
	ctx.fill_rect(x, y, box_w, box_h);
	ctx.set_fill_style_str("#ffffff");
	for (i, line) in hover.lines.iter().enumerate() {
		let baseline = y + TOOLTIP_PADDING + line_height * (i as f64 + 0.8);
		let _ = ctx.fill_text(line, x + TOOLTIP_PADDING, baseline);
	}
}
