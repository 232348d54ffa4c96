use super::catalog::{
	CLOUD_BOT_LEFT, CLOUD_BOT_MID, CLOUD_SERVER, GATEWAY_LEFT, GATEWAY_RIGHT,
	TERMINAL_DESKTOP_LEFT, TERMINAL_DESKTOP_RIGHT, TERMINAL_PHONE_LEFT, TERMINAL_PHONE_RIGHT,
	TERMINAL_USER,
};
use super::metrics::LayoutMetrics;
use super::surface::GraphSurface;
use super::types::{Layer, Point};

/// Position of the `index`-th of `total` siblings in `layer`, in canvas space
/// with the origin at the container centre.
///
/// Four edge agents form a parallelogram and three cloud agents a triangle;
/// every other count is spread evenly along the band.
pub fn position(layer: Layer, index: usize, total: usize, metrics: &LayoutMetrics) -> Point {
	let centers = metrics.band_centers();
	let row_height = metrics.rows().row_height;
	let band_width = metrics.band_width();

	match (layer, total) {
		(Layer::Edge, 4) => {
			let span = (band_width * 0.68).min(band_width - 80.0);
			let row_gap = (row_height * 0.45).clamp(64.0, 110.0);
			let shift = span * 0.06;
			let (left, right) = (-span / 2.0, span / 2.0);
			let slots = [
				Point::new(left, -row_gap / 2.0),
				Point::new(left + shift, row_gap / 2.0),
				Point::new(right - shift, -row_gap / 2.0),
				Point::new(right, row_gap / 2.0),
			];
			let slot = slots.get(index).copied().unwrap_or_default();
			Point::new(slot.x, slot.y + centers.edge)
		}
		(Layer::Cloud, 3) => {
			let span = (band_width * 0.78).min(band_width - 72.0);
			let row_gap = (row_height * 0.5).clamp(70.0, 120.0);
			let slots = [
				Point::new(-span / 2.0, row_gap / 2.0),
				Point::new(0.0, -row_gap / 2.0),
				Point::new(span / 2.0, row_gap / 2.0),
			];
			let slot = slots.get(index).copied().unwrap_or_default();
			Point::new(slot.x, slot.y + centers.cloud)
		}
		_ => {
			let spacing = if total > 1 {
				(band_width / (total - 1) as f64).clamp(metrics.min_spacing, metrics.max_spacing)
			} else {
				0.0
			};
			let start_x = -((total.saturating_sub(1)) as f64) * spacing / 2.0;
			let tilt = match (layer, total > 1) {
				(Layer::Cloud, true) => -12.0,
				(Layer::Edge, true) => 12.0,
				_ => 0.0,
			};
			let middle = (total.saturating_sub(1)) as f64 / 2.0;
			Point::new(
				start_x + index as f64 * spacing,
				centers.get(layer) + (index as f64 - middle) * tilt,
			)
		}
	}
}

fn to_dom(p: Point, metrics: &LayoutMetrics) -> Point {
	Point::new(p.x + metrics.width / 2.0, p.y + metrics.height / 2.0)
}

/// Map a layout point (origin at the metrics centre) onto a drawing surface.
/// Layer slots and decorations both pass through here, so they stay aligned
/// when the metrics are floored above the container size.
pub fn to_surface(p: Point, metrics: &LayoutMetrics, surface: Option<&dyn GraphSurface>) -> Point {
	match surface {
		Some(surface) => surface.dom_to_canvas(to_dom(p, metrics)),
		None => p,
	}
}

/// Horizontal push of an edge agent's companion, away from the centre line.
pub fn companion_position(agent: Point, metrics: &LayoutMetrics) -> Point {
	let offset = (metrics.width * 0.06).max(36.0);
	let direction = if agent.x >= 0.0 { 1.0 } else { -1.0 };
	Point::new(agent.x + direction * offset, agent.y)
}

/// Placement of every fixed infrastructure decoration, derived from the
/// canonical cloud/edge arrangements and clamped into its band.
pub fn decoration_layout(metrics: &LayoutMetrics) -> Vec<(&'static str, Point)> {
	let row_height = metrics.rows().row_height;
	let centers = metrics.band_centers();
	let cloud: Vec<Point> = (0..3).map(|i| position(Layer::Cloud, i, 3, metrics)).collect();
	let edge: Vec<Point> = (0..4).map(|i| position(Layer::Edge, i, 4, metrics)).collect();
	let terminal_base = position(Layer::Terminal, 0, 1, metrics).y;

	let width_half = metrics.width / 2.0 - 24.0;
	let height_half = metrics.height / 2.0 - 24.0;
	let band_half = metrics.band_width() / 2.0;
	let band_padding_x = (metrics.width * 0.08).max(42.0);
	let (band_min_x, band_max_x) = (-band_half + band_padding_x, band_half - band_padding_x);
	let band_padding_y = (row_height * 0.18).max(18.0);

	let cloud_limit = (width_half - cloud[0].x.abs()).max(40.0);
	let cloud_offset_x = (band_half * 0.22).max(metrics.width * 0.07).min(cloud_limit);
	let cloud_lift = (row_height * 0.14).max(8.0) * 1.4;

	let edge_limit = (width_half - edge[0].x.abs())
		.min(width_half - edge[2].x.abs())
		.max(50.0);
	let edge_offset_x = (band_half * 0.26).max(metrics.width * 0.08).min(edge_limit);
	let gateway_margin = (metrics.width * 0.008).max(6.0);
	let gateway_offset_x = (edge_offset_x * 1.05)
		.min(edge[1].x - band_min_x - gateway_margin)
		.min(band_max_x - edge[3].x - gateway_margin)
		.max(0.0);
	let gateway_side = gateway_offset_x.max(32.0) + 20.0;
	let edge_min_x = edge.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
	let edge_max_x = edge.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
	let edge_mid_y = (edge[0].y + edge[3].y) / 2.0;

	let device_count = 4.0;
	let device_spacing =
		(metrics.width * 0.16).max(96.0).min((metrics.width - 64.0) / (device_count - 1.0));
	let device_start_x = -(device_count - 1.0) * device_spacing / 2.0;
	let terminal_row_offset = (row_height * 0.18).max(22.0).min(40.0);
	let device_y = terminal_base - terminal_row_offset;
	let user_y = (terminal_base + terminal_row_offset).min(height_half - 10.0);

	let bounds = |layer: Layer| {
		let center = centers.get(layer);
		(
			center - row_height / 2.0 + band_padding_y,
			center + row_height / 2.0 - band_padding_y,
		)
	};
	let clamp = |layer: Layer, p: Point| {
		let (min_y, max_y) = bounds(layer);
		Point::new(p.x.clamp(band_min_x, band_max_x), p.y.clamp(min_y, max_y))
	};

	[
		(
			CLOUD_BOT_LEFT,
			Layer::Cloud,
			Point::new(cloud[0].x - cloud_offset_x, cloud[0].y - cloud_lift),
		),
		(
			CLOUD_BOT_MID,
			Layer::Cloud,
			Point::new(cloud[1].x - cloud_offset_x * 1.1, cloud[1].y - cloud_lift),
		),
		(
			CLOUD_SERVER,
			Layer::Cloud,
			Point::new(cloud[2].x + cloud_offset_x, cloud[2].y - cloud_lift),
		),
		(
			GATEWAY_LEFT,
			Layer::Edge,
			Point::new(edge_min_x - gateway_side, edge_mid_y),
		),
		(
			GATEWAY_RIGHT,
			Layer::Edge,
			Point::new(edge_max_x + gateway_side, edge_mid_y),
		),
		(
			TERMINAL_PHONE_LEFT,
			Layer::Terminal,
			Point::new(device_start_x, device_y),
		),
		(
			TERMINAL_DESKTOP_LEFT,
			Layer::Terminal,
			Point::new(device_start_x + device_spacing, device_y),
		),
		(
			TERMINAL_DESKTOP_RIGHT,
			Layer::Terminal,
			Point::new(device_start_x + device_spacing * 2.0, device_y),
		),
		(
			TERMINAL_PHONE_RIGHT,
			Layer::Terminal,
			Point::new(device_start_x + device_spacing * 3.0, device_y),
		),
		(TERMINAL_USER, Layer::Terminal, Point::new(0.0, user_y)),
	]
	.into_iter()
	.map(|(id, layer, p)| (id, clamp(layer, p)))
	.collect()
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::topology::surface::HostSurface;

	fn metrics() -> LayoutMetrics {
		LayoutMetrics::from_bounds(800.0, 600.0)
	}

	#[test]
	fn position_is_deterministic() {
		let m = metrics();
		for layer in Layer::ALL {
			for total in 1..7 {
				for index in 0..total {
					assert_eq!(
						position(layer, index, total, &m),
						position(layer, index, total, &m)
					);
				}
			}
		}
	}

	#[test]
	fn general_layout_never_overlaps() {
		let m = metrics();
		for layer in [Layer::Terminal, Layer::Cloud, Layer::Edge] {
			for total in 2..12 {
				if (layer, total) == (Layer::Edge, 4) || (layer, total) == (Layer::Cloud, 3) {
					continue;
				}
				let points: Vec<Point> = (0..total).map(|i| position(layer, i, total, &m)).collect();
				for (i, a) in points.iter().enumerate() {
					for b in &points[i + 1..] {
						assert!(a.distance(*b) > 1.0, "{layer:?} x{total}: {a:?} vs {b:?}");
					}
				}
			}
		}
	}

	#[test]
	fn single_member_is_centred() {
		let m = metrics();
		for layer in Layer::ALL {
			let p = position(layer, 0, 1, &m);
			assert_eq!(p.x, 0.0);
			assert_eq!(p.y, m.band_centers().get(layer));
		}
	}

	#[test]
	fn four_edge_agents_form_parallelogram() {
		let m = metrics();
		let points: Vec<Point> = (0..4).map(|i| position(Layer::Edge, i, 4, &m)).collect();
		let ys: BTreeSet<i64> = points.iter().map(|p| (p.y * 1000.0).round() as i64).collect();
		assert_eq!(ys.len(), 2);
		assert_eq!(points[0].x, -points[3].x);
		assert_eq!(points[1].x, -points[2].x);
		assert_eq!(points[0].y, points[2].y);
		assert_eq!(points[1].y, points[3].y);
	}

	#[test]
	fn three_cloud_agents_form_triangle() {
		let m = metrics();
		let [a, b, c]: [Point; 3] =
			std::array::from_fn(|i| position(Layer::Cloud, i, 3, &m));
		let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
		assert!(cross.abs() > 1.0);
		assert!(b.y < a.y);
		assert_eq!(a.y, c.y);
	}

	#[test]
	fn live_surface_transform_is_honoured() {
		let m = metrics();
		let mut surface = HostSurface::new(800.0, 600.0);
		let close = |a: Point, b: Point| a.distance(b) < 1e-9;
		let plain = position(Layer::Edge, 1, 3, &m);
		assert!(close(to_surface(plain, &m, Some(&surface)), plain));

		surface.transform.x += 50.0;
		surface.transform.y -= 20.0;
		let moved = to_surface(plain, &m, Some(&surface));
		assert!(close(moved, Point::new(plain.x - 50.0, plain.y + 20.0)));
		assert!(close(
			surface.canvas_to_dom(moved),
			to_dom(plain, &m)
		));
	}

	#[test]
	fn decorations_stay_inside_their_bands() {
		let m = metrics();
		let rows = m.rows();
		let centers = m.band_centers();
		let layout = decoration_layout(&m);
		assert_eq!(layout.len(), 10);
		for (id, p) in layout {
			let layer = if id.contains("cloud") {
				Layer::Cloud
			} else if id.contains("edge") {
				Layer::Edge
			} else {
				Layer::Terminal
			};
			let center = centers.get(layer);
			assert!((p.y - center).abs() <= rows.row_height / 2.0, "{id} at {p:?}");
			assert!(p.x.abs() <= m.width / 2.0, "{id} at {p:?}");
		}
	}

	#[test]
	fn companion_moves_outward() {
		let m = metrics();
		assert!(companion_position(Point::new(-10.0, 0.0), &m).x < -10.0);
		assert!(companion_position(Point::new(10.0, 0.0), &m).x > 10.0);
	}
}
