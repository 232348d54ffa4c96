use std::collections::HashMap;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::catalog::{self, Icon};
use super::edges::TopologyEdge;
use super::types::{Layer, NodeKind, Point, TopologyNode};

pub const HIT_RADIUS: f64 = 18.0;
/// Pointer slack around an edge, in container pixels.
pub const EDGE_HIT: f64 = 6.0;
const CURVE_SAMPLES: usize = 16;

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let length_sq = dx * dx + dy * dy;
	if length_sq <= f64::EPSILON {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
	p.distance(a.lerp(b, t))
}

/// What the topology core needs from the backing graph host: its node and
/// edge sets, live positions and the DOM <-> canvas transform.
pub trait GraphSurface {
	/// Replace the node and edge datasets.
	fn sync(&mut self, nodes: &[TopologyNode], edges: &[TopologyEdge]);
	/// Move nodes; unknown ids are ignored.
	fn set_positions(&mut self, updates: &[(String, Point)]);
	fn position(&self, id: &str) -> Option<Point>;
	fn positions(&self) -> HashMap<String, Point>;
	fn dom_to_canvas(&self, p: Point) -> Point;
	fn canvas_to_dom(&self, p: Point) -> Point;
	/// Selectable node under a DOM-space point.
	fn node_at(&self, dom: Point) -> Option<String>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub radius: f64,
	pub fill: &'static str,
	pub border: &'static str,
	pub border_width: f64,
	pub icon: Option<Icon>,
	pub selectable: bool,
}

impl NodeStyle {
	pub fn for_node(node: &TopologyNode) -> Self {
		let agent = |radius: f64, border: &'static str, border_width: f64| NodeStyle {
			radius,
			fill: "#1d3f8f",
			border,
			border_width,
			icon: None,
			selectable: true,
		};
		match &node.kind {
			NodeKind::Agent(Layer::Cloud) => agent(12.0, "#1a73e8", 2.0),
			NodeKind::Agent(Layer::Edge) => agent(16.8, "#f57c00", 1.8),
			NodeKind::Agent(Layer::Terminal) => agent(14.4, "#7b1fa2", 1.6),
			NodeKind::Extension { .. } => NodeStyle {
				radius: 8.4,
				fill: "#3a5fb7",
				border: "#1d3f8f",
				border_width: 1.2,
				icon: Some(Icon::Bot),
				selectable: false,
			},
			NodeKind::Decoration => {
				let meta = catalog::decoration(&node.id);
				NodeStyle {
					radius: meta.map_or(12.0, |m| m.size * 0.6),
					fill: "#ffffff",
					border: "#1b1b1b",
					border_width: 1.5,
					icon: Some(meta.map_or(Icon::Bot, |m| m.icon)),
					selectable: false,
				}
			}
		}
	}
}

#[derive(Clone, Debug)]
pub struct HostNode {
	pub id: String,
	pub label: String,
	pub hidden: bool,
	pub style: NodeStyle,
}

/// Pan/zoom from canvas space to container pixels.
#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

/// Graph host backed by a `ForceGraph`. Physics stays off: every node is
/// anchored and the simulation is never stepped, so positions only change
/// through `set_positions`.
pub struct HostSurface {
	pub graph: ForceGraph<HostNode, ()>,
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	ids: HashMap<String, DefaultNodeIdx>,
	edges: HashMap<(DefaultNodeIdx, DefaultNodeIdx), TopologyEdge>,
}

fn empty_graph() -> ForceGraph<HostNode, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 0.0,
		force_spring: 0.0,
		force_max: 0.0,
		node_speed: 0.0,
		damping_factor: 0.0,
	})
}

impl HostSurface {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: empty_graph(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			width,
			height,
			ids: HashMap::new(),
			edges: HashMap::new(),
		}
	}

	/// Track a new container size and re-centre the view on the origin.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.transform = ViewTransform {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		};
	}

	/// Edge drawn between two host nodes, in either orientation.
	pub fn edge_for(&self, a: DefaultNodeIdx, b: DefaultNodeIdx) -> Option<&TopologyEdge> {
		self.edges.get(&(a, b)).or_else(|| self.edges.get(&(b, a)))
	}

	fn closest_node(&self, dom: Point, selectable_only: bool) -> Option<String> {
		let target = self.dom_to_canvas(dom);
		let mut best: Option<(f64, String)> = None;
		self.graph.visit_nodes(|node| {
			let host = &node.data.user_data;
			if host.hidden || (selectable_only && !host.style.selectable) {
				return;
			}
			let d = target.distance(Point::new(node.x() as f64, node.y() as f64));
			// radius is world-space, so it scales with zoom like the node
			if d < host.style.radius.max(HIT_RADIUS)
				&& best.as_ref().is_none_or(|(closest, _)| d < *closest)
			{
				best = Some((d, host.id.clone()));
			}
		});
		best.map(|(_, id)| id)
	}

	/// Any visible node under a DOM-space point, decorations included.
	pub fn visible_node_at(&self, dom: Point) -> Option<String> {
		self.closest_node(dom, false)
	}

	/// Visible edge passing within `EDGE_HIT` of a DOM-space point, following
	/// the curve it is drawn with.
	pub fn edge_at(&self, dom: Point) -> Option<&TopologyEdge> {
		let target = self.dom_to_canvas(dom);
		let slack = EDGE_HIT / self.transform.k.max(f64::EPSILON);
		let mut best: Option<(f64, &TopologyEdge)> = None;
		self.graph.visit_edges(|n1, n2, _| {
			if n1.data.user_data.hidden || n2.data.user_data.hidden {
				return;
			}
			let Some(edge) = self.edge_for(n1.index(), n2.index()) else {
				return;
			};
			let (mut start, mut end) = (
				Point::new(n1.x() as f64, n1.y() as f64),
				Point::new(n2.x() as f64, n2.y() as f64),
			);
			if edge.from != n1.data.user_data.id {
				std::mem::swap(&mut start, &mut end);
			}
			let smooth = edge.style.smooth;
			let d = (0..CURVE_SAMPLES)
				.map(|i| {
					let t0 = i as f64 / CURVE_SAMPLES as f64;
					let t1 = (i + 1) as f64 / CURVE_SAMPLES as f64;
					segment_distance(target, smooth.point_at(start, end, t0), smooth.point_at(start, end, t1))
				})
				.fold(f64::INFINITY, f64::min);
			if d <= slack && best.is_none_or(|(closest, _)| d < closest) {
				best = Some((d, edge));
			}
		});
		best.map(|(_, edge)| edge)
	}
}

impl GraphSurface for HostSurface {
	fn sync(&mut self, nodes: &[TopologyNode], edges: &[TopologyEdge]) {
		let mut graph = empty_graph();
		let mut ids = HashMap::new();
		for node in nodes {
			let idx = graph.add_node(NodeData {
				x: node.position.x as f32,
				y: node.position.y as f32,
				mass: 10.0,
				is_anchor: true,
				user_data: HostNode {
					id: node.id.clone(),
					label: node.label.clone(),
					hidden: node.hidden,
					style: NodeStyle::for_node(node),
				},
			});
			ids.insert(node.id.clone(), idx);
		}
		let mut lookup = HashMap::new();
		for edge in edges {
			if let (Some(&from), Some(&to)) = (ids.get(&edge.from), ids.get(&edge.to)) {
				graph.add_edge(from, to, EdgeData::default());
				lookup.insert((from, to), edge.clone());
			}
		}
		self.graph = graph;
		self.ids = ids;
		self.edges = lookup;
	}

	fn set_positions(&mut self, updates: &[(String, Point)]) {
		let by_idx: HashMap<DefaultNodeIdx, Point> = updates
			.iter()
			.filter_map(|(id, p)| self.ids.get(id).map(|&idx| (idx, *p)))
			.collect();
		self.graph.visit_nodes_mut(|node| {
			if let Some(p) = by_idx.get(&node.index()) {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
			}
		});
	}

	fn position(&self, id: &str) -> Option<Point> {
		let idx = *self.ids.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(Point::new(node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	fn positions(&self) -> HashMap<String, Point> {
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			out.insert(
				node.data.user_data.id.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		out
	}

	fn dom_to_canvas(&self, p: Point) -> Point {
		Point::new(
			(p.x - self.transform.x) / self.transform.k,
			(p.y - self.transform.y) / self.transform.k,
		)
	}

	fn canvas_to_dom(&self, p: Point) -> Point {
		Point::new(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	fn node_at(&self, dom: Point) -> Option<String> {
		self.closest_node(dom, true)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::topology::store::TopologyStore;

	#[test]
	fn transform_round_trips() {
		let mut surface = HostSurface::new(800.0, 600.0);
		surface.transform = ViewTransform {
			x: 410.0,
			y: 290.0,
			k: 2.0,
		};
		let p = Point::new(12.5, -40.0);
		assert_eq!(surface.dom_to_canvas(surface.canvas_to_dom(p)), p);
		assert_eq!(surface.canvas_to_dom(Point::default()), Point::new(410.0, 290.0));
	}

	#[test]
	fn sync_mirrors_roster_positions() {
		let store = TopologyStore::demo(3);
		let mut surface = HostSurface::new(800.0, 600.0);
		surface.sync(store.nodes(), store.edges());
		assert_eq!(surface.positions().len(), store.nodes().len());

		surface.set_positions(&[("agent-map".into(), Point::new(5.0, 6.0))]);
		assert_eq!(surface.position("agent-map"), Some(Point::new(5.0, 6.0)));
		assert_eq!(surface.position("missing"), None);
	}

	#[test]
	fn hit_testing_skips_decorations_and_hidden_nodes() {
		let store = TopologyStore::demo(3);
		let mut surface = HostSurface::new(800.0, 600.0);
		surface.sync(store.nodes(), store.edges());
		surface.set_positions(&[
			("agent-map".into(), Point::new(100.0, 0.0)),
			("infra-edge-gateway-left".into(), Point::new(-100.0, 0.0)),
		]);
		assert_eq!(
			surface.node_at(Point::new(505.0, 300.0)),
			Some("agent-map".to_string())
		);
		assert_eq!(surface.node_at(Point::new(300.0, 300.0)), None);
		assert_eq!(
			surface.visible_node_at(Point::new(300.0, 300.0)),
			Some("infra-edge-gateway-left".to_string())
		);
	}

	#[test]
	fn edge_hit_follows_the_drawn_line() {
		let store = TopologyStore::demo(3);
		let mut surface = HostSurface::new(800.0, 600.0);
		surface.sync(store.nodes(), store.edges());
		let edge = store.edge_between("agent-map", "agent-report").unwrap().clone();
		assert_eq!(edge.style.smooth, crate::components::topology::edges::Smooth::Straight);
		surface.set_positions(&[
			(edge.from.clone(), Point::new(-100.0, 200.0)),
			(edge.to.clone(), Point::new(100.0, 200.0)),
		]);

		let on_line = Point::new(400.0, 503.0);
		assert_eq!(surface.edge_at(on_line).map(|e| e.id.as_str()), Some(edge.id.as_str()));
		assert_eq!(surface.edge_at(Point::new(400.0, 520.0)), None);
	}
}
