use std::collections::{BTreeMap, HashMap, HashSet};

use super::catalog::{CLOUD_BOTS, EDGE_COMPANIONS, GATEWAYS, TERMINAL_DEVICES, TERMINAL_USER};
use super::extension::{member_order, parent_index};
use super::types::{Layer, Point, TopologyNode};

pub const EDGE_COLOR: &str = "#2e4f93";
pub const CLOUD_COLOR: &str = "#3b82f6";
pub const TERMINAL_COLOR: &str = "#22c55e";
pub const EXTENSION_COLOR: &str = "#2e4f93";
pub const HIGHLIGHT_COLOR: &str = "#ffd700";
pub const FLOW_COLOR: &str = "#ff3d00";

/// Curvature of an edge. Curved edges bend around the midpoint by
/// `roundness * length`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Smooth {
	Straight,
	CurvedCw(f64),
	CurvedCcw(f64),
}

impl Smooth {
	/// Clockwise for even indices, counter-clockwise for odd ones.
	pub fn alternating(index: usize, roundness: f64) -> Self {
		if index % 2 == 0 {
			Smooth::CurvedCw(roundness)
		} else {
			Smooth::CurvedCcw(roundness)
		}
	}

	pub fn control_point(self, start: Point, end: Point) -> Option<Point> {
		let (roundness, direction) = match self {
			Smooth::Straight => return None,
			Smooth::CurvedCw(r) => (r, -1.0),
			Smooth::CurvedCcw(r) => (r, 1.0),
		};
		let (dx, dy) = (end.x - start.x, end.y - start.y);
		let distance = match dx.hypot(dy) {
			d if d > 0.0 => d,
			_ => 1.0,
		};
		let (nx, ny) = (-dy / distance, dx / distance);
		let bend = distance * roundness * direction;
		let mid = start.lerp(end, 0.5);
		Some(Point::new(mid.x + nx * bend, mid.y + ny * bend))
	}

	/// Point at parameter `t` along the drawn curve.
	pub fn point_at(self, start: Point, end: Point, t: f64) -> Point {
		match self.control_point(start, end) {
			None => start.lerp(end, t),
			Some(c) => {
				let u = 1.0 - t;
				Point::new(
					u * u * start.x + 2.0 * u * t * c.x + t * t * end.x,
					u * u * start.y + 2.0 * u * t * c.y + t * t * end.y,
				)
			}
		}
	}
}

/// Topology rule an edge came from. Its style follows from the rule alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeRule {
	IntraLayer,
	Uplink,
	Extension,
	Decoration,
}

impl EdgeRule {
	fn tag(self) -> &'static str {
		match self {
			EdgeRule::IntraLayer => "mesh",
			EdgeRule::Uplink => "uplink",
			EdgeRule::Extension => "extension",
			EdgeRule::Decoration => "infra",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub color: &'static str,
	pub width: f64,
	pub dashes: [f64; 2],
	pub smooth: Smooth,
}

impl EdgeStyle {
	const fn new(color: &'static str, width: f64, dashes: [f64; 2], smooth: Smooth) -> Self {
		Self {
			color,
			width,
			dashes,
			smooth,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopologyEdge {
	pub id: String,
	pub from: String,
	pub to: String,
	pub rule: EdgeRule,
	pub style: EdgeStyle,
	pub title: String,
	/// Anchor id of the extension group this edge belongs to.
	pub extension_for: Option<String>,
}

impl TopologyEdge {
	pub fn touches(&self, id: &str) -> bool {
		self.from == id || self.to == id
	}

	pub fn joins(&self, a: &str, b: &str) -> bool {
		(self.from == a && self.to == b) || (self.from == b && self.to == a)
	}
}

/// Synthetic per-pair latency, drawn once per unordered pair and kept for the
/// lifetime of the cache.
#[derive(Clone, Debug)]
pub struct LatencyCache {
	seed: u64,
	draws: u64,
	min_ms: u32,
	max_ms: u32,
	values: HashMap<(String, String), u32>,
}

impl LatencyCache {
	pub fn new(seed: u64, min_ms: u32, max_ms: u32) -> Self {
		Self {
			seed,
			draws: 0,
			min_ms: min_ms.min(max_ms),
			max_ms: max_ms.max(min_ms),
			values: HashMap::new(),
		}
	}

	fn next_unit(&mut self) -> f64 {
		let n = self.seed.wrapping_add(self.draws);
		self.draws += 1;
		let x = (n.wrapping_add(1).wrapping_mul(9301).wrapping_add(49297)) % 233280;
		x as f64 / 233280.0
	}

	pub fn latency(&mut self, a: &str, b: &str) -> u32 {
		let key = if a < b {
			(a.to_string(), b.to_string())
		} else {
			(b.to_string(), a.to_string())
		};
		if let Some(&value) = self.values.get(&key) {
			return value;
		}
		let span = (self.max_ms - self.min_ms) as f64;
		let value = self.min_ms + (self.next_unit() * span).round() as u32;
		self.values.insert(key, value);
		value
	}

	pub fn title(&mut self, a: &str, b: &str) -> String {
		format!("latency: {}ms", self.latency(a, b))
	}
}

struct EdgeSink<'a> {
	present: HashSet<&'a str>,
	latency: &'a mut LatencyCache,
	edges: Vec<TopologyEdge>,
}

impl EdgeSink<'_> {
	fn add(&mut self, rule: EdgeRule, from: &str, to: &str, style: EdgeStyle) {
		self.add_grouped(rule, from, to, style, None);
	}

	fn add_grouped(
		&mut self,
		rule: EdgeRule,
		from: &str,
		to: &str,
		style: EdgeStyle,
		extension_for: Option<&str>,
	) {
		if !self.present.contains(from) || !self.present.contains(to) {
			return;
		}
		self.edges.push(TopologyEdge {
			id: format!("{}:{from}:{to}", rule.tag()),
			from: from.into(),
			to: to.into(),
			rule,
			style,
			title: self.latency.title(from, to),
			extension_for: extension_for.map(Into::into),
		});
	}
}

/// Derive the full edge set from the roster. Always a complete rebuild.
pub fn build_edges(nodes: &[TopologyNode], latency: &mut LatencyCache) -> Vec<TopologyEdge> {
	let mut sink = EdgeSink {
		present: nodes.iter().map(|n| n.id.as_str()).collect(),
		latency,
		edges: Vec::new(),
	};
	let in_layer = |layer: Layer| -> Vec<&str> {
		nodes
			.iter()
			.filter(|n| n.layer() == Some(layer))
			.map(|n| n.id.as_str())
			.collect()
	};
	let edge_agents = in_layer(Layer::Edge);
	let cloud_agents = in_layer(Layer::Cloud);

	// Edge layer: quadrilateral plus diagonals for four, chain otherwise.
	if let [top_left, bottom_left, top_right, bottom_right] = edge_agents[..] {
		for (from, to) in [
			(top_left, top_right),
			(bottom_left, bottom_right),
			(top_left, bottom_left),
			(top_right, bottom_right),
		] {
			sink.add(
				EdgeRule::IntraLayer,
				from,
				to,
				EdgeStyle::new(EDGE_COLOR, 2.4, [6.0, 6.0], Smooth::Straight),
			);
		}
		for (from, to) in [(top_left, bottom_right), (bottom_left, top_right)] {
			sink.add(
				EdgeRule::IntraLayer,
				from,
				to,
				EdgeStyle::new(EDGE_COLOR, 2.2, [6.0, 6.0], Smooth::Straight),
			);
		}
	} else {
		for pair in edge_agents.windows(2) {
			sink.add(
				EdgeRule::IntraLayer,
				pair[0],
				pair[1],
				EdgeStyle::new(EDGE_COLOR, 2.2, [6.0, 6.0], Smooth::Straight),
			);
		}
	}

	for (index, (agent, bot)) in CLOUD_BOTS.iter().enumerate() {
		sink.add(
			EdgeRule::Decoration,
			bot,
			agent,
			EdgeStyle::new(CLOUD_COLOR, 2.0, [6.0, 6.0], Smooth::alternating(index, 0.1)),
		);
	}

	let [gateway_left, gateway_right] = GATEWAYS;
	let ingress: Vec<(&str, &str)> = match edge_agents[..] {
		[top_left, bottom_left, top_right, bottom_right] => vec![
			(gateway_left, top_left),
			(gateway_left, bottom_left),
			(gateway_right, top_right),
			(gateway_right, bottom_right),
		],
		[first, .., last] => vec![(gateway_left, first), (gateway_right, last)],
		[only] => vec![(gateway_left, only), (gateway_right, only)],
		[] => Vec::new(),
	};
	for (index, (gateway, agent)) in ingress.into_iter().enumerate() {
		sink.add(
			EdgeRule::Decoration,
			gateway,
			agent,
			EdgeStyle::new(EDGE_COLOR, 2.0, [6.0, 6.0], Smooth::alternating(index, 0.14)),
		);
	}

	let live_gateways: Vec<&str> = GATEWAYS
		.into_iter()
		.filter(|id| sink.present.contains(id))
		.collect();
	if !live_gateways.is_empty() {
		for (index, agent) in cloud_agents.iter().enumerate() {
			sink.add(
				EdgeRule::Uplink,
				agent,
				live_gateways[index % live_gateways.len()],
				EdgeStyle::new(CLOUD_COLOR, 2.4, [6.0, 6.0], Smooth::alternating(index, 0.2)),
			);
		}
	}

	for (index, (agent, companion)) in EDGE_COMPANIONS.iter().enumerate() {
		sink.add(
			EdgeRule::Decoration,
			agent,
			companion,
			EdgeStyle::new(EDGE_COLOR, 1.8, [4.0, 6.0], Smooth::alternating(index, 0.08)),
		);
	}

	for (index, device) in TERMINAL_DEVICES.iter().enumerate() {
		sink.add(
			EdgeRule::Decoration,
			TERMINAL_USER,
			device,
			EdgeStyle::new(TERMINAL_COLOR, 2.0, [6.0, 6.0], Smooth::alternating(index, 0.14)),
		);
	}
	if !live_gateways.is_empty() {
		for (index, device) in TERMINAL_DEVICES.iter().enumerate() {
			sink.add(
				EdgeRule::Decoration,
				device,
				live_gateways[index % live_gateways.len()],
				EdgeStyle::new(TERMINAL_COLOR, 2.0, [6.0, 6.0], Smooth::alternating(index, 0.12)),
			);
		}
	}

	let mut groups: BTreeMap<&str, Vec<&TopologyNode>> = BTreeMap::new();
	for node in nodes {
		if let Some(anchor) = node.extension_for() {
			groups.entry(anchor).or_default().push(node);
		}
	}
	for (anchor, mut members) in groups {
		members.sort_by(|a, b| member_order(a, b));
		for (index, member) in members.iter().enumerate() {
			let parent = parent_index(index).map_or(anchor, |p| members[p].id.as_str());
			sink.add_grouped(
				EdgeRule::Extension,
				parent,
				&member.id,
				EdgeStyle::new(EXTENSION_COLOR, 1.6, [4.0, 6.0], Smooth::CurvedCw(0.2)),
				Some(anchor),
			);
		}
	}

	sink.edges
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::topology::catalog::{GATEWAY_LEFT, GATEWAY_RIGHT};
	use crate::components::topology::store::TopologyStore;
	use crate::components::topology::types::NodeDescriptor;

	fn demo_store() -> TopologyStore {
		TopologyStore::demo(7)
	}

	fn pairs(edges: &[TopologyEdge], rule: EdgeRule) -> Vec<(&str, &str)> {
		edges
			.iter()
			.filter(|e| e.rule == rule)
			.map(|e| (e.from.as_str(), e.to.as_str()))
			.collect()
	}

	#[test]
	fn four_edge_agents_get_full_mesh() {
		let store = demo_store();
		assert_eq!(
			pairs(store.edges(), EdgeRule::IntraLayer),
			vec![
				("agent-meteorology", "agent-map"),
				("agent-keyframe", "agent-report"),
				("agent-meteorology", "agent-keyframe"),
				("agent-map", "agent-report"),
				("agent-meteorology", "agent-report"),
				("agent-keyframe", "agent-map"),
			]
		);
	}

	#[test]
	fn other_counts_chain() {
		let mut store = demo_store();
		store.remove_node("agent-report").unwrap();
		store.add_node(NodeDescriptor::agent("e5", "E5", Layer::Edge, "edge-x")).unwrap();
		store.add_node(NodeDescriptor::agent("e6", "E6", Layer::Edge, "edge-y")).unwrap();
		store.rebuild_edges();
		assert_eq!(
			pairs(store.edges(), EdgeRule::IntraLayer),
			vec![
				("agent-meteorology", "agent-keyframe"),
				("agent-keyframe", "agent-map"),
				("agent-map", "e5"),
				("e5", "e6"),
			]
		);
	}

	#[test]
	fn cloud_uplinks_round_robin() {
		let store = demo_store();
		assert_eq!(
			pairs(store.edges(), EdgeRule::Uplink),
			vec![
				("agent-video", GATEWAY_LEFT),
				("agent-registry", GATEWAY_RIGHT),
				("agent-discovery", GATEWAY_LEFT),
			]
		);
	}

	#[test]
	fn rebuild_is_idempotent() {
		let mut store = demo_store();
		let first = store.edges().to_vec();
		store.rebuild_edges();
		assert_eq!(store.edges(), &first[..]);
	}

	#[test]
	fn style_follows_rule() {
		let store = demo_store();
		for edge in store.edges() {
			match edge.rule {
				EdgeRule::IntraLayer => assert_eq!(edge.style.smooth, Smooth::Straight),
				EdgeRule::Uplink => assert_eq!(edge.style.width, 2.4),
				EdgeRule::Extension => assert_eq!(edge.style.dashes, [4.0, 6.0]),
				EdgeRule::Decoration => assert_ne!(edge.style.smooth, Smooth::Straight),
			}
		}
	}

	#[test]
	fn latency_is_cached_per_unordered_pair() {
		let mut cache = LatencyCache::new(42, 8, 120);
		let a = cache.latency("a", "b");
		assert_eq!(cache.latency("b", "a"), a);
		for i in 0..200 {
			let value = cache.latency("x", &i.to_string());
			assert!((8..=120).contains(&value));
		}
		assert_eq!(cache.title("a", "b"), format!("latency: {a}ms"));
	}

	#[test]
	fn edges_skip_missing_endpoints() {
		let store = demo_store();
		let ids: HashSet<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
		for edge in store.edges() {
			assert!(ids.contains(edge.from.as_str()) && ids.contains(edge.to.as_str()));
		}
	}

	#[test]
	fn curved_edges_bend_off_the_chord() {
		let (start, end) = (Point::new(0.0, 0.0), Point::new(100.0, 0.0));
		assert_eq!(Smooth::Straight.point_at(start, end, 0.5), Point::new(50.0, 0.0));
		let cw = Smooth::CurvedCw(0.2).point_at(start, end, 0.5);
		let ccw = Smooth::CurvedCcw(0.2).point_at(start, end, 0.5);
		assert_eq!(cw.y, -ccw.y);
		assert!(cw.y.abs() > 1.0);
		assert_eq!(Smooth::CurvedCw(0.2).point_at(start, end, 1.0), end);
	}
}
