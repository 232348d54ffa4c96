use std::collections::{HashMap, VecDeque};

use super::config::{FlowConfig, FlowOptions, FlowRoute};
use super::edges::{EdgeStyle, TopologyEdge};
use super::error::TopologyError;
use super::store::TopologyStore;
use super::surface::GraphSurface;
use super::types::Point;

/// Upper bound on particles per segment, whatever a caller asks for.
pub const MAX_PARTICLES: usize = 24;

/// Breadth-first shortest path over the undirected edge graph. Neighbours are
/// visited in edge order, so ties always resolve the same way.
pub fn shortest_path(edges: &[TopologyEdge], from: &str, to: &str) -> Option<Vec<String>> {
	if from == to {
		return Some(vec![from.to_string()]);
	}
	let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
	for edge in edges {
		adjacency.entry(&edge.from).or_default().push(&edge.to);
		adjacency.entry(&edge.to).or_default().push(&edge.from);
	}
	let mut previous: HashMap<&str, &str> = HashMap::new();
	let mut queue = VecDeque::from([from]);
	while let Some(current) = queue.pop_front() {
		for &next in adjacency.get(current).into_iter().flatten() {
			if next == from || previous.contains_key(next) {
				continue;
			}
			previous.insert(next, current);
			if next == to {
				let mut path = vec![to.to_string()];
				let mut cursor = to;
				while let Some(&step) = previous.get(cursor) {
					path.push(step.to_string());
					cursor = step;
				}
				path.reverse();
				return Some(path);
			}
			queue.push_back(next);
		}
	}
	None
}

/// Path through the route's waypoints (origin, device, gateway) to `target`,
/// concatenating shortest sub-paths. A target that is itself a waypoint cuts
/// the route short. Loops introduced at the joins are removed.
pub fn preferred_path(edges: &[TopologyEdge], route: &FlowRoute, target: &str) -> Option<Vec<String>> {
	let mut stops: Vec<&str> = Vec::new();
	for stop in [route.origin.as_str(), route.device.as_str(), route.gateway.as_str()] {
		if stop == target {
			break;
		}
		stops.push(stop);
	}
	stops.push(target);

	let mut path: Vec<String> = vec![stops[0].to_string()];
	for pair in stops.windows(2) {
		for step in shortest_path(edges, pair[0], pair[1])?.into_iter().skip(1) {
			match path.iter().position(|seen| *seen == step) {
				Some(loop_start) => path.truncate(loop_start + 1),
				None => path.push(step),
			}
		}
	}
	Some(path)
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowSegment {
	pub edge_id: String,
	pub from: String,
	pub to: String,
	/// Travel runs against the edge's own orientation.
	pub reversed: bool,
	pub phases: Vec<f64>,
}

/// Split a path into per-edge segments. Any hop without an edge fails the
/// whole decomposition.
pub fn segments_for(
	edges: &[TopologyEdge],
	path: &[String],
	particles: usize,
) -> Result<Vec<FlowSegment>, TopologyError> {
	let particles = particles.clamp(1, MAX_PARTICLES);
	path.windows(2)
		.map(|hop| -> Result<FlowSegment, TopologyError> {
			let (from, to) = (&hop[0], &hop[1]);
			let edge = edges
				.iter()
				.find(|e| e.joins(from, to))
				.ok_or_else(|| TopologyError::MissingEdge {
					from: from.clone(),
					to: to.clone(),
				})?;
			Ok(FlowSegment {
				edge_id: edge.id.clone(),
				from: from.clone(),
				to: to.clone(),
				reversed: edge.from != *from,
				phases: (0..particles).map(|i| i as f64 / particles as f64).collect(),
			})
		})
		.collect()
}

#[derive(Clone, Debug)]
pub struct ActiveFlow {
	pub target: String,
	pub path: Vec<String>,
	pub segments: Vec<FlowSegment>,
	pub started_ms: f64,
	pub expires_ms: f64,
	pub speed: f64,
	pub dash_offset: f64,
}

/// Everything needed to draw one segment this frame, in container pixels.
#[derive(Clone, Debug)]
pub struct SegmentFrame {
	pub start: Point,
	pub end: Point,
	pub control: Option<Point>,
	pub particles: Vec<Point>,
	pub style: EdgeStyle,
	pub dash_offset: f64,
}

/// At most one flow at a time. The animator reads node positions from the
/// surface each frame and never writes to the roster.
pub struct FlowAnimator {
	config: FlowConfig,
	active: Option<ActiveFlow>,
}

impl FlowAnimator {
	pub fn new(config: FlowConfig) -> Self {
		Self {
			config,
			active: None,
		}
	}

	pub fn active(&self) -> Option<&ActiveFlow> {
		self.active.as_ref()
	}

	pub fn clear(&mut self) -> Option<ActiveFlow> {
		self.active.take()
	}

	/// Whether the active flow currently emphasises `edge_id`.
	pub fn emphasizes(&self, edge_id: &str) -> bool {
		self.active
			.as_ref()
			.is_some_and(|flow| flow.segments.iter().any(|s| s.edge_id == edge_id))
	}

	/// Start a flow from the route origin to `query`. Any active flow is
	/// cleared first, even if the new one fails to start.
	pub fn trigger(
		&mut self,
		store: &TopologyStore,
		query: &str,
		options: &FlowOptions,
		now_ms: f64,
	) -> Result<&ActiveFlow, TopologyError> {
		self.clear();
		let target = store
			.resolve(query)
			.ok_or_else(|| TopologyError::UnresolvedTarget(query.into()))?
			.to_string();
		let route = &self.config.route;
		if store.node(&route.origin).is_none() {
			return Err(TopologyError::UnknownNode(route.origin.clone()));
		}
		let no_path = || TopologyError::NoPath {
			from: route.origin.clone(),
			to: target.clone(),
		};
		let path = preferred_path(store.edges(), route, &target)
			.or_else(|| shortest_path(store.edges(), &route.origin, &target))
			.ok_or_else(no_path)?;
		if path.len() < 2 {
			return Err(no_path());
		}
		let particles = options.particles.unwrap_or(self.config.particles_per_segment);
		let segments = segments_for(store.edges(), &path, particles)?;
		let duration = options.duration_ms.unwrap_or(self.config.duration_ms);
		Ok(self.active.insert(ActiveFlow {
			target,
			path,
			segments,
			started_ms: now_ms,
			expires_ms: now_ms + duration,
			speed: options.speed.unwrap_or(self.config.speed),
			dash_offset: 0.0,
		}))
	}

	/// Advance particles by `dt_ms`. Returns true when the flow expired on
	/// this tick.
	pub fn tick(&mut self, dt_ms: f64, now_ms: f64) -> bool {
		let Some(flow) = self.active.as_mut() else {
			return false;
		};
		if now_ms >= flow.expires_ms {
			self.active = None;
			return true;
		}
		let dt = dt_ms.max(0.0) / 1000.0;
		for segment in &mut flow.segments {
			for phase in &mut segment.phases {
				*phase = (*phase + flow.speed * dt).rem_euclid(1.0);
			}
		}
		flow.dash_offset = (flow.dash_offset + self.config.dash_speed * dt) % 1000.0;
		false
	}

	/// Geometry of every drawable segment. Segments whose edge or endpoint
	/// vanished since the trigger are skipped for this frame.
	pub fn frame(&self, surface: &dyn GraphSurface, edges: &[TopologyEdge]) -> Vec<SegmentFrame> {
		let Some(flow) = self.active.as_ref() else {
			return Vec::new();
		};
		flow.segments
			.iter()
			.filter_map(|segment| {
				let edge = edges.iter().find(|e| e.id == segment.edge_id)?;
				let start = surface.canvas_to_dom(surface.position(&segment.from)?);
				let end = surface.canvas_to_dom(surface.position(&segment.to)?);
				let (a, b) = if segment.reversed { (end, start) } else { (start, end) };
				let smooth = edge.style.smooth;
				let particles = segment
					.phases
					.iter()
					.map(|&t| smooth.point_at(a, b, if segment.reversed { 1.0 - t } else { t }))
					.collect();
				Some(SegmentFrame {
					start,
					end,
					control: smooth.control_point(a, b),
					particles,
					style: edge.style,
					dash_offset: flow.dash_offset,
				})
			})
			.collect()
	}
}
