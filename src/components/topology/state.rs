use std::collections::HashMap;

use log::{debug, info};

use super::catalog;
use super::config::{FlowOptions, TopologyConfig};
use super::edges::{EdgeStyle, FLOW_COLOR, HIGHLIGHT_COLOR, TopologyEdge};
use super::error::TopologyError;
use super::flow::FlowAnimator;
use super::layout::to_surface;
use super::metrics::LayoutMetrics;
use super::store::TopologyStore;
use super::surface::{GraphSurface, HostSurface};
use super::types::{Layer, NodeDescriptor, NodeKind, Point};

const BAND_MARGIN: f64 = 8.0;

/// What a click on a node ended up doing.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
	Group { anchor: String, visible: bool },
	Decoration { id: String, visible: bool },
	Highlight(String),
}

/// Tooltip for whatever the pointer rests on, anchored in container pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
	pub at: Point,
	pub lines: Vec<String>,
}

/// One layer band in canvas space, for the band faces and their titles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandRect {
	pub layer: Layer,
	pub origin: Point,
	pub width: f64,
	pub height: f64,
}

#[derive(Clone, Copy, Debug)]
struct PendingResize {
	width: f64,
	height: f64,
	due_ms: f64,
}

/// Everything one mounted topology view needs between frames. Owned by the
/// controller behind an `Rc<RefCell<_>>` and shared with the JS bridge.
pub struct TopologyState {
	pub store: TopologyStore,
	pub surface: HostSurface,
	pub flow: FlowAnimator,
	pub config: TopologyConfig,
	pub metrics: LayoutMetrics,
	/// Seconds of host animation, drives the static edges' dash offset.
	pub graph_time: f64,
	pub hover: Option<HoverInfo>,
	highlights: HashMap<String, f64>,
	pending_resize: Option<PendingResize>,
	last_host_ms: Option<f64>,
	last_flow_ms: Option<f64>,
}

impl TopologyState {
	pub fn new(
		config: TopologyConfig,
		agents: &[NodeDescriptor],
		seed: u64,
		width: f64,
		height: f64,
	) -> Self {
		let mut state = Self {
			store: TopologyStore::seeded(&config, seed, agents),
			surface: HostSurface::new(width, height),
			flow: FlowAnimator::new(config.flow.clone()),
			metrics: LayoutMetrics::from_bounds(width, height),
			config,
			graph_time: 0.0,
			hover: None,
			highlights: HashMap::new(),
			pending_resize: None,
			last_host_ms: None,
			last_flow_ms: None,
		};
		state.refresh();
		info!(
			"topology ready: {} nodes, {} edges",
			state.store.nodes().len(),
			state.store.edges().len()
		);
		state
	}

	/// Push the roster into the host, then lay everything out again.
	pub fn refresh(&mut self) {
		self.hover = None;
		self.surface.sync(self.store.nodes(), self.store.edges());
		self.store.relayout(&self.metrics, &mut self.surface);
	}

	pub fn add_node(&mut self, descriptor: NodeDescriptor) -> Result<NodeKind, TopologyError> {
		let kind = self.store.add_node(descriptor)?;
		self.refresh();
		Ok(kind)
	}

	pub fn add_node_json(&mut self, json: &str) -> Result<NodeKind, TopologyError> {
		let descriptor: NodeDescriptor = serde_json::from_str(json)?;
		self.add_node(descriptor)
	}

	pub fn remove_node(&mut self, id: &str) -> Result<Vec<String>, TopologyError> {
		let removed = self.store.remove_node(id)?;
		for gone in &removed {
			self.highlights.remove(gone);
		}
		self.refresh();
		debug!("removed {removed:?}");
		Ok(removed)
	}

	/// Emphasise a node and its touching edges until `now_ms` plus the
	/// configured highlight duration. Calling again pushes the deadline out.
	pub fn highlight(&mut self, id: &str, now_ms: f64) -> Result<(), TopologyError> {
		if self.store.node(id).is_none() {
			return Err(TopologyError::UnknownNode(id.into()));
		}
		self.highlights
			.insert(id.into(), now_ms + self.config.highlight_ms);
		Ok(())
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.highlights.contains_key(id)
	}

	pub fn trigger_flow(
		&mut self,
		query: &str,
		options: &FlowOptions,
		now_ms: f64,
	) -> Result<(), TopologyError> {
		let flow = self.flow.trigger(&self.store, query, options, now_ms)?;
		debug!("flow to {} over {} hops", flow.target, flow.segments.len());
		self.last_flow_ms = Some(now_ms);
		Ok(())
	}

	pub fn clear_flow(&mut self) {
		if let Some(flow) = self.flow.clear() {
			debug!("flow to {} cleared", flow.target);
		}
	}

	/// Resolve a click in container pixels to a node and act on it.
	pub fn handle_click(&mut self, dom: Point, now_ms: f64) -> Option<ClickOutcome> {
		let id = self.surface.node_at(dom)?;
		self.click_node(&id, now_ms)
	}

	/// Anchors toggle their extension group, cloud agents their bot, edge
	/// agents their companion. Anything else is highlighted.
	pub fn click_node(&mut self, id: &str, now_ms: f64) -> Option<ClickOutcome> {
		self.store.node(id)?;
		let outcome = if !self.store.extension_group(id).is_empty() {
			self.store.toggle_group(id, None);
			let visible = self
				.store
				.extension_group(id)
				.iter()
				.any(|n| !n.hidden);
			ClickOutcome::Group {
				anchor: id.into(),
				visible,
			}
		} else if let Some(decoration) =
			catalog::cloud_bot_for(id).or_else(|| catalog::companion_for(id))
		{
			let visible = self.store.toggle_hidden(decoration)?;
			ClickOutcome::Decoration {
				id: decoration.into(),
				visible,
			}
		} else {
			self.highlight(id, now_ms).ok()?;
			ClickOutcome::Highlight(id.into())
		};
		self.surface.sync(self.store.nodes(), self.store.edges());
		Some(outcome)
	}

	/// Tooltip lines for a node: its name, where it lives and what it can do.
	pub fn describe_node(&self, id: &str) -> Option<Vec<String>> {
		let node = self.store.node(id)?;
		let mut lines = vec![node.name.clone()];
		match &node.kind {
			NodeKind::Agent(layer) => {
				lines.push(format!("Layer: {}", layer.title()));
				if node.label != node.name {
					lines.push(format!("Node: {}", node.label));
				}
			}
			NodeKind::Extension { anchor } => {
				let anchor = self.store.node(anchor).map_or(anchor.as_str(), |n| n.name.as_str());
				lines.push(format!("Extension of {anchor}"));
			}
			NodeKind::Decoration => {}
		}
		if !node.capabilities.is_empty() {
			lines.push(format!("Capabilities: {}", node.capabilities.join(", ")));
		}
		Some(lines)
	}

	/// Tooltip lines for an edge: its endpoints and cached latency.
	pub fn describe_edge(&self, edge: &TopologyEdge) -> Vec<String> {
		let name = |id: &str| self.store.node(id).map_or(id.to_string(), |n| n.label.clone());
		vec![
			format!("{} - {}", name(&edge.from), name(&edge.to)),
			edge.title.clone(),
		]
	}

	/// Update the tooltip for a pointer at `dom`. Nodes win over the edges
	/// running beneath them.
	pub fn hover_at(&mut self, dom: Point) -> Option<&HoverInfo> {
		let lines = match self.surface.visible_node_at(dom) {
			Some(id) => self.describe_node(&id),
			None => self.surface.edge_at(dom).map(|edge| self.describe_edge(edge)),
		};
		self.hover = lines.map(|lines| HoverInfo { at: dom, lines });
		self.hover.as_ref()
	}

	pub fn clear_hover(&mut self) {
		self.hover = None;
	}

	/// Face of each layer band, top to bottom, on the current surface.
	pub fn band_rects(&self) -> Vec<BandRect> {
		let m = &self.metrics;
		let row_height = m.rows().row_height;
		let centers = m.band_centers();
		Layer::ALL
			.into_iter()
			.map(|layer| {
				let corner = Point::new(-m.width / 2.0 + BAND_MARGIN, centers.get(layer) - row_height / 2.0);
				BandRect {
					layer,
					origin: to_surface(corner, m, Some(&self.surface)),
					width: m.width - BAND_MARGIN * 2.0,
					height: row_height,
				}
			})
			.collect()
	}

	/// Note a new container size. The relayout happens on the first host
	/// frame after the debounce window closes.
	pub fn request_resize(&mut self, width: f64, height: f64, now_ms: f64) {
		self.pending_resize = Some(PendingResize {
			width,
			height,
			due_ms: now_ms + self.config.resize_debounce_ms,
		});
	}

	/// Host frame bookkeeping: expire highlights, apply a due resize and
	/// advance the dash clock. Returns true when a relayout ran.
	pub fn advance_host(&mut self, now_ms: f64) -> bool {
		let dt = self.last_host_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
		self.last_host_ms = Some(now_ms);
		self.graph_time += dt / 1000.0;
		self.highlights.retain(|_, until| *until > now_ms);

		let Some(pending) = self.pending_resize.filter(|p| now_ms >= p.due_ms) else {
			return false;
		};
		self.pending_resize = None;
		self.metrics = LayoutMetrics::from_bounds(pending.width, pending.height);
		self.surface.resize(pending.width, pending.height);
		self.refresh();
		debug!("resized to {}x{}", pending.width, pending.height);
		true
	}

	/// Flow frame bookkeeping. Returns true when the active flow expired.
	pub fn advance_flow(&mut self, now_ms: f64) -> bool {
		let dt = self.last_flow_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
		self.last_flow_ms = Some(now_ms);
		let expired = self.flow.tick(dt, now_ms);
		if expired {
			debug!("flow expired");
		}
		expired
	}

	/// Style an edge is drawn with right now: the rule's own style with any
	/// highlight or flow emphasis layered on top.
	pub fn edge_style(&self, edge: &TopologyEdge) -> EdgeStyle {
		let mut style = edge.style;
		if self.highlights.keys().any(|id| edge.touches(id)) {
			style.color = HIGHLIGHT_COLOR;
			style.width = 4.0;
		}
		if self.flow.emphasizes(&edge.id) {
			style.color = FLOW_COLOR;
			style.width = style.width.max(3.0);
		}
		style
	}

	pub fn node_radius(&self, id: &str, base: f64) -> f64 {
		if self.is_highlighted(id) {
			(base * 1.6).max(base + 8.0)
		} else {
			base
		}
	}

	/// Drop transient state. The roster itself is left alone.
	pub fn dispose(&mut self) {
		self.clear_flow();
		self.hover = None;
		self.highlights.clear();
		self.pending_resize = None;
		self.last_host_ms = None;
		self.last_flow_ms = None;
		debug!("topology state disposed");
	}
}
