use std::collections::BTreeMap;

use log::{debug, warn};

use super::catalog::{self, EDGE_COMPANIONS};
use super::config::TopologyConfig;
use super::edges::{LatencyCache, TopologyEdge, build_edges};
use super::error::TopologyError;
use super::extension::{self, member_order};
use super::layout::{companion_position, decoration_layout, position, to_surface};
use super::metrics::LayoutMetrics;
use super::surface::GraphSurface;
use super::types::{Layer, NodeDescriptor, NodeKind, Point, TopologyNode};

/// The single owner of the node roster and its derived edge set. All
/// mutation goes through `add_node`, `remove_node` and the visibility toggles,
/// each of which rebuilds the edges.
pub struct TopologyStore {
	nodes: Vec<TopologyNode>,
	edges: Vec<TopologyEdge>,
	latency: LatencyCache,
	next_created: u64,
	extensions_visible: bool,
}

impl TopologyStore {
	pub fn new(config: &TopologyConfig, seed: u64) -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			latency: LatencyCache::new(seed, config.latency_min_ms, config.latency_max_ms),
			next_created: 0,
			extensions_visible: config.extensions_visible,
		}
	}

	/// Roster with the infrastructure decorations, the given agents and the
	/// companions of any edge agents among them.
	pub fn seeded(config: &TopologyConfig, seed: u64, agents: &[NodeDescriptor]) -> Self {
		let mut store = Self::new(config, seed);
		for meta in &catalog::DECORATIONS {
			store.push(meta.id, meta.label, meta.label, NodeKind::Decoration, meta.hidden);
		}
		for agent in agents {
			if let Err(err) = store.insert(agent) {
				warn!("skipping seed agent {}: {err}", agent.id);
			}
		}
		for (agent, companion) in EDGE_COMPANIONS {
			if let Some(name) = store.node(agent).map(|n| n.name.clone()) {
				store.push(companion, &name, &name, NodeKind::Decoration, true);
			}
		}
		store.rebuild_edges();
		store
	}

	#[cfg(test)]
	pub fn demo(seed: u64) -> Self {
		Self::seeded(&TopologyConfig::default(), seed, &catalog::demo_agents())
	}

	pub fn nodes(&self) -> &[TopologyNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[TopologyEdge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&TopologyNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	fn node_mut(&mut self, id: &str) -> Option<&mut TopologyNode> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	pub fn edge_between(&self, a: &str, b: &str) -> Option<&TopologyEdge> {
		self.edges.iter().find(|e| e.joins(a, b))
	}

	/// An edge is drawn only while both of its endpoints are.
	pub fn is_edge_hidden(&self, edge: &TopologyEdge) -> bool {
		[&edge.from, &edge.to]
			.into_iter()
			.any(|id| self.node(id).is_none_or(|n| n.hidden))
	}

	fn push(&mut self, id: &str, label: &str, name: &str, kind: NodeKind, hidden: bool) {
		self.next_created += 1;
		self.nodes.push(TopologyNode {
			id: id.into(),
			label: label.into(),
			name: name.into(),
			kind,
			position: Point::default(),
			hidden,
			capabilities: Vec::new(),
			created: self.next_created,
		});
	}

	/// Live, non-extension, non-decoration node whose id or label equals `key`.
	pub fn find_anchor(&self, key: &str) -> Option<&TopologyNode> {
		self.nodes
			.iter()
			.filter(|n| matches!(n.kind, NodeKind::Agent(_)))
			.find(|n| n.id == key || n.label == key)
	}

	pub fn extension_group(&self, anchor: &str) -> Vec<&TopologyNode> {
		let mut members: Vec<&TopologyNode> = self
			.nodes
			.iter()
			.filter(|n| n.extension_for() == Some(anchor))
			.collect();
		members.sort_by(|a, b| member_order(a, b));
		members
	}

	fn insert(&mut self, descriptor: &NodeDescriptor) -> Result<NodeKind, TopologyError> {
		if descriptor.id.is_empty() {
			return Err(TopologyError::EmptyId);
		}
		if self.node(&descriptor.id).is_some() {
			return Err(TopologyError::DuplicateNode(descriptor.id.clone()));
		}
		let name = if descriptor.name.is_empty() {
			descriptor.id.clone()
		} else {
			descriptor.name.clone()
		};
		let anchor = descriptor
			.node_key()
			.and_then(|key| self.find_anchor(key))
			.map(|anchor| (anchor.id.clone(), anchor.position));

		let (kind, label, hidden, position) = match anchor {
			Some((anchor, anchor_position)) => {
				let group = self.extension_group(&anchor);
				let hidden = if group.is_empty() {
					!self.extensions_visible
				} else {
					group.iter().all(|n| n.hidden)
				};
				(
					NodeKind::Extension { anchor },
					name.clone(),
					hidden,
					anchor_position,
				)
			}
			None => {
				let layer = descriptor.layer.unwrap_or(Layer::Edge);
				let label = descriptor.label();
				let label = if label.is_empty() { name.clone() } else { label.to_string() };
				(NodeKind::Agent(layer), label, false, Point::default())
			}
		};

		self.next_created += 1;
		self.nodes.push(TopologyNode {
			id: descriptor.id.clone(),
			label,
			name,
			kind: kind.clone(),
			position,
			hidden,
			capabilities: descriptor.capabilities.clone(),
			created: self.next_created,
		});
		Ok(kind)
	}

	/// Register a node. A descriptor whose anchor key matches a live node
	/// becomes an extension of it; anything else takes a slot in its layer.
	pub fn add_node(&mut self, descriptor: NodeDescriptor) -> Result<NodeKind, TopologyError> {
		let kind = self.insert(&descriptor)?;
		debug!("registered {} as {kind:?}", descriptor.id);
		self.rebuild_edges();
		Ok(kind)
	}

	/// Remove a node, the extension group keyed to it and its companion.
	/// Returns every removed id.
	pub fn remove_node(&mut self, id: &str) -> Result<Vec<String>, TopologyError> {
		if self.node(id).is_none() {
			return Err(TopologyError::UnknownNode(id.into()));
		}
		let companion = catalog::companion_for(id);
		let mut removed = Vec::new();
		self.nodes.retain(|n| {
			let gone = n.id == id || n.extension_for() == Some(id) || Some(n.id.as_str()) == companion;
			if gone {
				removed.push(n.id.clone());
			}
			!gone
		});
		self.rebuild_edges();
		Ok(removed)
	}

	pub fn rebuild_edges(&mut self) {
		self.edges = build_edges(&self.nodes, &mut self.latency);
	}

	/// Show or hide a whole extension group. Without `force` the group is
	/// shown if any member is hidden. Returns false when `anchor` has no group.
	pub fn toggle_group(&mut self, anchor: &str, force: Option<bool>) -> bool {
		let members: Vec<String> = self.extension_group(anchor).iter().map(|n| n.id.clone()).collect();
		if members.is_empty() {
			return false;
		}
		let show = force.unwrap_or_else(|| {
			members
				.iter()
				.any(|id| self.node(id).is_some_and(|n| n.hidden))
		});
		for node in self.nodes.iter_mut().filter(|n| members.contains(&n.id)) {
			node.hidden = !show;
		}
		true
	}

	/// Flip a single node's visibility, returning whether it is now visible.
	pub fn toggle_hidden(&mut self, id: &str) -> Option<bool> {
		let node = self.node_mut(id)?;
		node.hidden = !node.hidden;
		Some(!node.hidden)
	}

	/// Resolve a flow target by id, then by label or name, preferring
	/// functional nodes over decorations that share their label.
	pub fn resolve(&self, query: &str) -> Option<&str> {
		let named = |n: &&TopologyNode| n.label == query || n.name == query;
		self.node(query)
			.or_else(|| self.nodes.iter().filter(|n| !n.is_decoration()).find(named))
			.or_else(|| self.nodes.iter().find(named))
			.map(|n| n.id.as_str())
	}

	/// Full relayout: layer slots, companions and decorations first, then
	/// every extension group around its anchor's live position on `surface`.
	pub fn relayout(&mut self, metrics: &LayoutMetrics, surface: &mut dyn GraphSurface) {
		let mut updates: Vec<(String, Point)> = Vec::new();
		for layer in Layer::ALL {
			let members: Vec<&TopologyNode> =
				self.nodes.iter().filter(|n| n.layer() == Some(layer)).collect();
			let total = members.len();
			for (index, node) in members.into_iter().enumerate() {
				let p = position(layer, index, total, metrics);
				updates.push((node.id.clone(), p));
				if let Some(companion) = catalog::companion_for(&node.id) {
					updates.push((companion.into(), companion_position(p, metrics)));
				}
			}
		}
		updates.extend(
			decoration_layout(metrics)
				.into_iter()
				.map(|(id, p)| (id.to_string(), p)),
		);
		for (_, p) in &mut updates {
			*p = to_surface(*p, metrics, Some(&*surface));
		}
		self.apply(&updates, surface);

		let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
		for node in &self.nodes {
			if let Some(anchor) = node.extension_for() {
				groups.entry(anchor.into()).or_default();
			}
		}
		let mut extension_updates = Vec::new();
		for (anchor, members) in groups.iter_mut() {
			members.extend(self.extension_group(anchor).iter().map(|n| n.id.clone()));
			let Some(origin) = surface.position(anchor) else {
				warn!("extension anchor {anchor} has no live position");
				continue;
			};
			let total = members.len();
			for (index, id) in members.iter().enumerate() {
				let offset = extension::offset(index, total, metrics);
				extension_updates.push((id.clone(), origin.offset(offset)));
			}
		}
		self.apply(&extension_updates, surface);
		debug!("relayout {}x{}: {} nodes", metrics.width, metrics.height, self.nodes.len());
	}

	fn apply(&mut self, updates: &[(String, Point)], surface: &mut dyn GraphSurface) {
		for (id, p) in updates {
			if let Some(node) = self.node_mut(id) {
				node.position = *p;
			}
		}
		surface.set_positions(updates);
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::topology::edges::EdgeRule;
	use crate::components::topology::surface::HostSurface;

	fn synced(store: &mut TopologyStore) -> (HostSurface, LayoutMetrics) {
		let metrics = LayoutMetrics::from_bounds(800.0, 600.0);
		let mut surface = HostSurface::new(800.0, 600.0);
		surface.sync(store.nodes(), store.edges());
		store.relayout(&metrics, &mut surface);
		(surface, metrics)
	}

	fn extension(id: &str, key: &str) -> NodeDescriptor {
		NodeDescriptor {
			id: id.into(),
			name: id.to_uppercase(),
			node_id: Some(key.into()),
			..NodeDescriptor::default()
		}
	}

	#[test]
	fn seeded_roster_has_decorations_and_companions() {
		let store = TopologyStore::demo(1);
		assert_eq!(store.nodes().len(), 10 + 7 + 4);
		assert!(store.node("edge-agent-keyframe-agent01").unwrap().hidden);
		assert!(store.node("infra-cloud-bot-left").unwrap().hidden);
		assert!(!store.node("infra-edge-gateway-left").unwrap().hidden);
	}

	#[test]
	fn extension_attaches_to_anchor() {
		let mut store = TopologyStore::demo(1);
		store
			.add_node(NodeDescriptor::agent("edge-keyframe", "Keyframe", Layer::Edge, "edge-kf"))
			.unwrap();
		let (mut surface, metrics) = synced(&mut store);

		let kind = store.add_node(extension("ocr", "edge-keyframe")).unwrap();
		assert_eq!(
			kind,
			NodeKind::Extension {
				anchor: "edge-keyframe".into()
			}
		);
		surface.sync(store.nodes(), store.edges());
		store.relayout(&metrics, &mut surface);

		let anchor = surface.position("edge-keyframe").unwrap();
		let expected = anchor.offset(extension::offset(0, 1, &metrics));
		assert_eq!(store.node("ocr").unwrap().position, expected);
		let edge = store.edge_between("edge-keyframe", "ocr").unwrap();
		assert_eq!((edge.from.as_str(), edge.to.as_str()), ("edge-keyframe", "ocr"));
		assert_eq!(edge.rule, EdgeRule::Extension);
	}

	#[test]
	fn anchor_matches_label_too() {
		let mut store = TopologyStore::demo(1);
		store.add_node(extension("ocr", "edge-bj-02")).unwrap();
		assert_eq!(store.node("ocr").unwrap().extension_for(), Some("agent-keyframe"));
	}

	#[test]
	fn unmatched_key_takes_a_layer_slot() {
		let mut store = TopologyStore::demo(1);
		let kind = store.add_node(extension("lonely", "nowhere")).unwrap();
		assert_eq!(kind, NodeKind::Agent(Layer::Edge));
	}

	#[test]
	fn deeper_members_hang_off_siblings() {
		let mut store = TopologyStore::demo(1);
		for id in ["x1", "x2", "x3", "x4"] {
			store.add_node(extension(id, "agent-map")).unwrap();
		}
		let parents: Vec<(&str, &str)> = store
			.edges()
			.iter()
			.filter(|e| e.rule == EdgeRule::Extension)
			.map(|e| (e.from.as_str(), e.to.as_str()))
			.collect();
		assert_eq!(
			parents,
			vec![
				("agent-map", "x1"),
				("x1", "x2"),
				("x1", "x3"),
				("x2", "x4"),
			]
		);
	}

	#[test]
	fn siblings_are_reoffset_when_group_changes() {
		let mut store = TopologyStore::demo(1);
		store.add_node(extension("x1", "agent-map")).unwrap();
		store.add_node(extension("x2", "agent-map")).unwrap();
		let (mut surface, metrics) = synced(&mut store);
		let before = store.node("x2").unwrap().position;

		store.remove_node("x1").unwrap();
		surface.sync(store.nodes(), store.edges());
		store.relayout(&metrics, &mut surface);
		let anchor = surface.position("agent-map").unwrap();
		assert_ne!(store.node("x2").unwrap().position, before);
		assert_eq!(
			store.node("x2").unwrap().position,
			anchor.offset(extension::offset(0, 1, &metrics))
		);
	}

	#[test]
	fn removing_anchor_cascades() {
		let mut store = TopologyStore::demo(1);
		store.add_node(extension("x1", "agent-keyframe")).unwrap();
		store.add_node(extension("x2", "agent-keyframe")).unwrap();
		let removed = store.remove_node("agent-keyframe").unwrap();
		assert_eq!(
			removed,
			vec![
				"agent-keyframe".to_string(),
				"edge-agent-keyframe-agent01".into(),
				"x1".into(),
				"x2".into(),
			]
		);
		assert!(store.edges().iter().all(|e| !removed.iter().any(|id| e.touches(id))));
		assert!(matches!(
			store.remove_node("agent-keyframe"),
			Err(TopologyError::UnknownNode(_))
		));
	}

	#[test]
	fn group_visibility_toggles_as_a_unit() {
		let mut store = TopologyStore::demo(1);
		store.add_node(extension("x1", "agent-map")).unwrap();
		store.add_node(extension("x2", "agent-map")).unwrap();
		let hidden = |store: &TopologyStore| -> Vec<bool> {
			store.extension_group("agent-map").iter().map(|n| n.hidden).collect()
		};
		assert_eq!(hidden(&store), vec![true, true]);

		assert!(store.toggle_group("agent-map", None));
		assert_eq!(hidden(&store), vec![false, false]);
		let edge = store.edge_between("agent-map", "x1").unwrap();
		assert!(!store.is_edge_hidden(edge));

		store.add_node(extension("x3", "agent-map")).unwrap();
		assert_eq!(hidden(&store), vec![false, false, false]);

		assert!(store.toggle_group("agent-map", Some(false)));
		assert_eq!(hidden(&store), vec![true, true, true]);
		let edge = store.edge_between("agent-map", "x1").unwrap();
		assert!(store.is_edge_hidden(edge));
		assert!(!store.toggle_group("agent-video", None));
	}

	#[test]
	fn duplicate_and_empty_ids_are_rejected() {
		let mut store = TopologyStore::demo(1);
		assert!(matches!(
			store.add_node(NodeDescriptor::agent("agent-map", "Map", Layer::Edge, "m")),
			Err(TopologyError::DuplicateNode(_))
		));
		assert!(matches!(
			store.add_node(NodeDescriptor::default()),
			Err(TopologyError::EmptyId)
		));
	}

	#[test]
	fn small_container_keeps_agents_between_their_gateways() {
		let mut store = TopologyStore::demo(1);
		let metrics = LayoutMetrics::from_bounds(400.0, 300.0);
		let mut surface = HostSurface::new(400.0, 300.0);
		surface.sync(store.nodes(), store.edges());
		store.relayout(&metrics, &mut surface);

		let x = |id: &str| surface.position(id).unwrap().x;
		let agents = ["agent-meteorology", "agent-keyframe", "agent-map", "agent-report"];
		let agent_mid = agents.iter().map(|id| x(id)).sum::<f64>() / 4.0;
		let gateway_mid = (x(catalog::GATEWAY_LEFT) + x(catalog::GATEWAY_RIGHT)) / 2.0;
		assert!((agent_mid - gateway_mid).abs() < 1.0, "{agent_mid} vs {gateway_mid}");

		let companion = surface.position("edge-agent-map-agent01").unwrap();
		let map = surface.position("agent-map").unwrap();
		assert!(companion.x > map.x);
		assert!((companion.y - map.y).abs() < 1e-3);
	}

	#[test]
	fn resolve_falls_back_to_label_and_name() {
		let store = TopologyStore::demo(1);
		assert_eq!(store.resolve("agent-map"), Some("agent-map"));
		assert_eq!(store.resolve("edge-sh-01"), Some("agent-map"));
		assert_eq!(store.resolve("MapAgent"), Some("agent-map"));
		assert_eq!(store.resolve("VideoAgent"), Some("agent-video"));
		assert_eq!(store.resolve("Gateway"), Some("infra-edge-gateway-left"));
		assert_eq!(store.resolve("nope"), None);
	}
}
