use serde::{Deserialize, Deserializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
	Cloud,
	Edge,
	Terminal,
}

impl Layer {
	pub const ALL: [Layer; 3] = [Layer::Cloud, Layer::Edge, Layer::Terminal];

	/// Case-insensitive layer name.
	pub fn parse(name: &str) -> Option<Layer> {
		match name.trim().to_ascii_lowercase().as_str() {
			"cloud" => Some(Layer::Cloud),
			"edge" => Some(Layer::Edge),
			"terminal" => Some(Layer::Terminal),
			_ => None,
		}
	}

	pub fn title(self) -> &'static str {
		match self {
			Layer::Cloud => "CLOUD LAYER",
			Layer::Edge => "EDGE LAYER",
			Layer::Terminal => "TERMINAL LAYER",
		}
	}
}

/// Empty, unknown or non-string layers read as `None`, which registration
/// places in the edge layer.
fn lenient_layer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Layer>, D::Error> {
	let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
	Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(Layer::parse))
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn offset(self, by: Point) -> Self {
		Self::new(self.x + by.x, self.y + by.y)
	}

	pub fn lerp(self, to: Point, t: f64) -> Self {
		Self::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
	}

	pub fn distance(self, to: Point) -> f64 {
		(to.x - self.x).hypot(to.y - self.y)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
	/// Regular node occupying a slot in its layer band.
	Agent(Layer),
	/// Registered beneath the anchor with the given id.
	Extension { anchor: String },
	/// Fixed infrastructure art; never selectable.
	Decoration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopologyNode {
	pub id: String,
	pub label: String,
	pub name: String,
	pub kind: NodeKind,
	pub position: Point,
	pub hidden: bool,
	pub capabilities: Vec<String>,
	/// Creation order, used to break ties deterministically.
	pub created: u64,
}

impl TopologyNode {
	pub fn layer(&self) -> Option<Layer> {
		match self.kind {
			NodeKind::Agent(layer) => Some(layer),
			_ => None,
		}
	}

	pub fn is_decoration(&self) -> bool {
		matches!(self.kind, NodeKind::Decoration)
	}

	pub fn extension_for(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Extension { anchor } => Some(anchor),
			_ => None,
		}
	}
}

/// Registration payload pushed by the registration form or the backend.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NodeDescriptor {
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default, rename = "displayName")]
	pub display_name: Option<String>,
	#[serde(default, deserialize_with = "lenient_layer")]
	pub layer: Option<Layer>,
	#[serde(default)]
	pub node_id: Option<String>,
	#[serde(default, rename = "nodeId")]
	pub node_id_camel: Option<String>,
	#[serde(default, rename = "nodeLabel")]
	pub node_label: Option<String>,
	#[serde(default)]
	pub capabilities: Vec<String>,
}

impl NodeDescriptor {
	pub fn agent(id: &str, name: &str, layer: Layer, node_label: &str) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			layer: Some(layer),
			node_label: Some(node_label.into()),
			..Self::default()
		}
	}

	/// Key used to look for an anchor: the first non-empty of `node_id`,
	/// `nodeId` and `nodeLabel`.
	pub fn node_key(&self) -> Option<&str> {
		[
			self.node_id.as_deref(),
			self.node_id_camel.as_deref(),
			self.node_label.as_deref(),
		]
		.into_iter()
		.flatten()
		.find(|key| !key.is_empty())
	}

	/// First non-empty of `nodeLabel`, `displayName` and `name`.
	pub fn label(&self) -> &str {
		[self.node_label.as_deref(), self.display_name.as_deref()]
			.into_iter()
			.flatten()
			.find(|label| !label.is_empty())
			.unwrap_or(&self.name)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn descriptor_reads_registration_payload() {
		let descriptor: NodeDescriptor = serde_json::from_str(
			r#"{"id": "agent-ocr", "name": "OcrAgent", "layer": "terminal",
			   "node_id": "edge-keyframe", "capabilities": ["ocr"]}"#,
		)
		.unwrap();
		assert_eq!(descriptor.layer, Some(Layer::Terminal));
		assert_eq!(descriptor.node_key(), Some("edge-keyframe"));
		assert_eq!(descriptor.label(), "OcrAgent");
		assert_eq!(descriptor.capabilities, vec!["ocr".to_string()]);
	}

	#[test]
	fn node_key_skips_empty_values() {
		let descriptor: NodeDescriptor =
			serde_json::from_str(r#"{"id": "a", "nodeId": "", "nodeLabel": "edge-bj-01"}"#)
				.unwrap();
		assert_eq!(descriptor.node_key(), Some("edge-bj-01"));
		assert_eq!(descriptor.label(), "edge-bj-01");
	}

	#[test]
	fn both_node_id_spellings_are_accepted() {
		let descriptor: NodeDescriptor =
			serde_json::from_str(r#"{"id": "a", "node_id": "", "nodeId": "agent-map"}"#).unwrap();
		assert_eq!(descriptor.node_key(), Some("agent-map"));

		let descriptor: NodeDescriptor =
			serde_json::from_str(r#"{"id": "a", "node_id": "agent-video", "nodeId": "agent-map"}"#)
				.unwrap();
		assert_eq!(descriptor.node_key(), Some("agent-video"));
	}

	#[test]
	fn odd_layers_read_as_unset() {
		for (json, layer) in [
			(r#"{"id": "a", "layer": ""}"#, None),
			(r#"{"id": "a", "layer": "orbit"}"#, None),
			(r#"{"id": "a", "layer": 3}"#, None),
			(r#"{"id": "a", "layer": null}"#, None),
			(r#"{"id": "a", "layer": "Edge"}"#, Some(Layer::Edge)),
			(r#"{"id": "a", "layer": " CLOUD "}"#, Some(Layer::Cloud)),
		] {
			let descriptor: NodeDescriptor = serde_json::from_str(json).unwrap();
			assert_eq!(descriptor.layer, layer, "{json}");
		}
	}

	#[test]
	fn display_name_backs_up_the_label() {
		let descriptor: NodeDescriptor =
			serde_json::from_str(r#"{"id": "a", "name": "Ocr", "displayName": "OCR Agent"}"#)
				.unwrap();
		assert_eq!(descriptor.label(), "OCR Agent");
		let descriptor: NodeDescriptor =
			serde_json::from_str(r#"{"id": "a", "name": "Ocr", "displayName": ""}"#).unwrap();
		assert_eq!(descriptor.label(), "Ocr");
	}

	#[test]
	fn lerp_and_distance() {
		let a = Point::new(0.0, 0.0);
		let b = Point::new(3.0, 4.0);
		assert_eq!(a.distance(b), 5.0);
		assert_eq!(a.lerp(b, 0.5), Point::new(1.5, 2.0));
	}
}
