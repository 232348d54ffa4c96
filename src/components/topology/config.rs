use log::warn;
use serde::Deserialize;

use super::catalog::{GATEWAY_LEFT, TERMINAL_PHONE_LEFT, TERMINAL_USER};
use super::error::TopologyError;

/// Waypoints a flow prefers on its way from the user to the target.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowRoute {
	pub origin: String,
	pub device: String,
	pub gateway: String,
}

impl Default for FlowRoute {
	fn default() -> Self {
		Self {
			origin: TERMINAL_USER.into(),
			device: TERMINAL_PHONE_LEFT.into(),
			gateway: GATEWAY_LEFT.into(),
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
	pub route: FlowRoute,
	pub duration_ms: f64,
	pub particles_per_segment: usize,
	/// Particle phase advance, in full edge traversals per second.
	pub speed: f64,
	/// Dash offset advance in pixels per second.
	pub dash_speed: f64,
	pub dot_radius: f64,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			route: FlowRoute::default(),
			duration_ms: 6000.0,
			particles_per_segment: 3,
			speed: 0.48,
			dash_speed: 72.0,
			dot_radius: 2.6,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TopologyConfig {
	pub flow: FlowConfig,
	pub highlight_ms: f64,
	pub resize_debounce_ms: f64,
	pub latency_min_ms: u32,
	pub latency_max_ms: u32,
	/// Whether a freshly created extension group starts expanded.
	pub extensions_visible: bool,
}

impl Default for TopologyConfig {
	fn default() -> Self {
		Self {
			flow: FlowConfig::default(),
			highlight_ms: 3000.0,
			resize_debounce_ms: 120.0,
			latency_min_ms: 8,
			latency_max_ms: 120,
			extensions_visible: false,
		}
	}
}

impl TopologyConfig {
	/// Parse a (possibly partial) JSON document on top of the defaults.
	pub fn from_json(json: &str) -> Result<Self, TopologyError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Config embedded in the host page. Missing, blank or malformed text
	/// yields the defaults.
	pub fn from_page(raw: Option<&str>) -> Self {
		let Some(json) = raw.map(str::trim).filter(|json| !json.is_empty()) else {
			return Self::default();
		};
		Self::from_json(json).unwrap_or_else(|err| {
			warn!("ignoring page topology config: {err}");
			Self::default()
		})
	}
}

/// Per-call overrides for a single flow trigger.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowOptions {
	pub duration_ms: Option<f64>,
	pub speed: Option<f64>,
	pub particles: Option<usize>,
}

impl FlowOptions {
	pub fn from_json(json: &str) -> Result<Self, TopologyError> {
		Ok(serde_json::from_str(json)?)
	}
}
