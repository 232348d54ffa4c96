//! Fixed infrastructure decorations and the lookup tables binding them to
//! functional agents.

use super::types::{Layer, NodeDescriptor};

pub const CLOUD_BOT_LEFT: &str = "infra-cloud-bot-left";
pub const CLOUD_BOT_MID: &str = "infra-cloud-bot-mid";
pub const CLOUD_SERVER: &str = "infra-cloud-server";
pub const GATEWAY_LEFT: &str = "infra-edge-gateway-left";
pub const GATEWAY_RIGHT: &str = "infra-edge-gateway-right";
pub const TERMINAL_PHONE_LEFT: &str = "infra-terminal-phone-left";
pub const TERMINAL_DESKTOP_LEFT: &str = "infra-terminal-desktop-left";
pub const TERMINAL_DESKTOP_RIGHT: &str = "infra-terminal-desktop-right";
pub const TERMINAL_PHONE_RIGHT: &str = "infra-terminal-phone-right";
pub const TERMINAL_USER: &str = "infra-terminal-user-left";

pub const GATEWAYS: [&str; 2] = [GATEWAY_LEFT, GATEWAY_RIGHT];
pub const TERMINAL_DEVICES: [&str; 4] = [
	TERMINAL_PHONE_LEFT,
	TERMINAL_DESKTOP_LEFT,
	TERMINAL_DESKTOP_RIGHT,
	TERMINAL_PHONE_RIGHT,
];

/// Cloud agent -> the bot decoration its click toggles.
pub const CLOUD_BOTS: [(&str, &str); 3] = [
	("agent-video", CLOUD_BOT_LEFT),
	("agent-registry", CLOUD_BOT_MID),
	("agent-discovery", CLOUD_SERVER),
];

/// Edge agent -> its agent01 companion decoration.
pub const EDGE_COMPANIONS: [(&str, &str); 4] = [
	("agent-meteorology", "edge-agent-meteorology-agent01"),
	("agent-keyframe", "edge-agent-keyframe-agent01"),
	("agent-map", "edge-agent-map-agent01"),
	("agent-report", "edge-agent-report-agent01"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Icon {
	Bot,
	Gateway,
	Phone,
	Desktop,
	User,
}

#[derive(Clone, Copy, Debug)]
pub struct DecorationMeta {
	pub id: &'static str,
	pub label: &'static str,
	pub icon: Icon,
	pub size: f64,
	pub hidden: bool,
}

const fn meta(id: &'static str, label: &'static str, icon: Icon, hidden: bool) -> DecorationMeta {
	DecorationMeta {
		id,
		label,
		icon,
		size: if matches!(icon, Icon::Gateway) { 24.0 } else { 22.0 },
		hidden,
	}
}

pub const DECORATIONS: [DecorationMeta; 10] = [
	meta(CLOUD_BOT_LEFT, "VideoAgent", Icon::Bot, true),
	meta(CLOUD_BOT_MID, "RegistryAgent", Icon::Bot, true),
	meta(CLOUD_SERVER, "DiscoveryAgent", Icon::Bot, true),
	meta(GATEWAY_LEFT, "Gateway", Icon::Gateway, false),
	meta(GATEWAY_RIGHT, "Gateway", Icon::Gateway, false),
	meta(TERMINAL_PHONE_LEFT, "Phone", Icon::Phone, false),
	meta(TERMINAL_DESKTOP_LEFT, "Desktop", Icon::Desktop, false),
	meta(TERMINAL_DESKTOP_RIGHT, "Desktop", Icon::Desktop, false),
	meta(TERMINAL_PHONE_RIGHT, "Phone", Icon::Phone, false),
	meta(TERMINAL_USER, "User", Icon::User, false),
];

pub fn decoration(id: &str) -> Option<&'static DecorationMeta> {
	DECORATIONS.iter().find(|meta| meta.id == id)
}

pub fn cloud_bot_for(agent_id: &str) -> Option<&'static str> {
	CLOUD_BOTS
		.iter()
		.find(|(agent, _)| *agent == agent_id)
		.map(|(_, bot)| *bot)
}

pub fn companion_for(agent_id: &str) -> Option<&'static str> {
	EDGE_COMPANIONS
		.iter()
		.find(|(agent, _)| *agent == agent_id)
		.map(|(_, companion)| *companion)
}

/// The seven agents the dashboard starts with.
pub fn demo_agents() -> Vec<NodeDescriptor> {
	let mut agents = vec![
		NodeDescriptor::agent("agent-video", "VideoAgent", Layer::Cloud, "cloud-hz-03"),
		NodeDescriptor::agent("agent-registry", "RegistryAgent", Layer::Cloud, "cloud-bj-01"),
		NodeDescriptor::agent("agent-discovery", "DiscoveryAgent", Layer::Cloud, "cloud-sh-01"),
		NodeDescriptor::agent("agent-meteorology", "MeteorologyAgent", Layer::Edge, "edge-bj-01"),
		NodeDescriptor::agent("agent-keyframe", "KeyframeAgent", Layer::Edge, "edge-bj-02"),
		NodeDescriptor::agent("agent-map", "MapAgent", Layer::Edge, "edge-sh-01"),
		NodeDescriptor::agent("agent-report", "ReportAgent", Layer::Edge, "edge-gz-01"),
	];
	let capabilities: [&[&str]; 7] = [
		&["video analysis", "object detection", "frame extraction"],
		&["registry", "agent catalog", "service discovery"],
		&["semantic search", "routing", "capability matching"],
		&["weather analysis", "climate prediction"],
		&["keyframe extraction", "scene detection"],
		&["map analysis", "spatial indexing"],
		&["report generation", "data visualization"],
	];
	for (agent, caps) in agents.iter_mut().zip(capabilities) {
		agent.capabilities = caps.iter().map(|cap| cap.to_string()).collect();
	}
	agents
}
