use leptos::prelude::*;
use log::info;

use crate::components::topology::catalog::demo_agents;
use crate::components::topology::config::TopologyConfig;
use crate::components::topology::{TopologyCanvas, bridge};

/// `<script id="topology-config" type="application/json">` in the host page.
fn page_config() -> TopologyConfig {
	let raw = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id("topology-config"))
		.and_then(|el| el.text_content());
	TopologyConfig::from_page(raw.as_deref())
}

/// Registration payload for the next demo extension under the keyframe agent.
fn demo_extension(n: usize) -> String {
	serde_json::json!({
		"id": format!("edge-ocr-{n}"),
		"name": format!("OcrAgent{n}"),
		"nodeId": "agent-keyframe",
		"capabilities": ["ocr", "text extraction"],
	})
	.to_string()
}

/// Dashboard page: the topology view plus flow and registration controls.
#[component]
pub fn Home() -> impl IntoView {
	let config = page_config();
	let agents = demo_agents();
	let targets: Vec<(String, String)> = agents
		.iter()
		.map(|a| (a.id.clone(), a.name.clone()))
		.collect();
	let registered = RwSignal::new(0usize);

	let register_extension = move |_| {
		let n = registered.get_untracked() + 1;
		if bridge::add_node(&demo_extension(n)) {
			info!("registered demo extension {n}");
			registered.set(n);
		}
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="topology-page" style="position: fixed; inset: 0;">
				<TopologyCanvas config=config agents=agents />
				<div class="graph-overlay">
					<h1>"Cloud / Edge / Terminal"</h1>
					<p class="subtitle">
						"Click an agent to toggle its companions. Pick a target to trace a task from the user."
					</p>
					<div class="flow-buttons">
						{targets
							.into_iter()
							.map(|(id, name)| {
								view! {
									<button on:click=move |_| {
										bridge::trigger_flow(&id, None);
									}>{name}</button>
								}
							})
							.collect_view()}
						<button on:click=register_extension>"Register extension"</button>
					</div>
					<p class="subtitle">"Extensions registered: " {move || registered.get()}</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use crate::components::topology::types::NodeDescriptor;

	use super::*;

	#[test]
	fn demo_extension_is_a_valid_descriptor() {
		let descriptor: NodeDescriptor = serde_json::from_str(&demo_extension(2)).unwrap();
		assert_eq!(descriptor.id, "edge-ocr-2");
		assert_eq!(descriptor.node_key(), Some("agent-keyframe"));
		assert_eq!(descriptor.capabilities.len(), 2);
	}
}
