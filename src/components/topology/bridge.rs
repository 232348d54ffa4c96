//! JavaScript entry points for the registration flow and backend push.
//!
//! Each export acts on whichever topology view is mounted right now and
//! returns `false` (after logging) when there is none or the call failed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;
use wasm_bindgen::prelude::*;

use super::config::FlowOptions;
use super::error::TopologyError;
use super::state::TopologyState;

thread_local! {
	static ACTIVE: RefCell<Weak<RefCell<TopologyState>>> = RefCell::new(Weak::new());
}

pub(crate) fn install(state: &Rc<RefCell<TopologyState>>) {
	ACTIVE.with(|active| *active.borrow_mut() = Rc::downgrade(state));
}

/// Forget `state` if it is the one currently installed.
pub(crate) fn release(state: &Rc<RefCell<TopologyState>>) {
	ACTIVE.with(|active| {
		let mut active = active.borrow_mut();
		if active.ptr_eq(&Rc::downgrade(state)) {
			*active = Weak::new();
		}
	});
}

pub(crate) fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map_or(0.0, |p| p.now())
}

fn with_state(
	call: &str,
	f: impl FnOnce(&mut TopologyState) -> Result<(), TopologyError>,
) -> bool {
	let Some(state) = ACTIVE.with(|active| active.borrow().upgrade()) else {
		warn!("{call}: no topology mounted");
		return false;
	};
	let Ok(mut state) = state.try_borrow_mut() else {
		warn!("{call}: topology busy");
		return false;
	};
	match f(&mut state) {
		Ok(()) => true,
		Err(err) => {
			warn!("{call}: {err}");
			false
		}
	}
}

/// Register a node from a JSON descriptor.
#[wasm_bindgen(js_name = addNode)]
pub fn add_node(descriptor: &str) -> bool {
	with_state("addNode", |state| state.add_node_json(descriptor).map(drop))
}

/// Remove a node together with its extension group and companion.
#[wasm_bindgen(js_name = removeNode)]
pub fn remove_node(id: &str) -> bool {
	with_state("removeNode", |state| state.remove_node(id).map(drop))
}

#[wasm_bindgen(js_name = highlightNode)]
pub fn highlight_node(id: &str) -> bool {
	with_state("highlightNode", |state| state.highlight(id, now_ms()))
}

/// Animate a flow from the user node to `target`. `options` is an optional
/// JSON object with `durationMs`, `speed` and `particles`.
#[wasm_bindgen(js_name = triggerFlow)]
pub fn trigger_flow(target: &str, options: Option<String>) -> bool {
	with_state("triggerFlow", |state| {
		let options = match options.as_deref() {
			Some(json) => FlowOptions::from_json(json)?,
			None => FlowOptions::default(),
		};
		state.trigger_flow(target, &options, now_ms())
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::topology::catalog::demo_agents;
	use crate::components::topology::config::TopologyConfig;

	#[test]
	fn exports_act_on_the_installed_state_only() {
		let state = Rc::new(RefCell::new(TopologyState::new(
			TopologyConfig::default(),
			&demo_agents(),
			1,
			800.0,
			600.0,
		)));
		assert!(!add_node(r#"{"id": "x1", "nodeId": "agent-map"}"#));

		install(&state);
		assert!(add_node(r#"{"id": "x1", "nodeId": "agent-map"}"#));
		assert!(!add_node(r#"{"id": "x1", "nodeId": "agent-map"}"#));
		assert!(!add_node("[]"));
		assert_eq!(
			state.borrow().store.node("x1").unwrap().extension_for(),
			Some("agent-map")
		);
		assert!(remove_node("x1"));
		assert!(!remove_node("x1"));

		let other = Rc::new(RefCell::new(TopologyState::new(
			TopologyConfig::default(),
			&[],
			1,
			800.0,
			600.0,
		)));
		release(&other);
		assert!(remove_node("agent-map"));
		release(&state);
		assert!(!remove_node("agent-report"));
	}

	#[test]
	fn dropped_state_is_not_reachable() {
		let state = Rc::new(RefCell::new(TopologyState::new(
			TopologyConfig::default(),
			&demo_agents(),
			1,
			800.0,
			600.0,
		)));
		install(&state);
		drop(state);
		assert!(!remove_node("agent-map"));
	}
}
