//! Three-band cloud/edge/terminal topology with deterministic layout,
//! dynamically attached extension groups and animated task flows.

pub mod bridge;
pub mod catalog;
mod component;
pub mod config;
pub mod edges;
pub mod error;
pub mod extension;
pub mod flow;
pub mod layout;
pub mod metrics;
mod render;
pub mod state;
pub mod store;
pub mod surface;
pub mod types;

pub use component::TopologyCanvas;
