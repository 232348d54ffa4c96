use thiserror::Error;

/// Recoverable failures of the topology core. None of these are fatal to the
/// page: callers log them and carry on.
#[derive(Debug, Error)]
pub enum TopologyError {
	#[error("node id must not be empty")]
	EmptyId,
	#[error("node `{0}` is already registered")]
	DuplicateNode(String),
	#[error("node `{0}` is not in the roster")]
	UnknownNode(String),
	#[error("flow target `{0}` does not resolve to a live node")]
	UnresolvedTarget(String),
	#[error("no path from `{from}` to `{to}`")]
	NoPath { from: String, to: String },
	#[error("path hop `{from}` -> `{to}` has no edge")]
	MissingEdge { from: String, to: String },
	#[error("malformed json: {0}")]
	Json(#[from] serde_json::Error),
}
