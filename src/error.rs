//! Errors at the edges of the crate. Builders and layout engines never fail.

/// Crate error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The analyzer payload is not a policy summary.
	#[error("failed to parse policy summary: {0}")]
	Document(#[from] serde_json::Error),
	/// Filter value outside `all | statement | action | resource | principal`.
	#[error("unknown node filter `{0}`")]
	UnknownFilter(String),
	/// The browser refused a 2D context for a canvas.
	#[error("canvas 2d context unavailable")]
	CanvasContext,
}

/// Result alias defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
