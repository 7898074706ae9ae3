//! Error types for view resolution and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for all view-rendering operations
pub type Result<T> = std::result::Result<T, ViewsError>;

/// Errors surfaced by the views middleware
///
/// Every error is terminal for the invocation that produced it: there is
/// no retry, no fallback engine and no partial-success state. The hosting
/// pipeline decides how each variant maps to an HTTP response.
#[derive(Debug, Error)]
pub enum ViewsError {
	/// The requested view does not resolve to an existing file under the
	/// base directory.
	#[error("view not found: {}", .0.display())]
	ViewNotFound(PathBuf),

	/// The resolved extension (after the optional remap) has no engine
	/// registered for it.
	///
	/// The message text is a stable contract; consumers match against it.
	#[error("Engine not found for the \".{extension}\" file extension")]
	EngineNotFound {
		/// The literal extension that failed to dispatch
		extension: String,
	},

	/// A view name that is absolute or escapes the base directory.
	#[error("invalid view path: {0}")]
	InvalidPath(String),

	/// The selected engine failed while rendering the template.
	///
	/// Engines with richer error types should stringify them into this
	/// variant; the orchestrator propagates it unmodified.
	#[error("engine error: {0}")]
	Engine(String),

	/// I/O failure from the static passthrough or a template read.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn engine_not_found_message_is_stable() {
		let err = ViewsError::EngineNotFound {
			extension: "pug".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"Engine not found for the \".pug\" file extension"
		);
	}
}
