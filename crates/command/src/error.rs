//! Command error types.

use weft_primitives::ModelError;

/// A convenient type alias for `Result` with `E` = [`CommandError`].
pub type Result<T, E = CommandError> = std::result::Result<T, E>;

/// Possible command errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum CommandError {
	/// No factory is registered for the action kind.
	#[error("no command registered for action kind '{0}'")]
	UnknownKind(String),
	/// A factory received an action of a kind it does not build.
	#[error("command for '{expected}' cannot be built from a '{actual}' action")]
	PayloadMismatch {
		/// Kind the factory builds from.
		expected: &'static str,
		/// Kind it was handed.
		actual: String,
	},
	/// The command produced an inconsistent model.
	#[error(transparent)]
	Model(#[from] ModelError),
	/// Re-applying feedback to a new root failed.
	#[error("feedback re-application failed: {0}")]
	Feedback(String),
}
