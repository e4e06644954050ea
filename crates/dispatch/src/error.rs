//! Dispatch error types.

use std::time::Duration;

/// A convenient type alias for `Result` with `E` = [`DispatchError`].
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;

/// Failure reported by an action handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
	message: String,
}

impl HandlerError {
	/// Creates a handler error with a human-readable message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	/// The error message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl From<String> for HandlerError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

impl From<&str> for HandlerError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

impl From<DispatchError> for HandlerError {
	fn from(err: DispatchError) -> Self {
		Self::new(err.to_string())
	}
}

/// Possible dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
	/// No handler is registered for a non-optional action.
	#[error("missing handler for action kind '{kind}'")]
	MissingHandler {
		/// Kind of the unhandled action.
		kind: String,
	},
	/// A handler failed; later handlers for the same action were skipped.
	#[error("handler for '{kind}' failed: {source}")]
	Handler {
		/// Kind of the action being handled.
		kind: String,
		/// The handler's failure.
		#[source]
		source: HandlerError,
	},
	/// The peer answered a request with a reject action.
	#[error("request '{request_id}' rejected: {message}")]
	Rejected {
		/// Id of the rejected request.
		request_id: String,
		/// Rejection message.
		message: String,
		/// Optional rejection detail.
		detail: Option<String>,
	},
	/// No response arrived before the deadline and the caller opted into rejection.
	#[error("request '{request_id}' timed out after {timeout:?}")]
	Timeout {
		/// Id of the timed-out request.
		request_id: String,
		/// The elapsed deadline.
		timeout: Duration,
	},
	/// The pending entry vanished without a response.
	#[error("request '{request_id}' was dropped before a response arrived")]
	Dropped {
		/// Id of the dropped request.
		request_id: String,
	},
	/// A request reused the id of a request that is still pending.
	#[error("request id '{0}' is already pending")]
	DuplicateRequest(String),
}
