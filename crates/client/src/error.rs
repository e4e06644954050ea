//! Client error types.

use thiserror::Error;
use weft_dispatch::DispatchError;

use crate::config::ConfigError;
use crate::startup::StartupPhase;
use crate::transport::TransportError;

/// A convenient type alias for `Result` with `E` = [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Possible client errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	/// A startup hook failed.
	#[error("startup hook '{hook}' failed in {phase}: {message}")]
	Hook {
		hook: String,
		phase: StartupPhase,
		message: String,
	},
	/// The client was built outside a Tokio runtime.
	#[error("a Tokio runtime is required to attach a transport")]
	NoRuntime,
}

impl ClientError {
	/// Shorthand for a hook failure raised from inside a hook.
	pub fn hook(hook: impl Into<String>, phase: StartupPhase, message: impl Into<String>) -> Self {
		Self::Hook {
			hook: hook.into(),
			phase,
			message: message.into(),
		}
	}
}
