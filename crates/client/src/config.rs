//! Client configuration.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```toml
//! client-id = "weft-client"
//! diagram-type = "workflow-diagram"
//! request-timeout-ms = 2000
//! startup-hook-timeout-ms = 5000
//! server-kinds = ["requestModel"]
//!
//! [request-model-options]
//! sourceUri = "file:///tmp/example.wf"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use weft_dispatch::DispatcherConfig;
use weft_primitives::kinds;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
	/// The document is not valid TOML for [`ClientConfig`].
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
	/// A field holds a value the client cannot run with.
	#[error("invalid value for '{field}': {reason}")]
	Invalid {
		/// Offending field.
		field: &'static str,
		/// Why it was rejected.
		reason: String,
	},
}

const DEFAULT_CLIENT_ID: &str = "weft-client";
const DEFAULT_DIAGRAM_TYPE: &str = "graph";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2000;
const DEFAULT_HOOK_TIMEOUT_MS: u64 = 5000;

/// Settings for one diagram client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClientConfig {
	/// Id stamped on every outbound message.
	pub client_id: String,
	/// Diagram type requested from the server.
	pub diagram_type: String,
	/// Deadline for requests sent without an explicit timeout.
	pub request_timeout_ms: u64,
	/// Upper bound for a single startup hook call.
	pub startup_hook_timeout_ms: u64,
	/// Action kinds forwarded to the server.
	pub server_kinds: Vec<String>,
	/// Extra options sent with the initial model request.
	pub request_model_options: Map<String, Value>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			client_id: DEFAULT_CLIENT_ID.to_string(),
			diagram_type: DEFAULT_DIAGRAM_TYPE.to_string(),
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
			startup_hook_timeout_ms: DEFAULT_HOOK_TIMEOUT_MS,
			server_kinds: vec![kinds::REQUEST_MODEL.to_string()],
			request_model_options: Map::new(),
		}
	}
}

impl ClientConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses, and validates a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), client_id = %config.client_id, "config.loaded");
		Ok(config)
	}

	/// Rejects values the client cannot run with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::Invalid {
				field: "client-id",
				reason: "must not be empty".into(),
			});
		}
		if self.request_timeout_ms == 0 {
			return Err(ConfigError::Invalid {
				field: "request-timeout-ms",
				reason: "must be greater than zero".into(),
			});
		}
		Ok(())
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	pub fn startup_hook_timeout(&self) -> Duration {
		Duration::from_millis(self.startup_hook_timeout_ms)
	}

	pub fn dispatcher_config(&self) -> DispatcherConfig {
		DispatcherConfig {
			request_timeout: self.request_timeout(),
		}
	}

	/// Options for the initial `requestModel` action.
	///
	/// Always carries `diagramType`; explicit options win.
	pub fn request_model_options(&self) -> Map<String, Value> {
		let mut options = Map::new();
		options.insert("diagramType".into(), Value::String(self.diagram_type.clone()));
		options.extend(self.request_model_options.clone());
		options
	}
}
