//! Startup phases and the diagram loader.
//!
//! [`DiagramLoader::load`] walks the phases in order:
//!
//! 1. `pre_load_diagram`
//! 2. `pre_initialize`, then the dispatcher is initialized
//! 3. `pre_request_model`, then `requestModel` is dispatched
//! 4. `post_request_model`
//! 5. `post_model_initialization`, once the initialization constraint completes
//!
//! Hooks run sequentially in registration order. A failing or slow hook is
//! logged and skipped; later hooks and phases still run.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use weft_primitives::{Action, saturating_millis};

use crate::client::DiagramClient;
use crate::error::Result;

/// Points in the load sequence where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartupPhase {
	PreLoadDiagram,
	PreInitialize,
	PreRequestModel,
	PostRequestModel,
	PostModelInitialization,
}

impl StartupPhase {
	pub const ALL: [StartupPhase; 5] = [
		Self::PreLoadDiagram,
		Self::PreInitialize,
		Self::PreRequestModel,
		Self::PostRequestModel,
		Self::PostModelInitialization,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::PreLoadDiagram => "pre_load_diagram",
			Self::PreInitialize => "pre_initialize",
			Self::PreRequestModel => "pre_request_model",
			Self::PostRequestModel => "post_request_model",
			Self::PostModelInitialization => "post_model_initialization",
		}
	}
}

impl fmt::Display for StartupPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Code that participates in diagram startup. Every phase defaults to a no-op.
#[async_trait]
pub trait StartupHook: Send + Sync {
	/// Name used in diagnostics.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}

	async fn pre_load_diagram(&self, _client: &DiagramClient) -> Result<()> {
		Ok(())
	}

	async fn pre_initialize(&self, _client: &DiagramClient) -> Result<()> {
		Ok(())
	}

	async fn pre_request_model(&self, _client: &DiagramClient) -> Result<()> {
		Ok(())
	}

	async fn post_request_model(&self, _client: &DiagramClient) -> Result<()> {
		Ok(())
	}

	async fn post_model_initialization(&self, _client: &DiagramClient) -> Result<()> {
		Ok(())
	}
}

/// Drives the startup sequence for one client.
#[derive(Clone)]
pub struct DiagramLoader {
	client: DiagramClient,
	hooks: Arc<Vec<Arc<dyn StartupHook>>>,
	hook_timeout: Duration,
}

impl fmt::Debug for DiagramLoader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DiagramLoader")
			.field("hooks", &self.hooks.iter().map(|h| h.name().to_string()).collect::<Vec<_>>())
			.field("hook_timeout", &self.hook_timeout)
			.finish()
	}
}

impl DiagramLoader {
	pub fn new(client: DiagramClient, hooks: Vec<Arc<dyn StartupHook>>) -> Self {
		let hook_timeout = client.config().startup_hook_timeout();
		Self {
			client,
			hooks: Arc::new(hooks),
			hook_timeout,
		}
	}

	/// Runs phases 1 to 4 and schedules phase 5.
	///
	/// The returned handle completes after the `post_model_initialization`
	/// hooks ran. Failing to dispatch `requestModel` is returned; hook
	/// failures never are.
	pub async fn load(&self) -> Result<JoinHandle<()>> {
		tracing::info!(client_id = %self.client.config().client_id, "startup.load");
		self.run_phase(StartupPhase::PreLoadDiagram).await;
		self.run_phase(StartupPhase::PreInitialize).await;
		self.client.dispatcher().initialize().await;
		self.run_phase(StartupPhase::PreRequestModel).await;
		self.request_model().await?;
		self.run_phase(StartupPhase::PostRequestModel).await;

		let loader = self.clone();
		Ok(tokio::spawn(async move {
			loader.client.dispatcher().constraint().on_initialized().await;
			loader.run_phase(StartupPhase::PostModelInitialization).await;
			tracing::info!("startup.ready");
		}))
	}

	async fn request_model(&self) -> Result<()> {
		let options = self.client.config().request_model_options();
		self.client.dispatcher().dispatch(Action::request_model(options)).await?;
		Ok(())
	}

	async fn run_phase(&self, phase: StartupPhase) {
		tracing::debug!(%phase, hooks = self.hooks.len(), "startup.phase");
		for hook in self.hooks.iter() {
			let call = async {
				match phase {
					StartupPhase::PreLoadDiagram => hook.pre_load_diagram(&self.client).await,
					StartupPhase::PreInitialize => hook.pre_initialize(&self.client).await,
					StartupPhase::PreRequestModel => hook.pre_request_model(&self.client).await,
					StartupPhase::PostRequestModel => hook.post_request_model(&self.client).await,
					StartupPhase::PostModelInitialization => hook.post_model_initialization(&self.client).await,
				}
			};
			match tokio::time::timeout(self.hook_timeout, call).await {
				Ok(Ok(())) => {}
				Ok(Err(err)) => tracing::warn!(hook = hook.name(), %phase, error = %err, "startup.hook_failed"),
				Err(_) => tracing::warn!(
					hook = hook.name(),
					%phase,
					timeout_ms = saturating_millis(self.hook_timeout),
					"startup.hook_timeout"
				),
			}
		}
	}
}
