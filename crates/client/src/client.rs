//! The composition root.
//!
//! [`DiagramClientBuilder::build`] constructs every component once and wires
//! them explicitly:
//!
//! 1. feedback link, handler and command registries, command stack,
//!    initialization constraint, dispatcher
//! 2. feedback dispatcher (bound into the link), selection service
//! 3. handler registration: commands first, then selection, then remote
//!    forwarding and caller-supplied handlers
//! 4. stack events re-validate the selection, then release actions queued for
//!    the next model update; an attached transport gets an inbound pump

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use weft_command::{CommandExecuted, CommandRegistry, CommandStack, FeedbackLink, register_command_handlers};
use weft_dispatch::{
	ActionDispatcher, ActionHandler, ActionHandlerRegistry, InitializationPolicy, ModelInitializationConstraint,
};
use weft_feedback::FeedbackActionDispatcher;
use weft_primitives::{ModelRoot, Subscription};
use weft_selection::{SelectionActionHandler, SelectionService};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{RemoteActionForwarder, Transport, spawn_inbound_pump};

struct Wiring {
	_subscriptions: Vec<Subscription>,
	pump: Option<JoinHandle<()>>,
}

impl Drop for Wiring {
	fn drop(&mut self) {
		if let Some(pump) = self.pump.take() {
			pump.abort();
		}
	}
}

/// Handle to a fully wired diagram client. Cheap to clone.
#[derive(Clone)]
pub struct DiagramClient {
	config: Arc<ClientConfig>,
	dispatcher: ActionDispatcher,
	commands: Arc<CommandRegistry>,
	stack: Arc<CommandStack>,
	feedback: Arc<FeedbackActionDispatcher>,
	selection: Arc<SelectionService>,
	_wiring: Arc<Wiring>,
}

impl fmt::Debug for DiagramClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DiagramClient")
			.field("client_id", &self.config.client_id)
			.field("dispatcher", &self.dispatcher)
			.finish()
	}
}

impl DiagramClient {
	pub fn builder(config: ClientConfig) -> DiagramClientBuilder {
		DiagramClientBuilder::new(config)
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub fn dispatcher(&self) -> &ActionDispatcher {
		&self.dispatcher
	}

	pub fn commands(&self) -> &Arc<CommandRegistry> {
		&self.commands
	}

	pub fn stack(&self) -> &Arc<CommandStack> {
		&self.stack
	}

	pub fn feedback(&self) -> &Arc<FeedbackActionDispatcher> {
		&self.feedback
	}

	pub fn selection(&self) -> &Arc<SelectionService> {
		&self.selection
	}

	/// The current model root.
	pub fn root(&self) -> Arc<ModelRoot> {
		self.stack.current_root()
	}
}

/// Collects optional parts before wiring a [`DiagramClient`].
pub struct DiagramClientBuilder {
	config: ClientConfig,
	constraint: Option<ModelInitializationConstraint>,
	transport: Option<Arc<dyn Transport>>,
	handlers: Vec<(String, Arc<dyn ActionHandler>)>,
	view_listeners: Vec<Box<dyn Fn(&CommandExecuted) + Send + Sync>>,
}

impl fmt::Debug for DiagramClientBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DiagramClientBuilder")
			.field("config", &self.config)
			.field("transport", &self.transport.is_some())
			.field("handlers", &self.handlers.len())
			.finish()
	}
}

impl DiagramClientBuilder {
	pub fn new(config: ClientConfig) -> Self {
		Self {
			config,
			constraint: None,
			transport: None,
			handlers: Vec::new(),
			view_listeners: Vec::new(),
		}
	}

	/// Replaces the default "model then canvas bounds" readiness policy.
	pub fn initialization_policy(mut self, policy: impl InitializationPolicy + 'static) -> Self {
		self.constraint = Some(ModelInitializationConstraint::new(policy));
		self
	}

	/// Connects the client to a server. Requires a Tokio runtime at build time.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Registers an extra handler after the built-in ones.
	pub fn handler(mut self, kind: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
		self.handlers.push((kind.into(), handler));
		self
	}

	/// Observes every executed command, e.g. to re-render.
	pub fn on_command_executed(mut self, listener: impl Fn(&CommandExecuted) + Send + Sync + 'static) -> Self {
		self.view_listeners.push(Box::new(listener));
		self
	}

	pub fn build(self) -> Result<DiagramClient> {
		self.config.validate()?;
		let config = Arc::new(self.config);

		let link = FeedbackLink::new();
		let actions = Arc::new(ActionHandlerRegistry::new());
		let commands = Arc::new(CommandRegistry::with_builtins(link.clone()));
		let stack = Arc::new(CommandStack::default());
		let constraint = self.constraint.unwrap_or_default();
		let dispatcher = ActionDispatcher::new(Arc::clone(&actions), constraint, config.dispatcher_config());

		let feedback = FeedbackActionDispatcher::new(&dispatcher, Arc::clone(&commands), &link);
		let selection = Arc::new(SelectionService::new(Arc::clone(&feedback)));

		register_command_handlers(&actions, &commands, &stack);
		SelectionActionHandler::new(Arc::clone(&selection), Arc::clone(&stack)).register(&actions);

		let mut subscriptions = vec![selection.track(&stack, &dispatcher)];
		let mut pump = None;
		if let Some(transport) = &self.transport {
			if tokio::runtime::Handle::try_current().is_err() {
				return Err(ClientError::NoRuntime);
			}
			let forwarder: Arc<dyn ActionHandler> =
				Arc::new(RemoteActionForwarder::new(Arc::clone(transport), config.client_id.clone()));
			for kind in &config.server_kinds {
				actions.register(kind, Arc::clone(&forwarder));
			}
			let (subscription, handle) =
				spawn_inbound_pump(transport.as_ref(), dispatcher.clone(), config.client_id.clone());
			subscriptions.push(subscription);
			pump = Some(handle);
		}
		for (kind, handler) in self.handlers {
			actions.register(&kind, handler);
		}

		{
			let dispatcher = dispatcher.clone();
			subscriptions.push(stack.subscribe(move |event| {
				if event.model_root_changed {
					dispatcher.handle_model_root_changed();
				}
			}));
		}
		for listener in self.view_listeners {
			subscriptions.push(stack.subscribe(listener));
		}

		tracing::debug!(
			client_id = %config.client_id,
			kinds = ?actions.kinds(),
			transport = pump.is_some(),
			"client.built"
		);

		Ok(DiagramClient {
			config,
			dispatcher,
			commands,
			stack,
			feedback,
			selection,
			_wiring: Arc::new(Wiring {
				_subscriptions: subscriptions,
				pump,
			}),
		})
	}
}
