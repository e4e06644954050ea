//! Boundary to the remote modeling server.
//!
//! The wire itself is out of scope; a [`Transport`] only moves
//! [`ActionMessage`]s. [`RemoteActionForwarder`] sends locally dispatched
//! actions out, and [`spawn_inbound_pump`] dispatches inbound ones in arrival
//! order with the `received_from_server` marker set.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use weft_dispatch::{ActionDispatcher, ActionHandler, HandlerError, HandlerResult};
use weft_primitives::{Action, ActionMessage, Listeners, Subscription};

/// Transport failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
	/// The connection is gone.
	#[error("transport closed")]
	Closed,
	/// A message could not be encoded or decoded.
	#[error("codec error: {0}")]
	Codec(#[from] serde_json::Error),
}

/// Message channel to the server.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Sends one message to the server.
	async fn send(&self, message: ActionMessage) -> Result<(), TransportError>;

	/// Registers a callback for inbound messages.
	fn subscribe(&self, on_message: Box<dyn Fn(&ActionMessage) + Send + Sync>) -> Subscription;
}

/// Forwards locally originated actions to the server.
///
/// Actions that came from the server are never echoed back.
pub struct RemoteActionForwarder {
	transport: Arc<dyn Transport>,
	client_id: String,
}

impl std::fmt::Debug for RemoteActionForwarder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteActionForwarder").field("client_id", &self.client_id).finish()
	}
}

impl RemoteActionForwarder {
	pub fn new(transport: Arc<dyn Transport>, client_id: impl Into<String>) -> Self {
		Self {
			transport,
			client_id: client_id.into(),
		}
	}
}

#[async_trait]
impl ActionHandler for RemoteActionForwarder {
	async fn handle(&self, action: &Action) -> HandlerResult {
		if action.is_received_from_server() {
			return Ok(None);
		}
		tracing::trace!(kind = action.kind(), client_id = %self.client_id, "transport.forward");
		self.transport
			.send(ActionMessage::new(self.client_id.clone(), action.clone()))
			.await
			.map_err(|err| HandlerError::new(err.to_string()))?;
		Ok(None)
	}

	fn name(&self) -> &str {
		"remote"
	}
}

/// Dispatches inbound messages for `client_id` one at a time, in arrival order.
///
/// Responses to pending requests skip the queue and resolve on arrival, so a
/// handler awaiting a request never blocks its own reply. The pump ends once
/// the returned subscription is dropped.
pub fn spawn_inbound_pump(
	transport: &dyn Transport,
	dispatcher: ActionDispatcher,
	client_id: String,
) -> (Subscription, JoinHandle<()>) {
	let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
	let resolver = dispatcher.clone();
	let subscription = transport.subscribe(Box::new(move |message| {
		if message.client_id != client_id {
			tracing::trace!(client_id = %message.client_id, "transport.foreign_message");
			return;
		}
		let action = message.action.clone().received_from_server();
		if resolver.resolve_response(&action) {
			return;
		}
		if tx.send(action).is_err() {
			tracing::debug!("transport.pump_closed");
		}
	}));
	let pump = tokio::spawn(async move {
		while let Some(action) = rx.recv().await {
			let kind = action.kind().to_string();
			if let Err(err) = dispatcher.dispatch(action).await {
				tracing::warn!(kind, error = %err, "transport.inbound_failed");
			}
		}
		tracing::debug!("transport.pump_stopped");
	});
	(subscription, pump)
}

type Responder = Box<dyn Fn(&ActionMessage) -> Vec<Action> + Send + Sync>;

/// In-memory server stand-in.
///
/// Every sent message is encoded to JSON and back (exercising the wire
/// format), recorded, and handed to a responder whose actions are delivered
/// to subscribers as inbound messages for the same client.
pub struct LoopbackTransport {
	responder: Responder,
	sent: Mutex<Vec<ActionMessage>>,
	inbound: Listeners<ActionMessage>,
	closed: Mutex<bool>,
}

impl std::fmt::Debug for LoopbackTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LoopbackTransport")
			.field("sent", &self.sent.lock().len())
			.field("subscribers", &self.inbound.len())
			.finish()
	}
}

impl LoopbackTransport {
	pub fn new(responder: impl Fn(&ActionMessage) -> Vec<Action> + Send + Sync + 'static) -> Self {
		Self {
			responder: Box::new(responder),
			sent: Mutex::new(Vec::new()),
			inbound: Listeners::new(),
			closed: Mutex::new(false),
		}
	}

	/// A peer that never answers.
	pub fn silent() -> Self {
		Self::new(|_| Vec::new())
	}

	/// Delivers `action` to subscribers as if the server pushed it.
	pub fn push(&self, client_id: &str, action: Action) {
		self.inbound.emit(&ActionMessage::new(client_id, action));
	}

	/// Messages sent so far, decoded.
	pub fn sent(&self) -> Vec<ActionMessage> {
		self.sent.lock().clone()
	}

	/// Makes later sends fail with [`TransportError::Closed`].
	pub fn close(&self) {
		*self.closed.lock() = true;
	}
}

#[async_trait]
impl Transport for LoopbackTransport {
	async fn send(&self, message: ActionMessage) -> Result<(), TransportError> {
		if *self.closed.lock() {
			return Err(TransportError::Closed);
		}
		let encoded = serde_json::to_string(&message)?;
		let decoded: ActionMessage = serde_json::from_str(&encoded)?;
		tracing::trace!(bytes = encoded.len(), kind = decoded.action.kind(), "transport.loopback_send");
		let replies = (self.responder)(&decoded);
		let client_id = decoded.client_id.clone();
		self.sent.lock().push(decoded);
		for reply in replies {
			self.push(&client_id, reply);
		}
		Ok(())
	}

	fn subscribe(&self, on_message: Box<dyn Fn(&ActionMessage) + Send + Sync>) -> Subscription {
		self.inbound.subscribe(on_message)
	}
}
