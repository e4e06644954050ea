//! The action dispatcher.
//!
//! # Ordering
//!
//! Handlers registered for one kind are awaited one after another in
//! registration order; handler 2 does not start before handler 1 settles.
//! [`ActionDispatcher::dispatch_all`] dispatches strictly in sequence. Deferred
//! batches (waiting for initialization or for the next model update) are
//! released into a single FIFO and drained by the outermost dispatch call.
//!
//! # Requests
//!
//! A request registers a pending entry keyed by its `requestId` and dispatches
//! the request in a detached task. A response whose `responseId` matches a
//! pending entry resolves it and bypasses ordinary handlers. A response with
//! no live entry (for example one arriving after a timeout) has its
//! `responseId` cleared and is handled like any other action.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use tokio::sync::{OnceCell, oneshot};
use weft_primitives::{Action, ActionPayload, BoxFutureSend, ModelRoot, generate_request_id, saturating_millis};

use crate::constraint::ModelInitializationConstraint;
use crate::error::{DispatchError, Result};
use crate::registry::ActionHandlerRegistry;
use crate::spawn::spawn_detached;

#[cfg(test)]
mod tests;

/// Default deadline for [`ActionDispatcher::request_timed`].
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
	/// Deadline used by [`ActionDispatcher::request_timed`].
	pub request_timeout: Duration,
}

impl Default for DispatcherConfig {
	fn default() -> Self {
		Self {
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}
}

type PendingSender = oneshot::Sender<Result<Action>>;

#[derive(Default)]
struct Queues {
	/// Batches held back until the model is initialized.
	until_initialized: Vec<Vec<Action>>,
	/// Actions held back until the next model root change.
	after_update: Vec<Action>,
	/// Released batches awaiting dispatch.
	ready: VecDeque<Vec<Action>>,
}

struct DispatcherInner {
	registry: Arc<ActionHandlerRegistry>,
	constraint: ModelInitializationConstraint,
	config: DispatcherConfig,
	pending: Mutex<HashMap<String, PendingSender>>,
	queues: Mutex<Queues>,
	draining: AtomicBool,
	in_flight: AtomicUsize,
	observing: AtomicBool,
	init: OnceCell<()>,
}

impl DispatcherInner {
	fn release_until_initialized(&self) {
		let mut queues = self.queues.lock();
		let batches = std::mem::take(&mut queues.until_initialized);
		if !batches.is_empty() {
			tracing::debug!(batches = batches.len(), "dispatch.release_initialized");
		}
		queues.ready.extend(batches);
	}
}

/// Resets the drain flag even if the draining future is dropped.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// Counts a dispatch as in flight until dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
	fn enter(counter: &'a AtomicUsize) -> Self {
		counter.fetch_add(1, Ordering::AcqRel);
		Self(counter)
	}
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::AcqRel);
	}
}

/// Cloneable handle to the action dispatcher.
#[derive(Clone)]
pub struct ActionDispatcher {
	inner: Arc<DispatcherInner>,
}

/// Non-owning dispatcher handle for components the dispatcher's own handlers
/// reach, so they do not keep it alive.
#[derive(Clone)]
pub struct WeakActionDispatcher {
	inner: Weak<DispatcherInner>,
}

impl WeakActionDispatcher {
	/// Returns the dispatcher if it is still alive.
	pub fn upgrade(&self) -> Option<ActionDispatcher> {
		self.inner.upgrade().map(|inner| ActionDispatcher { inner })
	}
}

impl std::fmt::Debug for WeakActionDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WeakActionDispatcher")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}

impl std::fmt::Debug for ActionDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActionDispatcher")
			.field("pending", &self.pending_request_count())
			.field("initialized", &self.is_initialized())
			.finish()
	}
}

impl ActionDispatcher {
	/// Creates a dispatcher over `registry`, reporting to `constraint`.
	pub fn new(registry: Arc<ActionHandlerRegistry>, constraint: ModelInitializationConstraint, config: DispatcherConfig) -> Self {
		let inner = Arc::new(DispatcherInner {
			registry,
			constraint: constraint.clone(),
			config,
			pending: Mutex::new(HashMap::default()),
			queues: Mutex::new(Queues::default()),
			draining: AtomicBool::new(false),
			in_flight: AtomicUsize::new(0),
			observing: AtomicBool::new(false),
			init: OnceCell::new(),
		});
		let weak = Arc::downgrade(&inner);
		let _ = constraint.on_initialized_with(move || {
			if let Some(inner) = weak.upgrade() {
				inner.release_until_initialized();
			}
		});
		Self { inner }
	}

	/// A handle that does not keep the dispatcher alive.
	pub fn downgrade(&self) -> WeakActionDispatcher {
		WeakActionDispatcher {
			inner: Arc::downgrade(&self.inner),
		}
	}

	/// The handler registry.
	pub fn registry(&self) -> &Arc<ActionHandlerRegistry> {
		&self.inner.registry
	}

	/// The initialization constraint.
	pub fn constraint(&self) -> &ModelInitializationConstraint {
		&self.inner.constraint
	}

	/// The dispatcher configuration.
	pub fn config(&self) -> DispatcherConfig {
		self.inner.config
	}

	/// Returns true once [`initialize`](Self::initialize) has completed.
	pub fn is_initialized(&self) -> bool {
		self.inner.init.initialized()
	}

	/// One-time bootstrap; concurrent and repeated calls share one run.
	///
	/// Flushes lazy handler registrations, resets the diagram to the empty
	/// model (errors are logged, not returned), then starts reporting
	/// dispatched actions to the initialization constraint.
	pub async fn initialize(&self) {
		self.inner
			.init
			.get_or_init(|| async {
				let flushed = self.inner.registry.flush_lazy();
				tracing::debug!(lazy_registrations = flushed, "dispatch.initialize");
				if let Err(err) = self.handle_action(Action::set_model(ModelRoot::empty())).await {
					tracing::warn!(error = %err, "dispatch.initialize.reset_failed");
				}
				self.inner.observing.store(true, Ordering::Release);
			})
			.await;
	}

	/// Dispatches one action to its handlers.
	///
	/// Resolves after every handler settled and the action was reported to
	/// the initialization constraint. The first handler failure skips the
	/// remaining handlers and is returned.
	pub fn dispatch(&self, action: Action) -> BoxFutureSend<'_, Result<()>> {
		Box::pin(async move {
			let _in_flight = InFlightGuard::enter(&self.inner.in_flight);
			let result = self.handle_action(action).await;
			self.drain_ready().await;
			result
		})
	}

	/// Dispatches actions strictly in order.
	///
	/// Every action is attempted; the first failure is returned once all settled.
	pub async fn dispatch_all<I>(&self, actions: I) -> Result<()>
	where
		I: IntoIterator<Item = Action>,
		I::IntoIter: Send,
	{
		let mut first_error = None;
		for action in actions {
			if let Err(err) = self.dispatch(action).await {
				first_error.get_or_insert(err);
			}
		}
		first_error.map_or(Ok(()), Err)
	}

	/// Sends a request and waits for its correlated response.
	///
	/// An empty `requestId` is replaced with a fresh one.
	pub async fn request(&self, action: Action) -> Result<Action> {
		let (request_id, rx) = self.start_request(action)?;
		rx.await.unwrap_or_else(|_| Err(DispatchError::Dropped { request_id }))
	}

	/// Like [`request`](Self::request) but gives up waiting after `timeout`.
	///
	/// On timeout the pending entry is removed and the call resolves to
	/// `Ok(None)`, or fails with [`DispatchError::Timeout`] when
	/// `reject_on_timeout` is set. The request itself keeps running; a late
	/// response is handled as an ordinary action.
	pub async fn request_until(&self, action: Action, timeout: Duration, reject_on_timeout: bool) -> Result<Option<Action>> {
		let kind = action.kind().to_string();
		let (request_id, mut rx) = self.start_request(action)?;
		match tokio::time::timeout(timeout, &mut rx).await {
			Ok(Ok(result)) => result.map(Some),
			Ok(Err(_)) => Err(DispatchError::Dropped { request_id }),
			Err(_) => {
				let removed = self.inner.pending.lock().remove(&request_id).is_some();
				if !removed {
					// A response claimed the entry right at the deadline.
					return match rx.await {
						Ok(result) => result.map(Some),
						Err(_) => Err(DispatchError::Dropped { request_id }),
					};
				}
				let timeout_ms = saturating_millis(timeout);
				if reject_on_timeout {
					tracing::warn!(request_id, kind, timeout_ms, "request.timeout");
					Err(DispatchError::Timeout { request_id, timeout })
				} else {
					tracing::info!(request_id, kind, timeout_ms, "request.timeout");
					Ok(None)
				}
			}
		}
	}

	/// [`request_until`](Self::request_until) with the configured default deadline.
	pub async fn request_timed(&self, action: Action) -> Result<Option<Action>> {
		self.request_until(action, self.inner.config.request_timeout, false).await
	}

	/// Dispatches `actions` once the model is initialized, immediately if it already is.
	///
	/// Deferred batches are released in registration order. Deferring is fire
	/// and forget: the call returns `Ok(())` as soon as the batch is queued, and
	/// failures of the batch once released are logged as
	/// `dispatch.deferred_failed` instead of being returned. Callers that need
	/// the outcome await [`ModelInitializationConstraint::on_initialized`] and
	/// dispatch themselves.
	pub async fn dispatch_once_model_initialized(&self, actions: Vec<Action>) -> Result<()> {
		let actions = {
			let mut queues = self.inner.queues.lock();
			if !self.inner.constraint.is_completed() {
				tracing::debug!(count = actions.len(), "dispatch.defer_until_initialized");
				queues.until_initialized.push(actions);
				return Ok(());
			}
			if queues.ready.is_empty() {
				Some(actions)
			} else {
				// Released batches go first.
				queues.ready.push_back(actions);
				None
			}
		};
		match actions {
			Some(actions) => self.dispatch_all(actions).await,
			None => {
				self.drain_ready().await;
				Ok(())
			}
		}
	}

	/// Queues `actions` until the next model root change.
	pub fn dispatch_after_next_update(&self, actions: Vec<Action>) {
		if actions.is_empty() {
			return;
		}
		tracing::debug!(count = actions.len(), "dispatch.defer_after_update");
		self.inner.queues.lock().after_update.extend(actions);
	}

	/// Releases actions queued by [`dispatch_after_next_update`](Self::dispatch_after_next_update).
	///
	/// Called when a command replaced the model root. Released actions are
	/// dispatched at the end of the dispatch currently in flight, or by
	/// [`flush`](Self::flush).
	pub fn handle_model_root_changed(&self) {
		let mut queues = self.inner.queues.lock();
		if queues.after_update.is_empty() {
			return;
		}
		let batch = std::mem::take(&mut queues.after_update);
		tracing::debug!(count = batch.len(), "dispatch.release_after_update");
		queues.ready.push_back(batch);
	}

	/// Queues `actions` behind the dispatch in flight.
	///
	/// The queue is drained when the outermost dispatch settles, or by
	/// [`flush`](Self::flush) when nothing is being dispatched.
	pub fn enqueue(&self, actions: Vec<Action>) {
		if actions.is_empty() {
			return;
		}
		self.inner.queues.lock().ready.push_back(actions);
	}

	/// Dispatches every released batch now.
	pub async fn flush(&self) {
		self.drain_ready().await;
	}

	/// Returns true while at least one dispatch has not settled.
	pub fn is_dispatching(&self) -> bool {
		self.inner.in_flight.load(Ordering::Acquire) > 0
	}

	/// Resolves the pending request `action` answers, bypassing handlers.
	///
	/// Returns false when `action` is not a response or no request waits for
	/// it. Transports call this for inbound responses so that a handler
	/// awaiting a request does not block its own reply.
	pub fn resolve_response(&self, action: &Action) -> bool {
		if !action.is_response() {
			return false;
		}
		let Some(tx) = self.inner.pending.lock().remove(action.response_id()) else {
			return false;
		};
		let result = match action.payload() {
			ActionPayload::Reject { message, detail } => Err(DispatchError::Rejected {
				request_id: action.response_id().to_string(),
				message: message.clone(),
				detail: detail.clone(),
			}),
			_ => Ok(action.clone()),
		};
		tracing::trace!(request_id = action.response_id(), kind = action.kind(), "request.resolve");
		self.notify_dispatched(action);
		let _ = tx.send(result);
		true
	}

	/// Number of requests awaiting a response.
	pub fn pending_request_count(&self) -> usize {
		self.inner.pending.lock().len()
	}

	/// Returns true when `request_id` still has a live pending entry.
	pub fn has_pending_request(&self, request_id: &str) -> bool {
		self.inner.pending.lock().contains_key(request_id)
	}

	/// Number of actions waiting for the next model update.
	pub fn queued_after_update(&self) -> usize {
		self.inner.queues.lock().after_update.len()
	}

	/// Number of batches waiting for model initialization.
	pub fn queued_until_initialized(&self) -> usize {
		self.inner.queues.lock().until_initialized.len()
	}

	fn start_request(&self, mut action: Action) -> Result<(String, oneshot::Receiver<Result<Action>>)> {
		if !action.is_request() {
			action.set_request_id(generate_request_id());
		}
		let request_id = action.request_id().to_string();
		let (tx, rx) = oneshot::channel();
		{
			let mut pending = self.inner.pending.lock();
			if pending.contains_key(&request_id) {
				return Err(DispatchError::DuplicateRequest(request_id));
			}
			pending.insert(request_id.clone(), tx);
		}
		tracing::trace!(request_id, kind = action.kind(), "request.start");

		let this = self.clone();
		let id = request_id.clone();
		spawn_detached("dispatch.request", async move {
			if let Err(err) = this.dispatch(action).await {
				let pending = this.inner.pending.lock().remove(&id);
				if let Some(tx) = pending {
					tracing::debug!(request_id = id, error = %err, "request.dispatch_failed");
					let _ = tx.send(Err(err));
				}
			}
		});
		Ok((request_id, rx))
	}

	async fn handle_action(&self, mut action: Action) -> Result<()> {
		if action.is_response() {
			if self.resolve_response(&action) {
				return Ok(());
			}
			tracing::debug!(response_id = action.response_id(), kind = action.kind(), "dispatch.unmatched_response");
			action.clear_response_id();
		}

		let handlers = self.inner.registry.handlers(action.kind());
		if handlers.is_empty() {
			if action.is_optional() {
				tracing::trace!(kind = action.kind(), "dispatch.optional_unhandled");
				self.notify_dispatched(&action);
				return Ok(());
			}
			tracing::warn!(kind = action.kind(), "dispatch.missing_handler");
			return Err(DispatchError::MissingHandler {
				kind: action.kind().to_string(),
			});
		}

		for handler in &handlers {
			match handler.handle(&action).await {
				Ok(Some(follow_up)) => {
					let follow_kind = follow_up.kind().to_string();
					if let Err(err) = self.dispatch(follow_up).await {
						tracing::warn!(kind = action.kind(), follow_up = follow_kind, error = %err, "dispatch.follow_up_failed");
					}
				}
				Ok(None) => {}
				Err(source) => {
					tracing::warn!(kind = action.kind(), handler = handler.name(), error = %source, "dispatch.handler_failed");
					return Err(DispatchError::Handler {
						kind: action.kind().to_string(),
						source,
					});
				}
			}
		}

		self.notify_dispatched(&action);
		Ok(())
	}

	fn notify_dispatched(&self, action: &Action) {
		if self.inner.observing.load(Ordering::Acquire) {
			self.inner.constraint.notify_dispatched(action);
		}
	}

	async fn drain_ready(&self) {
		loop {
			if self
				.inner
				.draining
				.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
				.is_err()
			{
				return;
			}
			{
				let _guard = DrainGuard(&self.inner.draining);
				loop {
					let batch = self.inner.queues.lock().ready.pop_front();
					let Some(batch) = batch else {
						break;
					};
					if let Err(err) = self.dispatch_all(batch).await {
						tracing::warn!(error = %err, "dispatch.deferred_failed");
					}
				}
			}
			if self.inner.queues.lock().ready.is_empty() {
				return;
			}
		}
	}
}
