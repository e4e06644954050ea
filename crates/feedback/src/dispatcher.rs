//! Registration-ordered feedback store.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use weft_command::{CommandExecutionContext, CommandRegistry, FeedbackApplier, FeedbackLink};
use weft_dispatch::{ActionDispatcher, Result, WeakActionDispatcher};
use weft_primitives::Action;

use crate::emitter::{EmitterId, FeedbackEmitter};


/// Keeps the latest feedback actions per emitter and replays them onto new roots.
///
/// At most one entry exists per emitter. Re-registering replaces the actions
/// but keeps the emitter's original position, so replay order always follows
/// first registration.
pub struct FeedbackActionDispatcher {
	dispatcher: WeakActionDispatcher,
	commands: Arc<CommandRegistry>,
	registered: Mutex<IndexMap<EmitterId, Vec<Action>>>,
}

impl std::fmt::Debug for FeedbackActionDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FeedbackActionDispatcher")
			.field("emitters", &self.registered.lock().len())
			.finish()
	}
}

impl FeedbackActionDispatcher {
	/// Creates the dispatcher and binds it to `link` for model commands.
	///
	/// Only a weak handle to `dispatcher` is kept, since the dispatcher's
	/// handlers usually reach back to this component.
	pub fn new(dispatcher: &ActionDispatcher, commands: Arc<CommandRegistry>, link: &FeedbackLink) -> Arc<Self> {
		let this = Arc::new(Self {
			dispatcher: dispatcher.downgrade(),
			commands,
			registered: Mutex::new(IndexMap::new()),
		});
		let applier: Arc<dyn FeedbackApplier> = this.clone();
		link.bind(&applier);
		this
	}

	/// A fresh emitter bound to this dispatcher.
	pub fn create_emitter(self: &Arc<Self>) -> FeedbackEmitter {
		FeedbackEmitter::new(Arc::clone(self))
	}

	/// Stores `actions` for `emitter` and dispatches them right away.
	///
	/// An empty list removes the emitter's entry.
	pub async fn register_feedback(&self, emitter: EmitterId, actions: Vec<Action>) -> Result<()> {
		self.store_feedback(emitter, actions.clone());
		self.dispatch_now(actions).await
	}

	/// Stores `actions` for `emitter` without dispatching them.
	///
	/// Later model replacements replay them; the caller is responsible for
	/// dispatching them once. An empty list removes the emitter's entry.
	pub fn store_feedback(&self, emitter: EmitterId, actions: Vec<Action>) {
		tracing::trace!(%emitter, actions = actions.len(), "feedback.register");
		let mut registered = self.registered.lock();
		if actions.is_empty() {
			registered.shift_remove(&emitter);
		} else {
			registered.insert(emitter, actions);
		}
	}

	/// Removes the entry for `emitter` and dispatches `cleanup`.
	pub async fn deregister_feedback(&self, emitter: EmitterId, cleanup: Vec<Action>) -> Result<()> {
		let removed = self.registered.lock().shift_remove(&emitter).is_some();
		tracing::trace!(%emitter, removed, cleanup = cleanup.len(), "feedback.deregister");
		self.dispatch_now(cleanup).await
	}

	async fn dispatch_now(&self, actions: Vec<Action>) -> Result<()> {
		if actions.is_empty() {
			return Ok(());
		}
		match self.dispatcher.upgrade() {
			Some(dispatcher) => dispatcher.dispatch_all(actions).await,
			None => {
				tracing::debug!("feedback.dispatcher_dropped");
				Ok(())
			}
		}
	}

	/// Every registered entry in emitter-registration order.
	pub fn registered_feedback(&self) -> Vec<(EmitterId, Vec<Action>)> {
		self.registered
			.lock()
			.iter()
			.map(|(emitter, actions)| (*emitter, actions.clone()))
			.collect()
	}

	/// Emitters whose registered actions include `kind`.
	pub fn registered_emitters(&self, kind: &str) -> Vec<EmitterId> {
		self.registered
			.lock()
			.iter()
			.filter(|(_, actions)| actions.iter().any(|action| action.kind() == kind))
			.map(|(emitter, _)| *emitter)
			.collect()
	}

	pub fn is_registered(&self, emitter: EmitterId) -> bool {
		self.registered.lock().contains_key(&emitter)
	}
}

impl FeedbackApplier for FeedbackActionDispatcher {
	/// Replays registered feedback against the context root.
	///
	/// Actions without a command are skipped; a failing command is logged and
	/// does not stop the rest.
	fn apply_feedback_commands(&self, ctx: &mut CommandExecutionContext) -> weft_command::Result<()> {
		let snapshot = self.registered_feedback();
		let mut applied = 0usize;
		for (emitter, actions) in &snapshot {
			for action in actions {
				let command = match self.commands.create(action) {
					Ok(command) => command,
					Err(err) => {
						tracing::trace!(%emitter, kind = action.kind(), error = %err, "feedback.skip");
						continue;
					}
				};
				match command.execute(ctx) {
					Ok(()) => applied += 1,
					Err(err) => tracing::warn!(%emitter, kind = action.kind(), error = %err, "feedback.apply_failed"),
				}
			}
		}
		tracing::debug!(emitters = snapshot.len(), applied, "feedback.apply");
		Ok(())
	}
}
