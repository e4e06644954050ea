//! The forward-only command stack.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use weft_primitives::{Listeners, ModelRoot, Subscription};

use crate::command::Command;
use crate::context::CommandExecutionContext;
use crate::error::Result;

/// Published after every successful command execution.
#[derive(Debug, Clone)]
pub struct CommandExecuted {
	/// Kind of the executed command.
	pub kind: String,
	/// The root after execution.
	pub root: Arc<ModelRoot>,
	/// True when the command swapped in a whole new root.
	pub model_root_changed: bool,
}

/// Owns the current model root and executes commands against it.
///
/// Executions are serialized; readers load the current root without locking.
pub struct CommandStack {
	root: ArcSwap<ModelRoot>,
	exec: Mutex<()>,
	listeners: Listeners<CommandExecuted>,
}

impl Default for CommandStack {
	fn default() -> Self {
		Self::new(ModelRoot::empty())
	}
}

impl std::fmt::Debug for CommandStack {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let root = self.root.load();
		f.debug_struct("CommandStack")
			.field("root", &root.id())
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl CommandStack {
	pub fn new(root: ModelRoot) -> Self {
		Self {
			root: ArcSwap::from_pointee(root),
			exec: Mutex::new(()),
			listeners: Listeners::new(),
		}
	}

	/// The current root snapshot.
	pub fn current_root(&self) -> Arc<ModelRoot> {
		self.root.load_full()
	}

	/// Runs `command` on a copy of the current root and publishes the result.
	///
	/// On failure the current root is left untouched and nothing is published.
	pub fn execute(&self, command: &dyn Command) -> Result<Arc<ModelRoot>> {
		let event = {
			let _exec = self.exec.lock();
			let mut ctx = CommandExecutionContext::new(ModelRoot::clone(&self.root.load()));
			if let Err(err) = command.execute(&mut ctx) {
				tracing::warn!(kind = command.kind(), error = %err, "command.failed");
				return Err(err);
			}
			let model_root_changed = ctx.model_root_changed();
			let root = Arc::new(ctx.into_root());
			self.root.store(Arc::clone(&root));
			CommandExecuted {
				kind: command.kind().to_string(),
				root,
				model_root_changed,
			}
		};
		tracing::trace!(kind = event.kind.as_str(), model_root_changed = event.model_root_changed, "command.executed");
		self.listeners.emit(&event);
		Ok(event.root)
	}

	/// History is disabled; returns the current root unchanged.
	pub fn undo(&self) -> Arc<ModelRoot> {
		tracing::debug!("command.undo_disabled");
		self.current_root()
	}

	/// History is disabled; returns the current root unchanged.
	pub fn redo(&self) -> Arc<ModelRoot> {
		tracing::debug!("command.redo_disabled");
		self.current_root()
	}

	/// Subscribes to [`CommandExecuted`] events.
	pub fn subscribe(&self, listener: impl Fn(&CommandExecuted) + Send + Sync + 'static) -> Subscription {
		self.listeners.subscribe(listener)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use weft_primitives::{ModelElement, kinds};

	use super::*;
	use crate::builtin::{SelectFeedbackCommand, SetModelCommand};
	use crate::error::CommandError;
	use crate::feedback::FeedbackLink;

	fn graph() -> ModelRoot {
		ModelRoot::new("graph", "graph")
			.with_element(ModelElement::new("n1", "node"))
			.unwrap()
	}

	struct Failing;

	impl Command for Failing {
		fn kind(&self) -> &str {
			"failing"
		}

		fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
			ctx.root_mut().add_css_class("half-done");
			Err(CommandError::Feedback("nope".into()))
		}
	}

	#[test]
	fn execute_swaps_root_and_publishes() {
		let stack = CommandStack::default();
		let events = Arc::new(Mutex::new(Vec::new()));
		let _sub = {
			let events = Arc::clone(&events);
			stack.subscribe(move |event| events.lock().push((event.kind.clone(), event.model_root_changed)))
		};

		let root = stack.execute(&SetModelCommand::new(graph(), FeedbackLink::new())).unwrap();
		assert_eq!(root.id(), "graph");
		assert!(Arc::ptr_eq(&root, &stack.current_root()));

		stack
			.execute(&SelectFeedbackCommand::new(vec!["n1".into()], vec![]))
			.unwrap();
		assert!(stack.current_root().element("n1").unwrap().is_selected());
		assert!(!root.element("n1").unwrap().is_selected());

		assert_eq!(
			*events.lock(),
			vec![(kinds::SET_MODEL.to_string(), true), (kinds::SELECT_FEEDBACK.to_string(), false)]
		);
	}

	#[test]
	fn failed_command_leaves_root_untouched() {
		let stack = CommandStack::new(graph());
		let events = Arc::new(Mutex::new(0usize));
		let _sub = {
			let events = Arc::clone(&events);
			stack.subscribe(move |_| *events.lock() += 1)
		};

		let before = stack.current_root();
		assert!(stack.execute(&Failing).is_err());
		assert!(Arc::ptr_eq(&before, &stack.current_root()));
		assert!(stack.current_root().css_classes().is_empty());
		assert_eq!(*events.lock(), 0);
	}

	#[test]
	fn undo_and_redo_are_inert() {
		let stack = CommandStack::new(graph());
		let before = stack.current_root();
		assert!(Arc::ptr_eq(&before, &stack.undo()));
		assert!(Arc::ptr_eq(&before, &stack.redo()));
	}

	#[test]
	fn dropped_subscription_stops_events() {
		let stack = CommandStack::default();
		let events = Arc::new(Mutex::new(0usize));
		let sub = {
			let events = Arc::clone(&events);
			stack.subscribe(move |_| *events.lock() += 1)
		};
		stack.execute(&SetModelCommand::new(graph(), FeedbackLink::new())).unwrap();
		drop(sub);
		stack.execute(&SetModelCommand::new(graph(), FeedbackLink::new())).unwrap();
		assert_eq!(*events.lock(), 1);
	}
}
