//! Action-kind to command-factory registry.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;
use weft_primitives::{Action, kinds};

use crate::builtin::{
	InitializeCanvasBoundsCommand, MarqueeFeedbackCommand, ModifyCssFeedbackCommand, SelectFeedbackCommand,
	SetModelCommand, UpdateModelCommand,
};
use crate::command::Command;
use crate::error::{CommandError, Result};
use crate::feedback::FeedbackLink;

/// Builds a command from an action of the kind it is registered for.
pub type CommandFactory = Arc<dyn Fn(&Action) -> Result<Box<dyn Command>> + Send + Sync>;

type FactoryMap = HashMap<Box<str>, CommandFactory>;

fn boxed<C: Command + 'static>(command: C) -> Box<dyn Command> {
	Box::new(command)
}

/// Maps action kinds to command factories. One factory per kind.
pub struct CommandRegistry {
	snap: ArcSwap<FactoryMap>,
}

impl Default for CommandRegistry {
	fn default() -> Self {
		Self {
			snap: ArcSwap::from_pointee(FactoryMap::default()),
		}
	}
}

impl std::fmt::Debug for CommandRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CommandRegistry").field("kinds", &self.kinds()).finish()
	}
}

impl CommandRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry preloaded with the model, canvas, and feedback commands.
	///
	/// Model commands re-apply feedback through `feedback`.
	pub fn with_builtins(feedback: FeedbackLink) -> Self {
		let registry = Self::new();
		let set_link = feedback.clone();
		registry.register(kinds::SET_MODEL, move |action| {
			SetModelCommand::from_action(action, set_link.clone()).map(boxed)
		});
		registry.register(kinds::UPDATE_MODEL, move |action| {
			UpdateModelCommand::from_action(action, feedback.clone()).map(boxed)
		});
		registry.register(kinds::INITIALIZE_CANVAS_BOUNDS, |action| {
			InitializeCanvasBoundsCommand::from_action(action).map(boxed)
		});
		registry.register(kinds::SELECT_FEEDBACK, |action| SelectFeedbackCommand::from_action(action).map(boxed));
		registry.register(kinds::MODIFY_CSS_FEEDBACK, |action| {
			ModifyCssFeedbackCommand::from_action(action).map(boxed)
		});
		for kind in [kinds::DRAW_MARQUEE, kinds::REMOVE_MARQUEE] {
			registry.register(kind, |action| MarqueeFeedbackCommand::from_action(action).map(boxed));
		}
		registry
	}

	/// Registers `factory` for `kind`, replacing an earlier one.
	pub fn register<F>(&self, kind: &str, factory: F)
	where
		F: Fn(&Action) -> Result<Box<dyn Command>> + Send + Sync + 'static,
	{
		let factory: CommandFactory = Arc::new(factory);
		let replaced = self.snap.load().contains_key(kind);
		self.snap.rcu(|cur| {
			let mut next = FactoryMap::clone(cur);
			next.insert(kind.into(), Arc::clone(&factory));
			next
		});
		tracing::trace!(kind, replaced, "command.register");
	}

	/// Returns true when a factory exists for `kind`.
	pub fn contains(&self, kind: &str) -> bool {
		self.snap.load().contains_key(kind)
	}

	/// Registered kinds, sorted.
	pub fn kinds(&self) -> Vec<String> {
		let mut kinds: Vec<String> = self.snap.load().keys().map(|k| k.to_string()).collect();
		kinds.sort();
		kinds
	}

	/// Builds the command for `action`.
	pub fn create(&self, action: &Action) -> Result<Box<dyn Command>> {
		let factory = self
			.snap
			.load()
			.get(action.kind())
			.cloned()
			.ok_or_else(|| CommandError::UnknownKind(action.kind().to_string()))?;
		factory(action)
	}
}
