//! Late-bound access to the feedback dispatcher.
//!
//! Model commands must re-apply transient feedback to every fresh root, but
//! the feedback dispatcher itself builds commands through the registry that
//! owns those model commands. [`FeedbackLink`] breaks the cycle: factories
//! capture the link at construction and the composition root binds the
//! dispatcher once it exists. The link holds only a weak reference.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::context::CommandExecutionContext;
use crate::error::Result;

/// Re-applies registered feedback onto a freshly swapped-in root.
pub trait FeedbackApplier: Send + Sync {
	/// Executes every registered feedback action against `ctx`.
	fn apply_feedback_commands(&self, ctx: &mut CommandExecutionContext) -> Result<()>;
}

/// Shared, late-bound slot for a [`FeedbackApplier`].
#[derive(Clone, Default)]
pub struct FeedbackLink {
	slot: Arc<RwLock<Option<Weak<dyn FeedbackApplier>>>>,
}

impl std::fmt::Debug for FeedbackLink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FeedbackLink").field("bound", &self.is_bound()).finish()
	}
}

impl FeedbackLink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds `applier`, replacing any previous binding.
	pub fn bind(&self, applier: &Arc<dyn FeedbackApplier>) {
		*self.slot.write() = Some(Arc::downgrade(applier));
	}

	/// Returns true while a live applier is bound.
	pub fn is_bound(&self) -> bool {
		self.slot.read().as_ref().is_some_and(|weak| weak.strong_count() > 0)
	}

	/// Applies feedback through the bound applier. No-op when unbound.
	pub fn apply(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		let applier = self.slot.read().as_ref().and_then(Weak::upgrade);
		match applier {
			Some(applier) => applier.apply_feedback_commands(ctx),
			None => {
				tracing::trace!("feedback.unbound");
				Ok(())
			}
		}
	}
}
