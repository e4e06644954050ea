use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use weft_dispatch::Result;
use weft_primitives::Action;

use crate::dispatcher::FeedbackActionDispatcher;

static NEXT_EMITTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a feedback source. Each call to [`EmitterId::new`] is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(u64);

impl EmitterId {
	#[allow(clippy::new_without_default)]
	pub fn new() -> Self {
		Self(NEXT_EMITTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for EmitterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "emitter#{}", self.0)
	}
}

/// Collects feedback actions with their cleanup counterparts under one emitter.
///
/// ```ignore
/// let mut emitter = feedback.create_emitter();
/// emitter.add(hover_on, Some(hover_off));
/// emitter.submit().await?;
/// // later
/// emitter.revert().await?;
/// ```
pub struct FeedbackEmitter {
	id: EmitterId,
	dispatcher: Arc<FeedbackActionDispatcher>,
	feedback: Vec<Action>,
	cleanup: Vec<Action>,
}

impl fmt::Debug for FeedbackEmitter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FeedbackEmitter")
			.field("id", &self.id)
			.field("feedback", &self.feedback.len())
			.field("cleanup", &self.cleanup.len())
			.finish()
	}
}

impl FeedbackEmitter {
	pub fn new(dispatcher: Arc<FeedbackActionDispatcher>) -> Self {
		Self {
			id: EmitterId::new(),
			dispatcher,
			feedback: Vec::new(),
			cleanup: Vec::new(),
		}
	}

	pub fn id(&self) -> EmitterId {
		self.id
	}

	/// Adds a feedback action and the action that undoes it.
	pub fn add(&mut self, feedback: Action, cleanup: Option<Action>) -> &mut Self {
		self.feedback.push(feedback);
		self.cleanup.extend(cleanup);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.feedback.is_empty() && self.cleanup.is_empty()
	}

	/// Registers the collected feedback, replacing what this emitter submitted before.
	pub async fn submit(&self) -> Result<()> {
		self.dispatcher.register_feedback(self.id, self.feedback.clone()).await
	}

	/// Deregisters the feedback and dispatches the cleanup actions.
	pub async fn revert(&self) -> Result<()> {
		self.dispatcher.deregister_feedback(self.id, self.cleanup.clone()).await
	}

	/// Reverts, then forgets every collected action.
	pub async fn dispose(&mut self) -> Result<()> {
		let result = self.revert().await;
		self.feedback.clear();
		self.cleanup.clear();
		result
	}
}
