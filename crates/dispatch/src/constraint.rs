//! Model initialization constraint.
//!
//! A one-way `Uninitialized -> Completed` state machine fed with every
//! successfully dispatched action. Once completed, further notifications are
//! ignored without consulting the policy.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use weft_primitives::{Action, ActionPayload, Disposable};

/// Decides from the observed action sequence when the diagram is ready.
pub trait InitializationPolicy: Send {
	/// Observes one action; returns true once the diagram counts as initialized.
	fn is_initialized_after(&mut self, action: &Action) -> bool;
}

/// Ready once a non-empty model has been set or updated and the canvas
/// bounds are initialized afterwards.
///
/// Canvas bounds seen before any non-empty model are ignored.
#[derive(Debug, Default)]
pub struct DefaultInitializationPolicy {
	seen_non_empty_model: bool,
}

impl InitializationPolicy for DefaultInitializationPolicy {
	fn is_initialized_after(&mut self, action: &Action) -> bool {
		match action.payload() {
			ActionPayload::SetModel { new_root } | ActionPayload::UpdateModel { new_root, .. } => {
				if !new_root.is_empty_model() {
					self.seen_non_empty_model = true;
				}
				false
			}
			ActionPayload::InitializeCanvasBounds { .. } => self.seen_non_empty_model,
			_ => false,
		}
	}
}

type Callback = Box<dyn FnOnce() + Send>;

struct ConstraintState {
	completed: bool,
	policy: Box<dyn InitializationPolicy>,
	next_callback_id: u64,
	callbacks: Vec<(u64, Callback)>,
}

struct ConstraintInner {
	state: Mutex<ConstraintState>,
	completed_tx: watch::Sender<bool>,
}

/// Shared handle to the initialization state machine.
#[derive(Clone)]
pub struct ModelInitializationConstraint {
	inner: Arc<ConstraintInner>,
}

impl Default for ModelInitializationConstraint {
	fn default() -> Self {
		Self::new(DefaultInitializationPolicy::default())
	}
}

impl std::fmt::Debug for ModelInitializationConstraint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModelInitializationConstraint")
			.field("completed", &self.is_completed())
			.finish()
	}
}

impl ModelInitializationConstraint {
	/// Creates a constraint driven by `policy`.
	pub fn new(policy: impl InitializationPolicy + 'static) -> Self {
		let (completed_tx, _) = watch::channel(false);
		Self {
			inner: Arc::new(ConstraintInner {
				state: Mutex::new(ConstraintState {
					completed: false,
					policy: Box::new(policy),
					next_callback_id: 0,
					callbacks: Vec::new(),
				}),
				completed_tx,
			}),
		}
	}

	/// Returns true once the completion transition happened.
	pub fn is_completed(&self) -> bool {
		self.inner.state.lock().completed
	}

	/// Feeds one dispatched action to the policy. No-op after completion.
	pub fn notify_dispatched(&self, action: &Action) {
		let callbacks = {
			let mut state = self.inner.state.lock();
			if state.completed || !state.policy.is_initialized_after(action) {
				return;
			}
			state.completed = true;
			std::mem::take(&mut state.callbacks)
		};
		self.finish(callbacks, action.kind());
	}

	/// Forces the completion transition regardless of the policy.
	pub fn mark_completed(&self) {
		let callbacks = {
			let mut state = self.inner.state.lock();
			if state.completed {
				return;
			}
			state.completed = true;
			std::mem::take(&mut state.callbacks)
		};
		self.finish(callbacks, "explicit");
	}

	fn finish(&self, callbacks: Vec<(u64, Callback)>, trigger: &str) {
		self.inner.completed_tx.send_replace(true);
		tracing::debug!(trigger, callbacks = callbacks.len(), "model.initialized");
		for (_, callback) in callbacks {
			callback();
		}
	}

	/// Resolves once the diagram is initialized; immediately when already completed.
	pub async fn on_initialized(&self) {
		let mut rx = self.inner.completed_tx.subscribe();
		let _ = rx.wait_for(|completed| *completed).await;
	}

	/// Runs `callback` exactly once at completion, or right away if already completed.
	///
	/// Disposing the returned handle before completion cancels the callback.
	pub fn on_initialized_with(&self, callback: impl FnOnce() + Send + 'static) -> Disposable {
		let id = {
			let mut state = self.inner.state.lock();
			if !state.completed {
				let id = state.next_callback_id;
				state.next_callback_id += 1;
				state.callbacks.push((id, Box::new(callback)));
				Some(id)
			} else {
				drop(state);
				callback();
				None
			}
		};
		let Some(id) = id else {
			return Disposable::noop();
		};
		let weak: Weak<ConstraintInner> = Arc::downgrade(&self.inner);
		Disposable::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.state.lock().callbacks.retain(|(cb_id, _)| *cb_id != id);
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use weft_primitives::{Bounds, ModelElement, ModelRoot};

	use super::*;

	fn non_empty_root() -> ModelRoot {
		ModelRoot::new("graph", "graph").with_element(ModelElement::new("n1", "node")).unwrap()
	}

	fn bounds() -> Action {
		Action::initialize_canvas_bounds(Bounds::new(0.0, 0.0, 800.0, 600.0))
	}

	#[test]
	fn completes_after_model_then_bounds() {
		let constraint = ModelInitializationConstraint::default();
		constraint.notify_dispatched(&Action::set_model(non_empty_root()));
		assert!(!constraint.is_completed());
		constraint.notify_dispatched(&bounds());
		assert!(constraint.is_completed());
	}

	#[test]
	fn update_model_also_counts() {
		let constraint = ModelInitializationConstraint::default();
		constraint.notify_dispatched(&Action::update_model(non_empty_root()));
		constraint.notify_dispatched(&bounds());
		assert!(constraint.is_completed());
	}

	#[test]
	fn bounds_before_model_are_ignored() {
		let constraint = ModelInitializationConstraint::default();
		constraint.notify_dispatched(&bounds());
		constraint.notify_dispatched(&Action::set_model(non_empty_root()));
		assert!(!constraint.is_completed());
		constraint.notify_dispatched(&bounds());
		assert!(constraint.is_completed());
	}

	#[test]
	fn empty_model_does_not_count() {
		let constraint = ModelInitializationConstraint::default();
		constraint.notify_dispatched(&Action::set_model(ModelRoot::empty()));
		constraint.notify_dispatched(&bounds());
		assert!(!constraint.is_completed());
	}

	struct CountingPolicy(Arc<AtomicUsize>);

	impl InitializationPolicy for CountingPolicy {
		fn is_initialized_after(&mut self, _action: &Action) -> bool {
			self.0.fetch_add(1, Ordering::SeqCst);
			true
		}
	}

	#[test]
	fn policy_is_skipped_after_completion() {
		let calls = Arc::new(AtomicUsize::new(0));
		let constraint = ModelInitializationConstraint::new(CountingPolicy(Arc::clone(&calls)));
		constraint.notify_dispatched(&Action::custom("a"));
		constraint.notify_dispatched(&Action::custom("b"));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn callbacks_fire_once_in_registration_order() {
		let constraint = ModelInitializationConstraint::default();
		let order = Arc::new(Mutex::new(Vec::new()));
		for i in 0..3 {
			let order = Arc::clone(&order);
			let _ = constraint.on_initialized_with(move || order.lock().push(i));
		}
		constraint.mark_completed();
		constraint.mark_completed();
		assert_eq!(*order.lock(), vec![0, 1, 2]);
	}

	#[test]
	fn callback_after_completion_runs_immediately() {
		let constraint = ModelInitializationConstraint::default();
		constraint.mark_completed();
		let hits = Arc::new(AtomicUsize::new(0));
		let hits2 = Arc::clone(&hits);
		let _ = constraint.on_initialized_with(move || {
			hits2.fetch_add(1, Ordering::SeqCst);
		});
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn disposed_callback_never_fires() {
		let constraint = ModelInitializationConstraint::default();
		let hits = Arc::new(AtomicUsize::new(0));
		let hits2 = Arc::clone(&hits);
		let mut disposable = constraint.on_initialized_with(move || {
			hits2.fetch_add(1, Ordering::SeqCst);
		});
		disposable.dispose();
		constraint.mark_completed();
		assert_eq!(hits.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn on_initialized_resolves_at_completion() {
		let constraint = ModelInitializationConstraint::default();
		let waiter = {
			let constraint = constraint.clone();
			tokio::spawn(async move { constraint.on_initialized().await })
		};
		tokio::task::yield_now().await;
		assert!(!waiter.is_finished());

		constraint.notify_dispatched(&Action::set_model(non_empty_root()));
		constraint.notify_dispatched(&bounds());
		waiter.await.unwrap();

		// Already completed: resolves without waiting.
		constraint.on_initialized().await;
	}
}
