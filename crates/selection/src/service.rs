//! The selection service.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::Mutex;
use weft_command::CommandStack;
use weft_dispatch::{ActionDispatcher, Result};
use weft_feedback::{EmitterId, FeedbackActionDispatcher};
use weft_primitives::{Action, Listeners, ModelRoot, Subscription};


/// Published whenever the selected set changes membership.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
	/// Root the selection was validated against.
	pub root: Arc<ModelRoot>,
	/// The full selection after the change, in selection order.
	pub selected: Vec<String>,
	/// Ids deselected by this change, explicitly or because they vanished.
	pub deselected: Vec<String>,
}

#[derive(Default)]
struct SelectionState {
	selected: IndexSet<String>,
	previous_root: Option<Arc<ModelRoot>>,
}

/// Authoritative, insertion-ordered selection.
///
/// Every id in the set resolves to a selectable element of the root passed to
/// the most recent update.
pub struct SelectionService {
	feedback: Arc<FeedbackActionDispatcher>,
	emitter: EmitterId,
	state: Mutex<SelectionState>,
	listeners: Listeners<SelectionChange>,
}

impl std::fmt::Debug for SelectionService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SelectionService")
			.field("emitter", &self.emitter)
			.field("selected", &self.selected_element_ids())
			.finish()
	}
}

impl SelectionService {
	pub fn new(feedback: Arc<FeedbackActionDispatcher>) -> Self {
		Self {
			feedback,
			emitter: EmitterId::new(),
			state: Mutex::new(SelectionState::default()),
			listeners: Listeners::new(),
		}
	}

	/// The single emitter selection feedback is registered under.
	pub fn emitter_id(&self) -> EmitterId {
		self.emitter
	}

	/// Applies select/deselect instructions and reconciles against `root`.
	///
	/// An id present in both lists is left as it was. Re-selecting keeps an
	/// id's original position. Ids that do not resolve to a selectable element
	/// of `root` are dropped, and reported as deselected when the previous
	/// root knew them. Returns true when membership changed, in which case one
	/// feedback action is registered and listeners are notified once.
	pub async fn update_selection(&self, root: Arc<ModelRoot>, select: &[String], deselect: &[String]) -> Result<bool> {
		let Some(change) = self.reconcile(&root, select, deselect) else {
			return Ok(false);
		};

		tracing::debug!(
			selected = change.selected.len(),
			deselected = change.deselected.len(),
			"selection.changed"
		);
		let feedback = Action::select_feedback(change.selected.clone(), change.deselected.clone());
		let registered = self.feedback.register_feedback(self.emitter, vec![feedback]).await;
		if let Err(err) = &registered {
			tracing::warn!(error = %err, "selection.feedback_failed");
		}
		self.listeners.emit(&change);
		registered.map(|()| true)
	}

	/// Re-validates the selection against a new root without selecting anything.
	pub async fn model_root_changed(&self, root: Arc<ModelRoot>) -> Result<bool> {
		self.update_selection(root, &[], &[]).await
	}

	/// Synchronous form of [`model_root_changed`](Self::model_root_changed).
	///
	/// Stores the refreshed feedback without dispatching it and notifies
	/// listeners. Returns the feedback action the caller still has to
	/// dispatch, or `None` when membership did not change.
	pub fn revalidate(&self, root: Arc<ModelRoot>) -> Option<Action> {
		let change = self.reconcile(&root, &[], &[])?;
		tracing::debug!(
			selected = change.selected.len(),
			deselected = change.deselected.len(),
			"selection.revalidated"
		);
		let feedback = Action::select_feedback(change.selected.clone(), change.deselected.clone());
		self.feedback.store_feedback(self.emitter, vec![feedback.clone()]);
		self.listeners.emit(&change);
		Some(feedback)
	}

	/// Re-validates the selection whenever a command on `stack` replaces the root.
	///
	/// The check runs inside the stack's event emission, so the set never
	/// names elements of a replaced root, whoever executed the command. The
	/// refreshed feedback is queued on `dispatcher` and runs once the dispatch
	/// in flight settles; when the stack was driven directly, a flush is
	/// spawned on the current runtime.
	pub fn track(self: &Arc<Self>, stack: &CommandStack, dispatcher: &ActionDispatcher) -> Subscription {
		let selection = Arc::clone(self);
		let dispatcher = dispatcher.downgrade();
		stack.subscribe(move |event| {
			if !event.model_root_changed {
				return;
			}
			let Some(feedback) = selection.revalidate(Arc::clone(&event.root)) else {
				return;
			};
			let Some(dispatcher) = dispatcher.upgrade() else {
				return;
			};
			dispatcher.enqueue(vec![feedback]);
			if !dispatcher.is_dispatching()
				&& let Ok(runtime) = tokio::runtime::Handle::try_current()
			{
				runtime.spawn(async move { dispatcher.flush().await });
			}
		})
	}

	fn reconcile(&self, root: &Arc<ModelRoot>, select: &[String], deselect: &[String]) -> Option<SelectionChange> {
		let mut state = self.state.lock();
		let before = state.selected.clone();

		let to_select: IndexSet<&String> = select.iter().filter(|id| !deselect.contains(*id)).collect();
		let to_deselect: IndexSet<&String> = deselect
			.iter()
			.filter(|id| !select.contains(*id) && state.selected.contains(id.as_str()))
			.collect();

		let mut deselected: IndexSet<String> = IndexSet::new();
		for id in to_deselect {
			state.selected.shift_remove(id.as_str());
			deselected.insert(id.clone());
		}
		for id in to_select {
			state.selected.insert(id.clone());
		}

		let previous = state.previous_root.replace(Arc::clone(root));
		let dangling: Vec<String> = state
			.selected
			.iter()
			.filter(|id| !root.is_selectable(id))
			.cloned()
			.collect();
		for id in dangling {
			state.selected.shift_remove(&id);
			if previous.as_ref().is_some_and(|prev| prev.contains(&id)) {
				deselected.insert(id);
			}
		}

		let changed = before.len() != state.selected.len() || !before.iter().all(|id| state.selected.contains(id));
		if !changed {
			return None;
		}
		Some(SelectionChange {
			root: Arc::clone(root),
			selected: state.selected.iter().cloned().collect(),
			deselected: deselected.into_iter().collect(),
		})
	}

	/// Subscribes to selection changes.
	pub fn subscribe(&self, listener: impl Fn(&SelectionChange) + Send + Sync + 'static) -> Subscription {
		self.listeners.subscribe(listener)
	}

	/// Selected ids in selection order.
	pub fn selected_element_ids(&self) -> Vec<String> {
		self.state.lock().selected.iter().cloned().collect()
	}

	pub fn is_selected(&self, id: &str) -> bool {
		self.state.lock().selected.contains(id)
	}

	pub fn has_selected_elements(&self) -> bool {
		!self.state.lock().selected.is_empty()
	}

	pub fn is_single_selection(&self) -> bool {
		self.state.lock().selected.len() == 1
	}

	pub fn is_multi_selection(&self) -> bool {
		self.state.lock().selected.len() > 1
	}
}
