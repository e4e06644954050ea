//! Typed publish/subscribe lists.
//!
//! [`Listeners`] replaces manual subscribe/dispose bookkeeping: every
//! subscription hands back a [`Subscription`] guard that unsubscribes on drop.
//! Emission snapshots the callback list first, so callbacks may subscribe or
//! unsubscribe re-entrantly without deadlocking.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slots<T> {
	next_id: u64,
	entries: Vec<(u64, Callback<T>)>,
}

/// Ordered list of listeners for events of type `T`.
pub struct Listeners<T> {
	slots: Arc<Mutex<Slots<T>>>,
}

impl<T> Clone for Listeners<T> {
	fn clone(&self) -> Self {
		Self {
			slots: Arc::clone(&self.slots),
		}
	}
}

impl<T> Default for Listeners<T> {
	fn default() -> Self {
		Self {
			slots: Arc::new(Mutex::new(Slots {
				next_id: 0,
				entries: Vec::new(),
			})),
		}
	}
}

impl<T: 'static> fmt::Debug for Listeners<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Listeners").field("len", &self.len()).finish()
	}
}

impl<T: 'static> Listeners<T> {
	/// Creates an empty listener list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a callback, returning a guard that removes it when dropped.
	pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		let id = {
			let mut slots = self.slots.lock();
			let id = slots.next_id;
			slots.next_id += 1;
			slots.entries.push((id, Arc::new(callback)));
			id
		};
		let weak: Weak<Mutex<Slots<T>>> = Arc::downgrade(&self.slots);
		Subscription::new(move || {
			if let Some(slots) = weak.upgrade() {
				slots.lock().entries.retain(|(entry_id, _)| *entry_id != id);
			}
		})
	}

	/// Invokes every registered callback in subscription order.
	pub fn emit(&self, event: &T) {
		let snapshot: Vec<Callback<T>> = self.slots.lock().entries.iter().map(|(_, cb)| Arc::clone(cb)).collect();
		for callback in snapshot {
			callback(event);
		}
	}

	/// Returns the number of live subscriptions.
	pub fn len(&self) -> usize {
		self.slots.lock().entries.len()
	}

	/// Returns true when nobody is subscribed.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Scoped subscription guard. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
	unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
	fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
		Self {
			unsubscribe: Some(Box::new(unsubscribe)),
		}
	}

	/// Keeps the listener registered for the lifetime of the source.
	pub fn detach(mut self) {
		self.unsubscribe = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(unsubscribe) = self.unsubscribe.take() {
			unsubscribe();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("active", &self.unsubscribe.is_some()).finish()
	}
}

/// Explicitly triggered cancellation handle.
///
/// Unlike [`Subscription`], dropping a `Disposable` has no effect; only
/// [`Disposable::dispose`] runs the cancellation.
pub struct Disposable {
	action: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Disposable {
	/// Wraps a cancellation closure.
	pub fn new(action: impl FnOnce() + Send + Sync + 'static) -> Self {
		Self {
			action: Some(Box::new(action)),
		}
	}

	/// A disposable that does nothing.
	pub fn noop() -> Self {
		Self { action: None }
	}

	/// Runs the cancellation. Subsequent calls are no-ops.
	pub fn dispose(&mut self) {
		if let Some(action) = self.action.take() {
			action();
		}
	}
}

impl fmt::Debug for Disposable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Disposable").field("pending", &self.action.is_some()).finish()
	}
}
