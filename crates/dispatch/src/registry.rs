//! Kind-to-handler registry.
//!
//! Lookups read an immutable snapshot published through [`ArcSwap`], so
//! dispatch never contends with registration. Registration clones the
//! snapshot, appends, and swaps it back in.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::handler::ActionHandler;

type HandlerMap = HashMap<Box<str>, Vec<Arc<dyn ActionHandler>>>;
type LazyRegistration = Box<dyn FnOnce(&ActionHandlerRegistry) + Send>;

/// Maps action kinds to ordered handler lists.
pub struct ActionHandlerRegistry {
	snap: ArcSwap<HandlerMap>,
	lazy: Mutex<Vec<LazyRegistration>>,
}

impl Default for ActionHandlerRegistry {
	fn default() -> Self {
		Self {
			snap: ArcSwap::from_pointee(HandlerMap::default()),
			lazy: Mutex::new(Vec::new()),
		}
	}
}

impl std::fmt::Debug for ActionHandlerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActionHandlerRegistry")
			.field("kinds", &self.snap.load().len())
			.field("lazy", &self.lazy.lock().len())
			.finish()
	}
}

impl ActionHandlerRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `handler` to the list for `kind`.
	pub fn register(&self, kind: &str, handler: Arc<dyn ActionHandler>) {
		tracing::trace!(kind, handler = handler.name(), "registry.register");
		self.snap.rcu(|cur| {
			let mut next = HandlerMap::clone(cur);
			next.entry(kind.into()).or_default().push(Arc::clone(&handler));
			next
		});
	}

	/// Registers one handler for several kinds.
	pub fn register_many(&self, kinds: &[&str], handler: Arc<dyn ActionHandler>) {
		for kind in kinds {
			self.register(kind, Arc::clone(&handler));
		}
	}

	/// Queues a registration to run on the next [`flush_lazy`](Self::flush_lazy).
	pub fn register_lazy(&self, registration: impl FnOnce(&ActionHandlerRegistry) + Send + 'static) {
		self.lazy.lock().push(Box::new(registration));
	}

	/// Runs queued lazy registrations in queue order. Returns how many ran.
	pub fn flush_lazy(&self) -> usize {
		let queued = std::mem::take(&mut *self.lazy.lock());
		let count = queued.len();
		for registration in queued {
			registration(self);
		}
		count
	}

	/// Handlers for `kind` in registration order. Empty for unknown kinds.
	pub fn handlers(&self, kind: &str) -> Vec<Arc<dyn ActionHandler>> {
		self.snap.load().get(kind).cloned().unwrap_or_default()
	}

	/// Returns true when at least one handler is registered for `kind`.
	pub fn has_handlers(&self, kind: &str) -> bool {
		self.snap.load().get(kind).is_some_and(|list| !list.is_empty())
	}

	/// Every kind with at least one handler, sorted.
	pub fn kinds(&self) -> Vec<String> {
		let mut kinds: Vec<String> = self.snap.load().keys().map(|k| k.to_string()).collect();
		kinds.sort();
		kinds
	}
}
