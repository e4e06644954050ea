//! Action handler trait and closure adapter.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use weft_primitives::Action;

use crate::error::HandlerError;

/// Result of handling one action: an optional follow-up action to dispatch.
pub type HandlerResult = Result<Option<Action>, HandlerError>;

/// Handles actions of the kinds it is registered for.
///
/// Handlers for the same kind run sequentially in registration order; the
/// dispatcher awaits each before starting the next. A returned action is
/// dispatched right after the handler returns.
#[async_trait]
pub trait ActionHandler: Send + Sync {
	/// Handles one action.
	async fn handle(&self, action: &Action) -> HandlerResult;

	/// Name used in diagnostics.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}
}

struct FnHandler<F> {
	name: String,
	f: F,
}

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
	F: Fn(Action) -> Fut + Send + Sync,
	Fut: Future<Output = HandlerResult> + Send + 'static,
{
	async fn handle(&self, action: &Action) -> HandlerResult {
		(self.f)(action.clone()).await
	}

	fn name(&self) -> &str {
		&self.name
	}
}

/// Wraps an async closure as a handler.
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn ActionHandler>
where
	F: Fn(Action) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = HandlerResult> + Send + 'static,
{
	Arc::new(FnHandler { name: name.into(), f })
}
