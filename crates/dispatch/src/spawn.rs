use std::future::Future;

use tokio::task::JoinHandle;

/// Spawns a detached task on the current runtime with a diagnostic label.
pub(crate) fn spawn_detached<F>(label: &'static str, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(task = label, "dispatch.spawn");
	tokio::spawn(fut)
}
