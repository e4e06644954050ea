use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use weft_primitives::{Action, Bounds, ModelElement, ModelRoot};

use super::*;
use crate::error::HandlerError;
use crate::handler::{ActionHandler, handler_fn};

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn dispatcher() -> ActionDispatcher {
	init_tracing();
	ActionDispatcher::new(
		Arc::new(ActionHandlerRegistry::new()),
		ModelInitializationConstraint::default(),
		DispatcherConfig::default(),
	)
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log, label: &'static str) -> Arc<dyn ActionHandler> {
	let log = Arc::clone(log);
	handler_fn(label, move |action: Action| {
		let log = Arc::clone(&log);
		async move {
			log.lock().push(format!("{label}:{}", action.kind()));
			Ok(None)
		}
	})
}

/// Answers every request after `delay` with a `response` action.
fn delayed_responder(delay: Duration) -> Arc<dyn ActionHandler> {
	handler_fn("responder", move |action: Action| async move {
		tokio::time::sleep(delay).await;
		Ok(Some(Action::custom("response").with_response_id(action.request_id())))
	})
}

fn non_empty_root() -> ModelRoot {
	ModelRoot::new("graph", "graph").with_element(ModelElement::new("n1", "node")).unwrap()
}

fn bounds() -> Action {
	Action::initialize_canvas_bounds(Bounds::new(0.0, 0.0, 800.0, 600.0))
}

fn noop() -> Arc<dyn ActionHandler> {
	handler_fn("noop", |_action: Action| async { Ok(None) })
}

#[tokio::test(start_paused = true)]
async fn request_resolves_with_correlated_response() {
	let dispatcher = dispatcher();
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(15)));

	let action = Action::custom("request").with_request_id("");
	let response = dispatcher
		.request_until(action, Duration::from_millis(150), false)
		.await
		.unwrap()
		.expect("response before deadline");

	assert_eq!(response.kind(), "response");
	assert!(!response.response_id().is_empty());
	assert_eq!(dispatcher.pending_request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn request_keeps_explicit_request_id() {
	let dispatcher = dispatcher();
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(1)));

	let response = dispatcher.request(Action::custom("request").with_request_id("req-7")).await.unwrap();
	assert_eq!(response.response_id(), "req-7");
}

#[tokio::test(start_paused = true)]
async fn request_until_resolves_empty_on_timeout() {
	let dispatcher = dispatcher();
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(30)));

	let outcome = dispatcher
		.request_until(Action::custom("request"), Duration::from_millis(5), false)
		.await
		.unwrap();
	assert!(outcome.is_none());
	assert_eq!(dispatcher.pending_request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn request_until_rejects_on_timeout_when_asked() {
	let dispatcher = dispatcher();
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(30)));

	let err = dispatcher
		.request_until(Action::custom("request").with_request_id("slow"), Duration::from_millis(5), true)
		.await
		.unwrap_err();
	assert_eq!(
		err,
		DispatchError::Timeout {
			request_id: "slow".into(),
			timeout: Duration::from_millis(5),
		}
	);
	assert!(!dispatcher.has_pending_request("slow"));
}

#[tokio::test(start_paused = true)]
async fn late_response_reaches_ordinary_handlers() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(30)));
	let seen = Arc::new(Mutex::new(Vec::new()));
	{
		let seen = Arc::clone(&seen);
		dispatcher.registry().register(
			"response",
			handler_fn("late", move |action: Action| {
				let seen = Arc::clone(&seen);
				async move {
					seen.lock().push(action.response_id().to_string());
					Ok(None)
				}
			}),
		);
	}
	dispatcher.registry().register("response", recorder(&log, "log"));

	let outcome = dispatcher
		.request_until(Action::custom("request"), Duration::from_millis(5), false)
		.await
		.unwrap();
	assert!(outcome.is_none());

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(*seen.lock(), vec![String::new()]);
	assert_eq!(*log.lock(), vec!["log:response"]);
}

#[tokio::test(start_paused = true)]
async fn reject_response_fails_the_request() {
	let dispatcher = dispatcher();
	dispatcher.registry().register(
		"request",
		handler_fn("rejecter", |action: Action| async move { Ok(Some(Action::reject(&action, "nope"))) }),
	);

	let err = dispatcher.request(Action::custom("request").with_request_id("r1")).await.unwrap_err();
	assert_eq!(
		err,
		DispatchError::Rejected {
			request_id: "r1".into(),
			message: "nope".into(),
			detail: None,
		}
	);
}

#[tokio::test(start_paused = true)]
async fn failed_request_dispatch_clears_pending_entry() {
	let dispatcher = dispatcher();

	let err = dispatcher.request(Action::custom("unhandled").with_request_id("r2")).await.unwrap_err();
	assert_eq!(err, DispatchError::MissingHandler { kind: "unhandled".into() });
	assert!(!dispatcher.has_pending_request("r2"));
}

#[tokio::test(start_paused = true)]
async fn duplicate_pending_request_id_is_refused() {
	let dispatcher = dispatcher();
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(20)));

	let first = {
		let dispatcher = dispatcher.clone();
		tokio::spawn(async move { dispatcher.request(Action::custom("request").with_request_id("dup")).await })
	};
	tokio::task::yield_now().await;
	assert!(dispatcher.has_pending_request("dup"));

	let err = dispatcher.request(Action::custom("request").with_request_id("dup")).await.unwrap_err();
	assert_eq!(err, DispatchError::DuplicateRequest("dup".into()));
	assert_eq!(first.await.unwrap().unwrap().response_id(), "dup");
}

fn sleeper(log: &Log, label: &'static str, delay: Duration) -> Arc<dyn ActionHandler> {
	let log = Arc::clone(log);
	handler_fn(label, move |_action: Action| {
		let log = Arc::clone(&log);
		async move {
			log.lock().push(format!("{label}:start"));
			tokio::time::sleep(delay).await;
			log.lock().push(format!("{label}:end"));
			Ok(None)
		}
	})
}

#[tokio::test(start_paused = true)]
async fn handlers_run_sequentially_in_registration_order() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register("k", sleeper(&log, "1", Duration::from_millis(20)));
	dispatcher.registry().register("k", sleeper(&log, "2", Duration::from_millis(10)));

	let start = tokio::time::Instant::now();
	dispatcher.dispatch(Action::custom("k")).await.unwrap();
	assert_eq!(*log.lock(), vec!["1:start", "1:end", "2:start", "2:end"]);
	assert!(start.elapsed() >= Duration::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn missing_handler_fails_unless_optional() {
	let dispatcher = dispatcher();

	let err = dispatcher.dispatch(Action::custom("ghost")).await.unwrap_err();
	assert_eq!(err, DispatchError::MissingHandler { kind: "ghost".into() });

	dispatcher.dispatch(Action::custom("ghost").optional()).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn handler_failure_skips_later_handlers() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher
		.registry()
		.register("k", handler_fn("broken", |_action: Action| async { Err("boom".into()) }));
	dispatcher.registry().register("k", recorder(&log, "after"));

	let err = dispatcher.dispatch(Action::custom("k")).await.unwrap_err();
	assert_eq!(
		err,
		DispatchError::Handler {
			kind: "k".into(),
			source: HandlerError::new("boom"),
		}
	);
	assert!(log.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn follow_up_dispatches_before_next_handler() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register(
		"first",
		handler_fn("chain", |_action: Action| async { Ok(Some(Action::custom("second"))) }),
	);
	dispatcher.registry().register("first", recorder(&log, "tail"));
	dispatcher.registry().register("second", recorder(&log, "follow"));

	dispatcher.dispatch(Action::custom("first")).await.unwrap();
	assert_eq!(*log.lock(), vec!["follow:second", "tail:first"]);
}

#[tokio::test(start_paused = true)]
async fn failing_follow_up_does_not_fail_the_origin() {
	let dispatcher = dispatcher();
	dispatcher.registry().register(
		"first",
		handler_fn("chain", |_action: Action| async { Ok(Some(Action::custom("unhandled"))) }),
	);
	dispatcher.dispatch(Action::custom("first")).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dispatch_all_runs_in_order_and_reports_first_error() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register("a", recorder(&log, "h"));
	dispatcher.registry().register("c", recorder(&log, "h"));

	let err = dispatcher
		.dispatch_all(vec![Action::custom("a"), Action::custom("b"), Action::custom("c")])
		.await
		.unwrap_err();
	assert_eq!(err, DispatchError::MissingHandler { kind: "b".into() });
	assert_eq!(*log.lock(), vec!["h:a", "h:c"]);
}

#[tokio::test(start_paused = true)]
async fn initialize_runs_once_and_flushes_lazy_registrations() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	{
		let log = Arc::clone(&log);
		dispatcher
			.registry()
			.register_lazy(move |registry| registry.register(weft_primitives::kinds::SET_MODEL, recorder(&log, "model")));
	}

	tokio::join!(dispatcher.initialize(), dispatcher.initialize());
	dispatcher.initialize().await;

	assert!(dispatcher.is_initialized());
	assert_eq!(*log.lock(), vec!["model:setModel"]);
}

#[tokio::test(start_paused = true)]
async fn initialize_tolerates_missing_model_handler() {
	let dispatcher = dispatcher();
	dispatcher.initialize().await;
	assert!(dispatcher.is_initialized());
	assert!(!dispatcher.constraint().is_completed());
}

#[tokio::test(start_paused = true)]
async fn constraint_is_fed_only_after_initialize() {
	let dispatcher = dispatcher();
	dispatcher.registry().register_many(
		&[weft_primitives::kinds::SET_MODEL, weft_primitives::kinds::INITIALIZE_CANVAS_BOUNDS],
		noop(),
	);

	dispatcher.dispatch(Action::set_model(non_empty_root())).await.unwrap();
	dispatcher.dispatch(bounds()).await.unwrap();
	assert!(!dispatcher.constraint().is_completed());

	dispatcher.initialize().await;
	dispatcher.dispatch(Action::set_model(non_empty_root())).await.unwrap();
	dispatcher.dispatch(bounds()).await.unwrap();
	assert!(dispatcher.constraint().is_completed());
}

#[tokio::test(start_paused = true)]
async fn deferred_batches_release_in_fifo_order_at_initialization() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register_many(
		&[weft_primitives::kinds::SET_MODEL, weft_primitives::kinds::INITIALIZE_CANVAS_BOUNDS],
		noop(),
	);
	dispatcher.registry().register_many(&["one", "two", "three"], recorder(&log, "h"));
	dispatcher.initialize().await;

	dispatcher
		.dispatch_once_model_initialized(vec![Action::custom("one"), Action::custom("two")])
		.await
		.unwrap();
	dispatcher.dispatch_once_model_initialized(vec![Action::custom("three")]).await.unwrap();
	assert_eq!(dispatcher.queued_until_initialized(), 2);
	assert!(log.lock().is_empty());

	dispatcher.dispatch(Action::set_model(non_empty_root())).await.unwrap();
	assert!(log.lock().is_empty());
	dispatcher.dispatch(bounds()).await.unwrap();

	assert_eq!(*log.lock(), vec!["h:one", "h:two", "h:three"]);
	assert_eq!(dispatcher.queued_until_initialized(), 0);

	dispatcher.dispatch_once_model_initialized(vec![Action::custom("one")]).await.unwrap();
	assert_eq!(log.lock().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn deferred_batch_failure_is_logged_not_returned() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register_many(
		&[weft_primitives::kinds::SET_MODEL, weft_primitives::kinds::INITIALIZE_CANVAS_BOUNDS],
		noop(),
	);
	dispatcher.registry().register("after", recorder(&log, "h"));
	dispatcher.initialize().await;

	// Queued before initialization: the missing handler cannot be reported yet.
	dispatcher
		.dispatch_once_model_initialized(vec![Action::custom("ghost"), Action::custom("after")])
		.await
		.unwrap();

	dispatcher.dispatch(Action::set_model(non_empty_root())).await.unwrap();
	dispatcher.dispatch(bounds()).await.unwrap();
	assert_eq!(*log.lock(), vec!["h:after"]);

	// Once initialized the failure reaches the caller.
	let err = dispatcher
		.dispatch_once_model_initialized(vec![Action::custom("ghost")])
		.await
		.unwrap_err();
	assert_eq!(err, DispatchError::MissingHandler { kind: "ghost".into() });
}

#[tokio::test(start_paused = true)]
async fn enqueued_actions_run_when_the_dispatch_in_flight_settles() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register("queued", recorder(&log, "h"));
	{
		let queuer = dispatcher.clone();
		let log = Arc::clone(&log);
		dispatcher.registry().register(
			"outer",
			handler_fn("queuer", move |_action: Action| {
				let queuer = queuer.clone();
				let log = Arc::clone(&log);
				async move {
					assert!(queuer.is_dispatching());
					queuer.enqueue(vec![Action::custom("queued")]);
					log.lock().push("outer".into());
					Ok(None)
				}
			}),
		);
	}

	assert!(!dispatcher.is_dispatching());
	dispatcher.dispatch(Action::custom("outer")).await.unwrap();
	assert_eq!(*log.lock(), vec!["outer", "h:queued"]);
	assert!(!dispatcher.is_dispatching());

	dispatcher.enqueue(vec![Action::custom("queued")]);
	dispatcher.flush().await;
	assert_eq!(log.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn resolve_response_bypasses_handlers() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register("request", noop());
	dispatcher.registry().register("response", recorder(&log, "h"));

	let waiter = {
		let dispatcher = dispatcher.clone();
		tokio::spawn(async move { dispatcher.request(Action::custom("request").with_request_id("r1")).await })
	};
	tokio::time::sleep(Duration::from_millis(1)).await;
	assert!(dispatcher.has_pending_request("r1"));

	assert!(!dispatcher.resolve_response(&Action::custom("response")));
	assert!(dispatcher.resolve_response(&Action::custom("response").with_response_id("r1")));
	assert!(!dispatcher.resolve_response(&Action::custom("response").with_response_id("r1")));

	assert_eq!(waiter.await.unwrap().unwrap().response_id(), "r1");
	assert!(log.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn after_update_actions_wait_for_model_change() {
	let dispatcher = dispatcher();
	let log: Log = Arc::default();
	dispatcher.registry().register("later", recorder(&log, "h"));
	{
		let notifier = dispatcher.clone();
		dispatcher.registry().register(
			weft_primitives::kinds::UPDATE_MODEL,
			handler_fn("stack", move |_action: Action| {
				let notifier = notifier.clone();
				async move {
					notifier.handle_model_root_changed();
					Ok(None)
				}
			}),
		);
	}

	dispatcher.dispatch_after_next_update(vec![Action::custom("later")]);
	assert_eq!(dispatcher.queued_after_update(), 1);
	dispatcher.flush().await;
	assert!(log.lock().is_empty());

	dispatcher.dispatch(Action::update_model(non_empty_root())).await.unwrap();
	assert_eq!(*log.lock(), vec!["h:later"]);
	assert_eq!(dispatcher.queued_after_update(), 0);

	// Only one batch per model change.
	dispatcher.dispatch(Action::update_model(non_empty_root())).await.unwrap();
	assert_eq!(log.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timed_request_uses_configured_deadline() {
	init_tracing();
	let dispatcher = ActionDispatcher::new(
		Arc::new(ActionHandlerRegistry::new()),
		ModelInitializationConstraint::default(),
		DispatcherConfig {
			request_timeout: Duration::from_millis(10),
		},
	);
	dispatcher.registry().register("request", delayed_responder(Duration::from_millis(25)));

	let start = tokio::time::Instant::now();
	assert!(dispatcher.request_timed(Action::custom("request")).await.unwrap().is_none());
	assert!(start.elapsed() < Duration::from_millis(25));
}
