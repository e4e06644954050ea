//! Action dispatch core.
//!
//! This crate provides the single ingress/egress point for actions:
//! * [`ActionHandlerRegistry`]: kind-to-handlers lookup with lazy registration
//! * [`ModelInitializationConstraint`]: one-way "diagram is ready" state machine
//! * [`ActionDispatcher`]: handler invocation, request/response correlation,
//!   timeout-bounded requests, and deferred dispatch queues

#![warn(missing_docs)]

pub mod constraint;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod registry;
mod spawn;

pub use constraint::{DefaultInitializationPolicy, InitializationPolicy, ModelInitializationConstraint};
pub use dispatcher::{ActionDispatcher, DispatcherConfig, WeakActionDispatcher};
pub use error::{DispatchError, HandlerError, Result};
pub use handler::{ActionHandler, HandlerResult, handler_fn};
pub use registry::ActionHandlerRegistry;
