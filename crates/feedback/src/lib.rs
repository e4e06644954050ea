//! Feedback reconciliation.
//!
//! Transient visual feedback (selection highlights, cursor classes, the
//! marquee) lives in the model root, which the server replaces wholesale.
//! [`FeedbackActionDispatcher`] remembers the latest feedback actions per
//! [`EmitterId`] and re-executes them as commands whenever a model command
//! swaps in a new root.

pub mod dispatcher;
pub mod emitter;

pub use dispatcher::FeedbackActionDispatcher;
pub use emitter::{EmitterId, FeedbackEmitter};
