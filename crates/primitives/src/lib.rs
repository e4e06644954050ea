//! Core types for the diagram client: actions, model snapshots, and listeners.

/// Action envelopes and the well-known payload variants.
pub mod action;
/// Async future aliases.
pub mod future;
/// Identifier helpers for requests.
pub mod ids;
/// Typed listener lists with scoped subscriptions.
pub mod listeners;
/// Transport envelope exchanged with the remote peer.
pub mod message;
/// Immutable model snapshots and geometry.
pub mod model;
/// Duration helpers.
pub mod time;

pub use action::{Action, ActionPayload, CustomAction, kinds};
pub use future::BoxFutureSend;
pub use ids::generate_request_id;
pub use listeners::{Disposable, Listeners, Subscription};
pub use message::ActionMessage;
pub use model::{Bounds, Dimension, EMPTY_ROOT_TYPE, ModelElement, ModelError, ModelRoot, Point};
pub use time::saturating_millis;
