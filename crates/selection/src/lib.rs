//! Selection reconciliation.
//!
//! [`SelectionService`] owns the selected-id set, keeps it consistent with the
//! current model root, and reports every membership change as one
//! `selectFeedback` action plus one listener notification.
//! [`SelectionActionHandler`] routes select actions into the service, and
//! [`SelectionService::track`] re-validates the set whenever a command
//! replaces the model root.

pub mod handler;
pub mod service;

pub use handler::SelectionActionHandler;
pub use service::{SelectionChange, SelectionService};
