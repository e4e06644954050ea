//! Command execution for the weft client core.
//!
//! Actions that change the diagram are turned into [`Command`]s by a
//! [`CommandRegistry`] and executed on the [`CommandStack`], which owns the
//! current [`ModelRoot`](weft_primitives::ModelRoot) snapshot and publishes a
//! [`CommandExecuted`] event after every command.
//!
//! The stack is forward-only: undo and redo are accepted but do nothing.

pub mod builtin;
pub mod command;
pub mod context;
pub mod error;
pub mod feedback;
pub mod handler;
pub mod registry;
pub mod stack;

pub use builtin::{
	InitializeCanvasBoundsCommand, MARQUEE_ELEMENT_ID, MARQUEE_ELEMENT_TYPE, MarqueeFeedbackCommand,
	ModifyCssFeedbackCommand, SelectFeedbackCommand, SetModelCommand, UpdateModelCommand,
};
pub use command::Command;
pub use context::CommandExecutionContext;
pub use error::{CommandError, Result};
pub use feedback::{FeedbackApplier, FeedbackLink};
pub use handler::{CommandActionHandler, register_command_handlers};
pub use registry::{CommandFactory, CommandRegistry};
pub use stack::{CommandExecuted, CommandStack};
