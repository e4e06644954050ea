//! Built-in commands for the recognized model and feedback action kinds.

mod feedback;
mod model;

pub use feedback::{
	MARQUEE_ELEMENT_ID, MARQUEE_ELEMENT_TYPE, MarqueeFeedbackCommand, ModifyCssFeedbackCommand, SelectFeedbackCommand,
};
pub use model::{InitializeCanvasBoundsCommand, SetModelCommand, UpdateModelCommand};

use weft_primitives::Action;

use crate::error::CommandError;

fn mismatch(expected: &'static str, action: &Action) -> CommandError {
	CommandError::PayloadMismatch {
		expected,
		actual: action.kind().to_string(),
	}
}

#[cfg(test)]
mod tests;
