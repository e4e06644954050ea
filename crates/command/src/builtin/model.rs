use weft_primitives::{Action, ActionPayload, Bounds, ModelRoot, kinds};

use super::mismatch;
use crate::command::Command;
use crate::context::CommandExecutionContext;
use crate::error::Result;
use crate::feedback::FeedbackLink;

/// Replaces the model wholesale, then re-applies registered feedback.
#[derive(Debug)]
pub struct SetModelCommand {
	new_root: ModelRoot,
	feedback: FeedbackLink,
}

impl SetModelCommand {
	pub fn new(new_root: ModelRoot, feedback: FeedbackLink) -> Self {
		Self { new_root, feedback }
	}

	pub fn from_action(action: &Action, feedback: FeedbackLink) -> Result<Self> {
		match action.payload() {
			ActionPayload::SetModel { new_root } => Ok(Self::new(new_root.clone(), feedback)),
			_ => Err(mismatch(kinds::SET_MODEL, action)),
		}
	}
}

impl Command for SetModelCommand {
	fn kind(&self) -> &str {
		kinds::SET_MODEL
	}

	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		tracing::debug!(root = self.new_root.id(), root_type = self.new_root.root_type(), "command.set_model");
		ctx.replace_root(self.new_root.clone());
		self.feedback.apply(ctx)
	}
}

/// Replaces the model with a server update.
///
/// Canvas bounds measured for the previous root carry over when the update
/// does not bring its own.
#[derive(Debug)]
pub struct UpdateModelCommand {
	new_root: ModelRoot,
	animate: bool,
	feedback: FeedbackLink,
}

impl UpdateModelCommand {
	pub fn new(new_root: ModelRoot, animate: bool, feedback: FeedbackLink) -> Self {
		Self {
			new_root,
			animate,
			feedback,
		}
	}

	pub fn from_action(action: &Action, feedback: FeedbackLink) -> Result<Self> {
		match action.payload() {
			ActionPayload::UpdateModel { new_root, animate } => Ok(Self::new(new_root.clone(), *animate, feedback)),
			_ => Err(mismatch(kinds::UPDATE_MODEL, action)),
		}
	}
}

impl Command for UpdateModelCommand {
	fn kind(&self) -> &str {
		kinds::UPDATE_MODEL
	}

	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		tracing::debug!(
			root = self.new_root.id(),
			revision = ?self.new_root.revision(),
			animate = self.animate,
			"command.update_model"
		);
		let mut root = self.new_root.clone();
		if root.canvas_bounds().is_none()
			&& let Some(bounds) = ctx.root().canvas_bounds()
		{
			root.set_canvas_bounds(bounds);
		}
		ctx.replace_root(root);
		self.feedback.apply(ctx)
	}
}

/// Records the measured canvas bounds on the current root.
#[derive(Debug)]
pub struct InitializeCanvasBoundsCommand {
	bounds: Bounds,
}

impl InitializeCanvasBoundsCommand {
	pub fn new(bounds: Bounds) -> Self {
		Self { bounds }
	}

	pub fn from_action(action: &Action) -> Result<Self> {
		match action.payload() {
			ActionPayload::InitializeCanvasBounds { new_canvas_bounds } => Ok(Self::new(*new_canvas_bounds)),
			_ => Err(mismatch(kinds::INITIALIZE_CANVAS_BOUNDS, action)),
		}
	}
}

impl Command for InitializeCanvasBoundsCommand {
	fn kind(&self) -> &str {
		kinds::INITIALIZE_CANVAS_BOUNDS
	}

	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		ctx.root_mut().set_canvas_bounds(self.bounds);
		Ok(())
	}
}
