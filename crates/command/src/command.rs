use crate::context::CommandExecutionContext;
use crate::error::Result;

/// A single model transformation.
///
/// Commands operate on the context's working copy of the root; the stack
/// publishes the result only when `execute` succeeds.
pub trait Command: Send + Sync {
	/// Kind of the action this command was built from.
	fn kind(&self) -> &str;

	/// Applies the command to `ctx`.
	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()>;
}
