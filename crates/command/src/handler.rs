//! Adapter from dispatched actions to command executions.

use std::sync::Arc;

use async_trait::async_trait;
use weft_dispatch::{ActionHandler, ActionHandlerRegistry, HandlerError, HandlerResult};
use weft_primitives::Action;

use crate::registry::CommandRegistry;
use crate::stack::CommandStack;

/// Builds a command for each handled action and executes it on the stack.
#[derive(Debug, Clone)]
pub struct CommandActionHandler {
	commands: Arc<CommandRegistry>,
	stack: Arc<CommandStack>,
}

impl CommandActionHandler {
	pub fn new(commands: Arc<CommandRegistry>, stack: Arc<CommandStack>) -> Self {
		Self { commands, stack }
	}
}

#[async_trait]
impl ActionHandler for CommandActionHandler {
	async fn handle(&self, action: &Action) -> HandlerResult {
		let command = self.commands.create(action).map_err(|err| HandlerError::new(err.to_string()))?;
		self.stack
			.execute(command.as_ref())
			.map_err(|err| HandlerError::new(err.to_string()))?;
		Ok(None)
	}

	fn name(&self) -> &str {
		"command"
	}
}

/// Registers one shared [`CommandActionHandler`] for every kind in `commands`.
pub fn register_command_handlers(
	actions: &ActionHandlerRegistry,
	commands: &Arc<CommandRegistry>,
	stack: &Arc<CommandStack>,
) -> Arc<dyn ActionHandler> {
	let handler: Arc<dyn ActionHandler> = Arc::new(CommandActionHandler::new(Arc::clone(commands), Arc::clone(stack)));
	for kind in commands.kinds() {
		actions.register(&kind, Arc::clone(&handler));
	}
	handler
}
