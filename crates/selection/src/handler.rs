//! Routes select actions into the selection service.

use std::sync::Arc;

use async_trait::async_trait;
use weft_command::CommandStack;
use weft_dispatch::{ActionHandler, ActionHandlerRegistry, HandlerResult};
use weft_primitives::{Action, ActionPayload, kinds};

use crate::service::SelectionService;

/// Handles `elementSelected` and `allSelected` against the current root.
///
/// Model replacements are picked up by [`SelectionService::track`], not here.
#[derive(Debug, Clone)]
pub struct SelectionActionHandler {
	selection: Arc<SelectionService>,
	stack: Arc<CommandStack>,
}

impl SelectionActionHandler {
	/// Kinds this handler is registered for by [`register`](Self::register).
	pub const KINDS: &'static [&'static str] = &[kinds::SELECT, kinds::SELECT_ALL];

	pub fn new(selection: Arc<SelectionService>, stack: Arc<CommandStack>) -> Self {
		Self { selection, stack }
	}

	/// Registers one shared handler for [`KINDS`](Self::KINDS).
	pub fn register(self, actions: &ActionHandlerRegistry) {
		actions.register_many(Self::KINDS, Arc::new(self));
	}
}

#[async_trait]
impl ActionHandler for SelectionActionHandler {
	async fn handle(&self, action: &Action) -> HandlerResult {
		let root = self.stack.current_root();
		match action.payload() {
			ActionPayload::Select {
				selected_elements_ids,
				deselected_elements_ids,
				deselect_all,
			} => {
				let mut deselect = deselected_elements_ids.clone();
				if *deselect_all {
					deselect.extend(self.selection.selected_element_ids());
				}
				self.selection.update_selection(root, selected_elements_ids, &deselect).await?;
			}
			ActionPayload::SelectAll { select: true } => {
				let all = root.selectable_ids();
				self.selection.update_selection(root, &all, &[]).await?;
			}
			ActionPayload::SelectAll { select: false } => {
				let current = self.selection.selected_element_ids();
				self.selection.update_selection(root, &[], &current).await?;
			}
			_ => tracing::trace!(kind = action.kind(), "selection.ignored"),
		}
		Ok(None)
	}

	fn name(&self) -> &str {
		"selection"
	}
}
