use weft_primitives::{Action, ActionPayload, Bounds, ModelElement, Point, kinds};

use super::mismatch;
use crate::command::Command;
use crate::context::CommandExecutionContext;
use crate::error::Result;

/// Id of the transient marquee element.
pub const MARQUEE_ELEMENT_ID: &str = "marquee";
/// Type of the transient marquee element.
pub const MARQUEE_ELEMENT_TYPE: &str = "marquee";

/// Sets the `selected` flag on the listed elements. Unknown ids are skipped.
#[derive(Debug, Clone)]
pub struct SelectFeedbackCommand {
	selected: Vec<String>,
	deselected: Vec<String>,
}

impl SelectFeedbackCommand {
	pub fn new(selected: Vec<String>, deselected: Vec<String>) -> Self {
		Self { selected, deselected }
	}

	pub fn from_action(action: &Action) -> Result<Self> {
		match action.payload() {
			ActionPayload::SelectFeedback {
				selected_elements_ids,
				deselected_elements_ids,
			} => Ok(Self::new(selected_elements_ids.clone(), deselected_elements_ids.clone())),
			_ => Err(mismatch(kinds::SELECT_FEEDBACK, action)),
		}
	}
}

impl Command for SelectFeedbackCommand {
	fn kind(&self) -> &str {
		kinds::SELECT_FEEDBACK
	}

	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		let root = ctx.root_mut();
		for (ids, selected) in [(&self.deselected, false), (&self.selected, true)] {
			for id in ids {
				if let Some(element) = root.element_mut(id) {
					element.set_selected(selected);
				}
			}
		}
		Ok(())
	}
}

/// Adds and removes CSS classes; with no element ids the root is targeted.
#[derive(Debug, Clone)]
pub struct ModifyCssFeedbackCommand {
	elements: Vec<String>,
	add: Vec<String>,
	remove: Vec<String>,
}

impl ModifyCssFeedbackCommand {
	pub fn new(elements: Vec<String>, add: Vec<String>, remove: Vec<String>) -> Self {
		Self { elements, add, remove }
	}

	pub fn from_action(action: &Action) -> Result<Self> {
		match action.payload() {
			ActionPayload::ModifyCssFeedback {
				elements_ids,
				add,
				remove,
			} => Ok(Self::new(elements_ids.clone(), add.clone(), remove.clone())),
			_ => Err(mismatch(kinds::MODIFY_CSS_FEEDBACK, action)),
		}
	}
}

impl Command for ModifyCssFeedbackCommand {
	fn kind(&self) -> &str {
		kinds::MODIFY_CSS_FEEDBACK
	}

	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		let root = ctx.root_mut();
		if self.elements.is_empty() {
			for class in &self.remove {
				root.remove_css_class(class);
			}
			for class in &self.add {
				root.add_css_class(class.clone());
			}
			return Ok(());
		}
		for id in &self.elements {
			let Some(element) = root.element_mut(id) else {
				continue;
			};
			for class in &self.remove {
				element.remove_css_class(class);
			}
			for class in &self.add {
				element.add_css_class(class.clone());
			}
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MarqueeChange {
	Draw { start: Point, end: Point },
	Remove,
}

/// Creates, moves, or removes the marquee element.
#[derive(Debug, Clone)]
pub struct MarqueeFeedbackCommand {
	change: MarqueeChange,
}

impl MarqueeFeedbackCommand {
	pub fn draw(start: Point, end: Point) -> Self {
		Self {
			change: MarqueeChange::Draw { start, end },
		}
	}

	pub fn remove() -> Self {
		Self {
			change: MarqueeChange::Remove,
		}
	}

	pub fn from_action(action: &Action) -> Result<Self> {
		match action.payload() {
			ActionPayload::DrawMarquee { start_point, end_point } => Ok(Self::draw(*start_point, *end_point)),
			ActionPayload::RemoveMarquee => Ok(Self::remove()),
			_ => Err(mismatch(kinds::DRAW_MARQUEE, action)),
		}
	}
}

impl Command for MarqueeFeedbackCommand {
	fn kind(&self) -> &str {
		match self.change {
			MarqueeChange::Draw { .. } => kinds::DRAW_MARQUEE,
			MarqueeChange::Remove => kinds::REMOVE_MARQUEE,
		}
	}

	fn execute(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		let root = ctx.root_mut();
		match self.change {
			MarqueeChange::Draw { start, end } => {
				let bounds = Bounds::from_corners(start, end);
				match root.element_mut(MARQUEE_ELEMENT_ID) {
					Some(marquee) => marquee.set_bounds(Some(bounds)),
					None => root.add_element(
						ModelElement::new(MARQUEE_ELEMENT_ID, MARQUEE_ELEMENT_TYPE)
							.with_bounds(bounds)
							.with_selectable(false),
					)?,
				}
			}
			MarqueeChange::Remove => {
				root.remove_element(MARQUEE_ELEMENT_ID);
			}
		}
		Ok(())
	}
}
