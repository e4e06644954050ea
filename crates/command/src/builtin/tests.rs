use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use weft_primitives::{Action, Bounds, ModelElement, ModelRoot, Point, kinds};

use super::*;
use crate::command::Command;
use crate::context::CommandExecutionContext;
use crate::error::{CommandError, Result};
use crate::feedback::{FeedbackApplier, FeedbackLink};
use crate::registry::CommandRegistry;

fn graph() -> ModelRoot {
	ModelRoot::new("graph", "graph")
		.with_element(ModelElement::new("n1", "node"))
		.unwrap()
		.with_element(ModelElement::new("n2", "node"))
		.unwrap()
}

fn run(command: &dyn Command, root: ModelRoot) -> CommandExecutionContext {
	let mut ctx = CommandExecutionContext::new(root);
	command.execute(&mut ctx).unwrap();
	ctx
}

/// Tags the root so tests can see that feedback was re-applied.
struct Tagger(AtomicUsize);

impl FeedbackApplier for Tagger {
	fn apply_feedback_commands(&self, ctx: &mut CommandExecutionContext) -> Result<()> {
		self.0.fetch_add(1, Ordering::SeqCst);
		ctx.root_mut().add_css_class("feedback");
		Ok(())
	}
}

#[test]
fn set_model_replaces_root_and_applies_feedback() {
	let tagger = Arc::new(Tagger(AtomicUsize::new(0)));
	let applier: Arc<dyn FeedbackApplier> = tagger.clone();
	let link = FeedbackLink::new();
	link.bind(&applier);

	let ctx = run(&SetModelCommand::new(graph(), link), ModelRoot::empty());
	assert!(ctx.model_root_changed());
	assert_eq!(ctx.root().id(), "graph");
	assert!(ctx.root().css_classes().contains("feedback"));
	assert_eq!(tagger.0.load(Ordering::SeqCst), 1);
}

#[test]
fn unbound_or_dropped_link_skips_feedback() {
	let link = FeedbackLink::new();
	let ctx = run(&SetModelCommand::new(graph(), link.clone()), ModelRoot::empty());
	assert!(ctx.root().css_classes().is_empty());

	let applier: Arc<dyn FeedbackApplier> = Arc::new(Tagger(AtomicUsize::new(0)));
	link.bind(&applier);
	assert!(link.is_bound());
	drop(applier);
	assert!(!link.is_bound());
	let ctx = run(&SetModelCommand::new(graph(), link), ModelRoot::empty());
	assert!(ctx.root().css_classes().is_empty());
}

#[test]
fn update_model_keeps_measured_canvas_bounds() {
	let mut current = graph();
	let bounds = Bounds::new(0.0, 0.0, 300.0, 200.0);
	current.set_canvas_bounds(bounds);

	let update = UpdateModelCommand::new(graph().with_revision(2), false, FeedbackLink::new());
	let ctx = run(&update, current);
	assert_eq!(ctx.root().canvas_bounds(), Some(bounds));
	assert_eq!(ctx.root().revision(), Some(2));
	assert!(ctx.model_root_changed());
}

#[test]
fn select_feedback_flags_known_elements_only() {
	let command = SelectFeedbackCommand::new(vec!["n1".into(), "ghost".into()], vec!["n2".into()]);
	let mut root = graph();
	root.element_mut("n2").unwrap().set_selected(true);

	let ctx = run(&command, root);
	assert!(ctx.root().element("n1").unwrap().is_selected());
	assert!(!ctx.root().element("n2").unwrap().is_selected());
	assert!(!ctx.model_root_changed());
}

#[test]
fn css_feedback_targets_elements_or_root() {
	let on_element = ModifyCssFeedbackCommand::new(vec!["n1".into()], vec!["hover".into()], vec![]);
	let ctx = run(&on_element, graph());
	assert!(ctx.root().element("n1").unwrap().has_css_class("hover"));
	assert!(ctx.root().css_classes().is_empty());

	let on_root = ModifyCssFeedbackCommand::new(vec![], vec!["cursor-crosshair".into()], vec!["cursor-default".into()]);
	let mut root = graph();
	root.add_css_class("cursor-default");
	let ctx = run(&on_root, root);
	assert_eq!(
		ctx.root().css_classes().iter().cloned().collect::<Vec<_>>(),
		vec!["cursor-crosshair".to_string()]
	);
}

#[test]
fn marquee_is_created_moved_and_removed() {
	let draw = MarqueeFeedbackCommand::draw(Point::new(10.0, 10.0), Point::new(0.0, 5.0));
	let ctx = run(&draw, graph());
	let marquee = ctx.root().element(MARQUEE_ELEMENT_ID).unwrap();
	assert_eq!(marquee.bounds(), Some(Bounds::new(0.0, 5.0, 10.0, 5.0)));
	assert!(!marquee.is_selectable());

	let moved = MarqueeFeedbackCommand::draw(Point::ORIGIN, Point::new(20.0, 20.0));
	let ctx = run(&moved, ctx.into_root());
	assert_eq!(
		ctx.root().element(MARQUEE_ELEMENT_ID).unwrap().bounds(),
		Some(Bounds::new(0.0, 0.0, 20.0, 20.0))
	);
	assert_eq!(ctx.root().len(), 3);

	let ctx = run(&MarqueeFeedbackCommand::remove(), ctx.into_root());
	assert!(!ctx.root().contains(MARQUEE_ELEMENT_ID));
}

#[test]
fn registry_builds_builtins_and_rejects_unknown_kinds() {
	let registry = CommandRegistry::with_builtins(FeedbackLink::new());
	for kind in [
		kinds::SET_MODEL,
		kinds::UPDATE_MODEL,
		kinds::INITIALIZE_CANVAS_BOUNDS,
		kinds::SELECT_FEEDBACK,
		kinds::MODIFY_CSS_FEEDBACK,
		kinds::DRAW_MARQUEE,
		kinds::REMOVE_MARQUEE,
	] {
		assert!(registry.contains(kind), "{kind}");
	}

	let command = registry.create(&Action::select_feedback(vec!["n1".into()], vec![])).unwrap();
	assert_eq!(command.kind(), kinds::SELECT_FEEDBACK);

	let err = registry.create(&Action::custom("mystery")).err().unwrap();
	assert_eq!(err, CommandError::UnknownKind("mystery".into()));
}

#[test]
fn factory_rejects_mismatched_payload() {
	let err = SetModelCommand::from_action(&Action::custom(kinds::SET_MODEL), FeedbackLink::new()).unwrap_err();
	assert_eq!(
		err,
		CommandError::PayloadMismatch {
			expected: kinds::SET_MODEL,
			actual: kinds::SET_MODEL.into(),
		}
	);
}
