//! Nested wire representation of a model tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Bounds, ModelElement, ModelError, ModelRoot};

fn default_true() -> bool {
	true
}

fn is_true(v: &bool) -> bool {
	*v
}

fn is_false(v: &bool) -> bool {
	!*v
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireElement {
	id: String,
	#[serde(rename = "type")]
	element_type: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	children: Vec<WireElement>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	bounds: Option<Bounds>,
	#[serde(default = "default_true", skip_serializing_if = "is_true")]
	selectable: bool,
	#[serde(default, skip_serializing_if = "is_false")]
	selected: bool,
	#[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
	css_classes: BTreeSet<String>,
	#[serde(flatten)]
	properties: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireRoot {
	id: String,
	#[serde(rename = "type")]
	root_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	revision: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	canvas_bounds: Option<Bounds>,
	#[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
	css_classes: BTreeSet<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	children: Vec<WireElement>,
}

fn flatten_into(root: &mut ModelRoot, parent: Option<&str>, children: Vec<WireElement>) -> Result<(), ModelError> {
	for child in children {
		let element = ModelElement {
			id: child.id,
			element_type: child.element_type,
			parent: parent.map(str::to_string),
			bounds: child.bounds,
			selectable: child.selectable,
			selected: child.selected,
			css_classes: child.css_classes,
			properties: child.properties,
		};
		let id = element.id.clone();
		root.add_element(element)?;
		flatten_into(root, Some(&id), child.children)?;
	}
	Ok(())
}

fn nest(root: &ModelRoot, parent: Option<&str>) -> Vec<WireElement> {
	root.children(parent)
		.map(|el| WireElement {
			id: el.id.clone(),
			element_type: el.element_type.clone(),
			children: nest(root, Some(&el.id)),
			bounds: el.bounds,
			selectable: el.selectable,
			selected: el.selected,
			css_classes: el.css_classes.clone(),
			properties: el.properties.clone(),
		})
		.collect()
}

impl TryFrom<WireRoot> for ModelRoot {
	type Error = ModelError;

	fn try_from(wire: WireRoot) -> Result<Self, Self::Error> {
		let mut root = ModelRoot::new(wire.id, wire.root_type);
		root.revision = wire.revision;
		root.canvas_bounds = wire.canvas_bounds;
		root.css_classes = wire.css_classes;
		flatten_into(&mut root, None, wire.children)?;
		Ok(root)
	}
}

impl From<ModelRoot> for WireRoot {
	fn from(root: ModelRoot) -> Self {
		let children = nest(&root, None);
		WireRoot {
			id: root.id,
			root_type: root.root_type,
			revision: root.revision,
			canvas_bounds: root.canvas_bounds,
			css_classes: root.css_classes,
			children,
		}
	}
}
