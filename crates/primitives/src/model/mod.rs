//! Immutable model snapshots.
//!
//! A [`ModelRoot`] is the client-side copy of the server's graphical model.
//! Elements are stored flat, keyed by id in tree pre-order, which doubles as
//! the id index used for selection validation. Published roots are shared as
//! `Arc<ModelRoot>` and never mutated; commands clone a root, adjust the clone,
//! and publish the result wholesale.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod geometry;
mod wire;

pub use geometry::{Bounds, Dimension, Point};

/// Root type marking the empty placeholder model shown before the server answers.
pub const EMPTY_ROOT_TYPE: &str = "NONE";

/// Id of the empty placeholder model.
pub const EMPTY_ROOT_ID: &str = "EMPTY";

/// Errors raised while assembling a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
	/// An element id appears twice.
	#[error("duplicate element id '{0}'")]
	DuplicateId(String),
	/// An element names a parent that is not part of the model.
	#[error("element '{id}' references unknown parent '{parent}'")]
	UnknownParent { id: String, parent: String },
}

/// One element of a model tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelElement {
	id: String,
	element_type: String,
	parent: Option<String>,
	bounds: Option<Bounds>,
	selectable: bool,
	selected: bool,
	css_classes: BTreeSet<String>,
	properties: Map<String, Value>,
}

impl ModelElement {
	/// Creates a selectable top-level element.
	pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			element_type: element_type.into(),
			parent: None,
			bounds: None,
			selectable: true,
			selected: false,
			css_classes: BTreeSet::new(),
			properties: Map::new(),
		}
	}

	/// Nests the element under `parent`.
	#[must_use]
	pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
		self.parent = Some(parent.into());
		self
	}

	#[must_use]
	pub fn with_bounds(mut self, bounds: Bounds) -> Self {
		self.bounds = Some(bounds);
		self
	}

	#[must_use]
	pub fn with_selectable(mut self, selectable: bool) -> Self {
		self.selectable = selectable;
		self
	}

	#[must_use]
	pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
		self.properties.insert(key.into(), value);
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn element_type(&self) -> &str {
		&self.element_type
	}

	/// Parent id, or `None` for direct children of the root.
	pub fn parent(&self) -> Option<&str> {
		self.parent.as_deref()
	}

	pub fn bounds(&self) -> Option<Bounds> {
		self.bounds
	}

	pub fn is_selectable(&self) -> bool {
		self.selectable
	}

	pub fn is_selected(&self) -> bool {
		self.selected
	}

	pub fn css_classes(&self) -> &BTreeSet<String> {
		&self.css_classes
	}

	pub fn has_css_class(&self, class: &str) -> bool {
		self.css_classes.contains(class)
	}

	pub fn properties(&self) -> &Map<String, Value> {
		&self.properties
	}

	pub fn set_selected(&mut self, selected: bool) {
		self.selected = selected;
	}

	pub fn set_bounds(&mut self, bounds: Option<Bounds>) {
		self.bounds = bounds;
	}

	/// Adds a CSS class. Adding a present class is a no-op.
	pub fn add_css_class(&mut self, class: impl Into<String>) {
		self.css_classes.insert(class.into());
	}

	pub fn remove_css_class(&mut self, class: &str) {
		self.css_classes.remove(class);
	}
}

/// Snapshot of a complete model tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "wire::WireRoot", into = "wire::WireRoot")]
pub struct ModelRoot {
	id: String,
	root_type: String,
	revision: Option<u64>,
	canvas_bounds: Option<Bounds>,
	css_classes: BTreeSet<String>,
	elements: IndexMap<String, ModelElement>,
}

impl Default for ModelRoot {
	fn default() -> Self {
		Self::empty()
	}
}

impl ModelRoot {
	/// Creates a root without elements.
	pub fn new(id: impl Into<String>, root_type: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			root_type: root_type.into(),
			revision: None,
			canvas_bounds: None,
			css_classes: BTreeSet::new(),
			elements: IndexMap::new(),
		}
	}

	/// The placeholder model used before the server delivers content.
	pub fn empty() -> Self {
		Self::new(EMPTY_ROOT_ID, EMPTY_ROOT_TYPE)
	}

	/// Builder-style element insertion.
	pub fn with_element(mut self, element: ModelElement) -> Result<Self, ModelError> {
		self.add_element(element)?;
		Ok(self)
	}

	#[must_use]
	pub fn with_revision(mut self, revision: u64) -> Self {
		self.revision = Some(revision);
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn root_type(&self) -> &str {
		&self.root_type
	}

	/// Returns true for the `NONE` placeholder model.
	pub fn is_empty_model(&self) -> bool {
		self.root_type == EMPTY_ROOT_TYPE
	}

	pub fn revision(&self) -> Option<u64> {
		self.revision
	}

	pub fn canvas_bounds(&self) -> Option<Bounds> {
		self.canvas_bounds
	}

	pub fn set_canvas_bounds(&mut self, bounds: Bounds) {
		self.canvas_bounds = Some(bounds);
	}

	pub fn css_classes(&self) -> &BTreeSet<String> {
		&self.css_classes
	}

	pub fn add_css_class(&mut self, class: impl Into<String>) {
		self.css_classes.insert(class.into());
	}

	pub fn remove_css_class(&mut self, class: &str) {
		self.css_classes.remove(class);
	}

	/// Number of elements below the root.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.elements.contains_key(id)
	}

	pub fn element(&self, id: &str) -> Option<&ModelElement> {
		self.elements.get(id)
	}

	pub fn element_mut(&mut self, id: &str) -> Option<&mut ModelElement> {
		self.elements.get_mut(id)
	}

	/// Returns true when `id` resolves to an element that can be selected.
	pub fn is_selectable(&self, id: &str) -> bool {
		self.elements.get(id).is_some_and(ModelElement::is_selectable)
	}

	/// Elements in tree pre-order.
	pub fn elements(&self) -> impl Iterator<Item = &ModelElement> {
		self.elements.values()
	}

	pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut ModelElement> {
		self.elements.values_mut()
	}

	/// Direct children of `parent` (`None` for the root).
	pub fn children<'a>(&'a self, parent: Option<&'a str>) -> impl Iterator<Item = &'a ModelElement> + 'a {
		self.elements.values().filter(move |el| el.parent() == parent)
	}

	/// Ids of every selectable element, in tree order.
	pub fn selectable_ids(&self) -> Vec<String> {
		self.elements.values().filter(|el| el.selectable).map(|el| el.id.clone()).collect()
	}

	/// Inserts an element. Its parent, if any, must already be present.
	pub fn add_element(&mut self, element: ModelElement) -> Result<(), ModelError> {
		if self.elements.contains_key(&element.id) || element.id == self.id {
			return Err(ModelError::DuplicateId(element.id));
		}
		if let Some(parent) = element.parent.as_deref()
			&& parent != self.id
			&& !self.elements.contains_key(parent)
		{
			return Err(ModelError::UnknownParent {
				id: element.id.clone(),
				parent: parent.to_string(),
			});
		}
		let mut element = element;
		if element.parent.as_deref() == Some(self.id.as_str()) {
			element.parent = None;
		}
		self.elements.insert(element.id.clone(), element);
		Ok(())
	}

	/// Inserts or replaces an element in place, keeping its position when it already exists.
	pub fn upsert_element(&mut self, element: ModelElement) -> Result<(), ModelError> {
		match self.elements.get_mut(&element.id) {
			Some(existing) => {
				*existing = element;
				Ok(())
			}
			None => self.add_element(element),
		}
	}

	/// Removes an element together with its descendants.
	pub fn remove_element(&mut self, id: &str) -> Option<ModelElement> {
		let removed = self.elements.shift_remove(id)?;
		let mut doomed: BTreeSet<String> = BTreeSet::from([removed.id.clone()]);
		for el in self.elements.values() {
			if el.parent.as_ref().is_some_and(|p| doomed.contains(p)) {
				doomed.insert(el.id.clone());
			}
		}
		self.elements.retain(|key, _| !doomed.contains(key));
		Some(removed)
	}
}
