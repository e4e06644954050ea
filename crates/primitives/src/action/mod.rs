//! Action envelopes.
//!
//! An [`Action`] is an immutable, tagged record of intent exchanged between
//! UI code, local handlers, and the remote server. The `kind` discriminant is
//! carried by [`ActionPayload`]: well-known kinds are typed variants, anything
//! else travels as [`ActionPayload::Custom`]. Request/response correlation
//! ids and internal routing markers live on the envelope so every kind can
//! take part in a request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Bounds, ModelRoot, Point};

mod wire;

/// Kind strings of the well-known actions.
pub mod kinds {
	pub const SET_MODEL: &str = "setModel";
	pub const UPDATE_MODEL: &str = "updateModel";
	pub const REQUEST_MODEL: &str = "requestModel";
	pub const INITIALIZE_CANVAS_BOUNDS: &str = "initializeCanvasBounds";
	pub const SELECT: &str = "elementSelected";
	pub const SELECT_ALL: &str = "allSelected";
	pub const SELECT_FEEDBACK: &str = "selectFeedback";
	pub const MODIFY_CSS_FEEDBACK: &str = "modifyCSSFeedback";
	pub const DRAW_MARQUEE: &str = "drawMarquee";
	pub const REMOVE_MARQUEE: &str = "removeMarquee";
	pub const REJECT: &str = "rejectRequest";

	/// Every kind with a typed payload variant.
	pub const BUILTIN: &[&str] = &[
		SET_MODEL,
		UPDATE_MODEL,
		REQUEST_MODEL,
		INITIALIZE_CANVAS_BOUNDS,
		SELECT,
		SELECT_ALL,
		SELECT_FEEDBACK,
		MODIFY_CSS_FEEDBACK,
		DRAW_MARQUEE,
		REMOVE_MARQUEE,
		REJECT,
	];

	pub fn is_builtin(kind: &str) -> bool {
		BUILTIN.contains(&kind)
	}
}

fn default_true() -> bool {
	true
}

/// Payload of an action kind without a typed variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAction {
	pub kind: String,
	pub body: Map<String, Value>,
}

/// The kind-specific part of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum ActionPayload {
	/// Replace the whole model with a fresh root.
	#[serde(rename = "setModel")]
	SetModel { new_root: ModelRoot },
	/// Replace the model with an updated root from the server.
	#[serde(rename = "updateModel")]
	UpdateModel {
		new_root: ModelRoot,
		#[serde(default)]
		animate: bool,
	},
	/// Ask the server for the initial model.
	#[serde(rename = "requestModel")]
	RequestModel {
		#[serde(default)]
		options: Map<String, Value>,
	},
	/// The canvas has been measured; the diagram can now be laid out on screen.
	#[serde(rename = "initializeCanvasBounds")]
	InitializeCanvasBounds { new_canvas_bounds: Bounds },
	/// A selection change requested by UI code.
	#[serde(rename = "elementSelected")]
	Select {
		#[serde(default)]
		selected_elements_ids: Vec<String>,
		#[serde(default)]
		deselected_elements_ids: Vec<String>,
		#[serde(default)]
		deselect_all: bool,
	},
	/// Select or deselect every selectable element.
	#[serde(rename = "allSelected")]
	SelectAll {
		#[serde(default = "default_true")]
		select: bool,
	},
	/// Transient highlight of the reconciled selection.
	#[serde(rename = "selectFeedback")]
	SelectFeedback {
		#[serde(default)]
		selected_elements_ids: Vec<String>,
		#[serde(default)]
		deselected_elements_ids: Vec<String>,
	},
	/// Transient CSS classes; an empty id list targets the root (cursor styles).
	#[serde(rename = "modifyCSSFeedback")]
	ModifyCssFeedback {
		#[serde(default)]
		elements_ids: Vec<String>,
		#[serde(default)]
		add: Vec<String>,
		#[serde(default)]
		remove: Vec<String>,
	},
	/// Show the marquee rectangle between two points.
	#[serde(rename = "drawMarquee")]
	DrawMarquee { start_point: Point, end_point: Point },
	/// Hide the marquee rectangle.
	#[serde(rename = "removeMarquee")]
	RemoveMarquee,
	/// A response rejecting the correlated request.
	#[serde(rename = "rejectRequest")]
	Reject {
		message: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		detail: Option<String>,
	},
	/// Any kind without a typed variant.
	#[serde(skip)]
	Custom(CustomAction),
}

impl ActionPayload {
	/// The kind discriminant.
	pub fn kind(&self) -> &str {
		match self {
			Self::SetModel { .. } => kinds::SET_MODEL,
			Self::UpdateModel { .. } => kinds::UPDATE_MODEL,
			Self::RequestModel { .. } => kinds::REQUEST_MODEL,
			Self::InitializeCanvasBounds { .. } => kinds::INITIALIZE_CANVAS_BOUNDS,
			Self::Select { .. } => kinds::SELECT,
			Self::SelectAll { .. } => kinds::SELECT_ALL,
			Self::SelectFeedback { .. } => kinds::SELECT_FEEDBACK,
			Self::ModifyCssFeedback { .. } => kinds::MODIFY_CSS_FEEDBACK,
			Self::DrawMarquee { .. } => kinds::DRAW_MARQUEE,
			Self::RemoveMarquee => kinds::REMOVE_MARQUEE,
			Self::Reject { .. } => kinds::REJECT,
			Self::Custom(custom) => &custom.kind,
		}
	}
}

/// An action flowing through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
	payload: ActionPayload,
	request_id: String,
	response_id: String,
	optional: bool,
	received_from_server: bool,
}

impl From<ActionPayload> for Action {
	fn from(payload: ActionPayload) -> Self {
		Self::new(payload)
	}
}

impl Action {
	pub fn new(payload: ActionPayload) -> Self {
		Self {
			payload,
			request_id: String::new(),
			response_id: String::new(),
			optional: false,
			received_from_server: false,
		}
	}

	/// An action of an application-defined kind with an empty body.
	pub fn custom(kind: impl Into<String>) -> Self {
		Self::custom_with(kind, Map::new())
	}

	/// An action of an application-defined kind.
	pub fn custom_with(kind: impl Into<String>, body: Map<String, Value>) -> Self {
		Self::new(ActionPayload::Custom(CustomAction { kind: kind.into(), body }))
	}

	pub fn set_model(new_root: ModelRoot) -> Self {
		Self::new(ActionPayload::SetModel { new_root })
	}

	pub fn update_model(new_root: ModelRoot) -> Self {
		Self::new(ActionPayload::UpdateModel { new_root, animate: false })
	}

	pub fn request_model(options: Map<String, Value>) -> Self {
		Self::new(ActionPayload::RequestModel { options })
	}

	pub fn initialize_canvas_bounds(new_canvas_bounds: Bounds) -> Self {
		Self::new(ActionPayload::InitializeCanvasBounds { new_canvas_bounds })
	}

	pub fn select(selected: Vec<String>, deselected: Vec<String>) -> Self {
		Self::new(ActionPayload::Select {
			selected_elements_ids: selected,
			deselected_elements_ids: deselected,
			deselect_all: false,
		})
	}

	pub fn select_feedback(selected: Vec<String>, deselected: Vec<String>) -> Self {
		Self::new(ActionPayload::SelectFeedback {
			selected_elements_ids: selected,
			deselected_elements_ids: deselected,
		})
	}

	/// Adds/removes CSS classes on elements, or on the root when `elements` is empty.
	pub fn modify_css_feedback(elements: Vec<String>, add: Vec<String>, remove: Vec<String>) -> Self {
		Self::new(ActionPayload::ModifyCssFeedback {
			elements_ids: elements,
			add,
			remove,
		})
	}

	/// A response rejecting `request`.
	pub fn reject(request: &Action, message: impl Into<String>) -> Self {
		Self::new(ActionPayload::Reject {
			message: message.into(),
			detail: None,
		})
		.with_response_id(request.request_id())
	}

	/// Builds a response to `request` carrying `payload`.
	pub fn response_to(request: &Action, payload: ActionPayload) -> Self {
		Self::new(payload).with_response_id(request.request_id())
	}

	#[must_use]
	pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
		self.request_id = id.into();
		self
	}

	#[must_use]
	pub fn with_response_id(mut self, id: impl Into<String>) -> Self {
		self.response_id = id.into();
		self
	}

	/// Marks the action as optional: finding no handler is not an error.
	#[must_use]
	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	/// Marks the action as delivered by the remote peer.
	#[must_use]
	pub fn received_from_server(mut self) -> Self {
		self.received_from_server = true;
		self
	}

	pub fn kind(&self) -> &str {
		self.payload.kind()
	}

	pub fn payload(&self) -> &ActionPayload {
		&self.payload
	}

	pub fn into_payload(self) -> ActionPayload {
		self.payload
	}

	pub fn request_id(&self) -> &str {
		&self.request_id
	}

	pub fn response_id(&self) -> &str {
		&self.response_id
	}

	/// Returns true when the action carries a request id.
	pub fn is_request(&self) -> bool {
		!self.request_id.is_empty()
	}

	/// Returns true when the action answers a request.
	pub fn is_response(&self) -> bool {
		!self.response_id.is_empty()
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}

	pub fn is_received_from_server(&self) -> bool {
		self.received_from_server
	}

	pub fn set_request_id(&mut self, id: impl Into<String>) {
		self.request_id = id.into();
	}

	/// Turns an unmatched response into a plain action.
	pub fn clear_response_id(&mut self) {
		self.response_id.clear();
	}

	/// For custom actions, the JSON body.
	pub fn body(&self) -> Option<&Map<String, Value>> {
		match &self.payload {
			ActionPayload::Custom(custom) => Some(&custom.body),
			_ => None,
		}
	}
}
