use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Envelope exchanged with the remote peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
	/// Identifies the client session the action belongs to.
	pub client_id: String,
	pub action: Action,
}

impl ActionMessage {
	pub fn new(client_id: impl Into<String>, action: Action) -> Self {
		Self {
			client_id: client_id.into(),
			action,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn message_wraps_flat_action() {
		let msg = ActionMessage::new("client-1", Action::custom("ping"));
		assert_eq!(
			serde_json::to_value(&msg).unwrap(),
			json!({ "clientId": "client-1", "action": { "kind": "ping" } })
		);
	}
}
