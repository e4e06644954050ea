//! Flat JSON form: `{ "kind": ..., "requestId"?: ..., "responseId"?: ..., ...payload }`.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{Action, ActionPayload, CustomAction, kinds};

const KIND: &str = "kind";
const REQUEST_ID: &str = "requestId";
const RESPONSE_ID: &str = "responseId";

impl Serialize for Action {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = match &self.payload {
			ActionPayload::Custom(custom) => {
				let mut map = Map::with_capacity(custom.body.len() + 1);
				map.insert(KIND.to_string(), Value::String(custom.kind.clone()));
				map.extend(custom.body.iter().map(|(k, v)| (k.clone(), v.clone())));
				map
			}
			payload => match serde_json::to_value(payload).map_err(S::Error::custom)? {
				Value::Object(map) => map,
				other => return Err(S::Error::custom(format!("action payload is not an object: {other}"))),
			},
		};
		if !self.request_id.is_empty() {
			map.insert(REQUEST_ID.to_string(), Value::String(self.request_id.clone()));
		}
		if !self.response_id.is_empty() {
			map.insert(RESPONSE_ID.to_string(), Value::String(self.response_id.clone()));
		}
		map.serialize(serializer)
	}
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> String {
	match map.remove(key) {
		Some(Value::String(s)) => s,
		_ => String::new(),
	}
}

impl<'de> Deserialize<'de> for Action {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let mut map = Map::<String, Value>::deserialize(deserializer)?;
		let request_id = take_string(&mut map, REQUEST_ID);
		let response_id = take_string(&mut map, RESPONSE_ID);
		let kind = match map.get(KIND) {
			Some(Value::String(kind)) => kind.clone(),
			Some(_) => return Err(D::Error::custom("action kind must be a string")),
			None => return Err(D::Error::missing_field(KIND)),
		};

		let payload = if kinds::is_builtin(&kind) {
			serde_json::from_value(Value::Object(map)).map_err(D::Error::custom)?
		} else {
			map.remove(KIND);
			ActionPayload::Custom(CustomAction { kind, body: map })
		};

		Ok(Action::new(payload).with_request_id(request_id).with_response_id(response_id))
	}
}
