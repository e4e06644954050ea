use uuid::Uuid;

/// Generates a fresh request identifier.
///
/// Identifiers are random v4 UUIDs so that requests issued by independent
/// clients against the same server never collide.
pub fn generate_request_id() -> String {
	Uuid::new_v4().to_string()
}
