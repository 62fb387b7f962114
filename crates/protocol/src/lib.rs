// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! Wire protocol messages for the pushmux subscription protocol.
//!
//! All messages are JSON objects discriminated by a lowercase `type` field
//! and carrying the stream `id` assigned at subscribe time, rendered as a
//! string. Item payloads and subscription parameters are arbitrary JSON
//! values.
//!
//! # Message Protocol
//!
//! Client to server:
//!
//! ```json
//! {"type": "subscribe", "id": "0", "endpointName": "counter", "methodName": "count", "params": []}
//! {"type": "unsubscribe", "id": "0"}
//! ```
//!
//! Server to client:
//!
//! ```json
//! {"type": "update", "id": "0", "item": 1}
//! {"type": "complete", "id": "0"}
//! {"type": "error", "id": "0", "message": "stream failed"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
	/// Open a new stream produced by the given endpoint method.
	#[serde(rename_all = "camelCase")]
	Subscribe {
		id: String,
		endpoint_name: String,
		method_name: String,
		params: Vec<Value>,
	},
	/// Ask the server to stop producing items for a stream.
	Unsubscribe { id: String },
}

/// A message pushed from the server to the client.
///
/// Any other discriminant fails deserialization; the dispatch layer keeps
/// the raw text for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
	/// One item delivered on a stream, in delivery order.
	Update { id: String, item: Value },
	/// Successful end of a stream.
	Complete { id: String },
	/// Failed end of a stream.
	Error { id: String, message: String },
}

impl ClientMessage {
	/// The stream id this message belongs to.
	pub fn id(&self) -> &str {
		match self {
			ClientMessage::Subscribe { id, .. } => id,
			ClientMessage::Unsubscribe { id } => id,
		}
	}
}

impl ServerMessage {
	/// The stream id this message belongs to.
	pub fn id(&self) -> &str {
		match self {
			ServerMessage::Update { id, .. } => id,
			ServerMessage::Complete { id } => id,
			ServerMessage::Error { id, .. } => id,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_subscribe_wire_shape() {
		let message = ClientMessage::Subscribe {
			id: "0".to_string(),
			endpoint_name: "counter".to_string(),
			method_name: "count".to_string(),
			params: vec![],
		};

		let text = serde_json::to_string(&message).unwrap();
		assert_eq!(
			text,
			r#"{"type":"subscribe","id":"0","endpointName":"counter","methodName":"count","params":[]}"#
		);
	}

	#[test]
	fn test_subscribe_carries_params_in_order() {
		let message = ClientMessage::Subscribe {
			id: "3".to_string(),
			endpoint_name: "chat".to_string(),
			method_name: "join".to_string(),
			params: vec![json!("general"), json!(25)],
		};

		let text = serde_json::to_string(&message).unwrap();
		let parsed: ClientMessage = serde_json::from_str(&text).unwrap();
		assert_eq!(parsed, message);
		assert!(text.contains(r#""params":["general",25]"#));
	}

	#[test]
	fn test_unsubscribe_wire_shape() {
		let message = ClientMessage::Unsubscribe {
			id: "7".to_string(),
		};

		let text = serde_json::to_string(&message).unwrap();
		assert_eq!(text, r#"{"type":"unsubscribe","id":"7"}"#);
	}

	#[test]
	fn test_update_parses_arbitrary_item() {
		let message: ServerMessage = serde_json::from_str(
			r#"{"type":"update","id":"0","item":{"name":"ada","score":42}}"#,
		)
		.unwrap();

		assert_eq!(
			message,
			ServerMessage::Update {
				id: "0".to_string(),
				item: json!({"name": "ada", "score": 42}),
			}
		);
	}

	#[test]
	fn test_complete_and_error_parse() {
		let complete: ServerMessage = serde_json::from_str(r#"{"type":"complete","id":"1"}"#).unwrap();
		assert_eq!(
			complete,
			ServerMessage::Complete {
				id: "1".to_string()
			}
		);

		let error: ServerMessage =
			serde_json::from_str(r#"{"type":"error","id":"2","message":"stream failed"}"#).unwrap();
		assert_eq!(
			error,
			ServerMessage::Error {
				id: "2".to_string(),
				message: "stream failed".to_string(),
			}
		);
	}

	#[test]
	fn test_unknown_discriminant_is_rejected() {
		assert!(serde_json::from_str::<ServerMessage>(r#"{"type":"snapshot","id":"0"}"#).is_err());
		assert!(serde_json::from_str::<ServerMessage>(r#"{"id":"0","item":1}"#).is_err());
	}

	#[test]
	fn test_id_accessor() {
		assert_eq!(
			ServerMessage::Complete {
				id: "5".to_string()
			}
			.id(),
			"5"
		);
		assert_eq!(
			ClientMessage::Unsubscribe {
				id: "6".to_string()
			}
			.id(),
			"6"
		);
	}
}
