// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

/// Errors surfaced by the pushmux client.
///
/// The three protocol violation variants (`UnknownStream`,
/// `UnhandledStreamError`, `UnrecognizedMessage`) indicate that an inbound
/// message is inconsistent with the client's bookkeeping. They are raised at
/// the point of dispatch and abort only the offending dispatch pass; callers
/// should treat them as unrecoverable programming errors and always register
/// an error callback on streams expected to fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The connection options are invalid. No connection attempt was made.
	#[error("invalid connection options: {reason}")]
	Config { reason: String },

	/// The server delivered an update for a stream id with no registered
	/// consumer: never subscribed, or already torn down.
	#[error("no callback registered for stream {id}")]
	UnknownStream { id: String },

	/// The server ended a stream with an error and no error callback was
	/// registered to consume it.
	#[error("error in {descriptor}: {message}")]
	UnhandledStreamError { descriptor: String, message: String },

	/// An inbound message did not match any known protocol shape.
	#[error("unrecognized message from server: {raw}")]
	UnrecognizedMessage { raw: String },

	/// The connection has already shut down.
	#[error("connection closed")]
	Closed,
}
