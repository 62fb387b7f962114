// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! Caller-facing subscription handles.

use serde_json::Value;

use crate::multiplexer::{CallbackSlot, Command, CommandSender};

/// Handle to one server-pushed stream.
///
/// Registration methods store a single callback per kind (registering a
/// second callback of the same kind overwrites the first) and hand the
/// handle back for chaining:
///
/// ```ignore
/// let subscription = connection
/// 	.subscribe("counter", "count", None)
/// 	.on_next(|item| println!("counter: {item}"))
/// 	.on_complete(|| println!("done"));
/// ```
pub struct Subscription {
	id: String,
	commands: CommandSender,
}

impl Subscription {
	pub(crate) fn new(id: String, commands: CommandSender) -> Self {
		Self {
			id,
			commands,
		}
	}

	/// The stream id assigned at subscribe time.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Register the callback invoked with each delivered item, in delivery
	/// order.
	pub fn on_next(self, callback: impl FnMut(Value) + Send + 'static) -> Self {
		self.register(CallbackSlot::Next(Box::new(callback)))
	}

	/// Register the callback invoked exactly once when the stream ends
	/// successfully.
	pub fn on_complete(self, callback: impl FnOnce() + Send + 'static) -> Self {
		self.register(CallbackSlot::Complete(Box::new(callback)))
	}

	/// Register the callback invoked exactly once when the stream ends with
	/// a failure. Streams expected to fail should always register one; an
	/// unhandled stream error is a protocol violation.
	pub fn on_error(self, callback: impl FnOnce() + Send + 'static) -> Self {
		self.register(CallbackSlot::Error(Box::new(callback)))
	}

	/// Ask the server to stop producing items for this stream.
	///
	/// Cancellation is cooperative: the request is sent immediately, but
	/// items already in flight may still arrive. They are dropped without
	/// invoking the `on_next` callback.
	pub fn cancel(&self) {
		let _ = self.commands.send(Command::Cancel {
			id: self.id.clone(),
		});
	}

	fn register(self, slot: CallbackSlot) -> Self {
		let _ = self.commands.send(Command::Register {
			id: self.id.clone(),
			slot,
		});
		self
	}
}
