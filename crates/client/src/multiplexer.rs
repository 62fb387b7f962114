// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! The subscription multiplexer state machine and its dispatcher task.
//!
//! All mutable state (the stream table, the listener registry, the
//! connectivity state) is owned by a single dispatcher task fed by two
//! ordered channels: caller commands and transport events. User callbacks
//! run with no lock held, so they may freely subscribe, cancel, or mutate
//! listeners from inside a callback; those calls are channel sends that
//! take effect after the current message has been dispatched to completion.

use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use pushmux_protocol::{ClientMessage, ServerMessage};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::{
	error::Error,
	event::{ConnectionEvent, EventRegistry, EventType, Listener, ListenerToken},
	transport::TransportEvent,
};

pub(crate) type CommandSender = mpsc::UnboundedSender<Command>;

/// One callback registration for a stream. Registering a slot that is
/// already occupied overwrites it.
pub(crate) enum CallbackSlot {
	Next(Box<dyn FnMut(Value) + Send>),
	Complete(Box<dyn FnOnce() + Send>),
	Error(Box<dyn FnOnce() + Send>),
}

/// Caller requests routed into the dispatcher task.
pub(crate) enum Command {
	Subscribe {
		id: String,
		descriptor: String,
		message: ClientMessage,
	},
	Register {
		id: String,
		slot: CallbackSlot,
	},
	Cancel {
		id: String,
	},
	AddListener {
		event_type: EventType,
		token: ListenerToken,
		listener: Listener,
	},
	RemoveListener {
		token: ListenerToken,
	},
	Close,
}

/// Per-stream record in the table keyed by stringified stream id.
struct StreamEntry {
	/// Human-readable label kept for diagnostics.
	descriptor: String,
	on_next: Option<Box<dyn FnMut(Value) + Send>>,
	on_complete: Option<Box<dyn FnOnce() + Send>>,
	on_error: Option<Box<dyn FnOnce() + Send>>,
	/// Set on caller-requested cancellation. Suppresses further delivery;
	/// the entry itself is removed on server-acknowledged completion or
	/// error, or on disconnect purge.
	cancelled: bool,
}

impl StreamEntry {
	fn new(descriptor: String) -> Self {
		Self {
			descriptor,
			on_next: None,
			on_complete: None,
			on_error: None,
			cancelled: false,
		}
	}
}

/// The multiplexer state machine. Owned exclusively by the dispatcher task.
pub(crate) struct Multiplexer {
	streams: HashMap<String, StreamEntry>,
	registry: EventRegistry,
	active: bool,
	/// Mirror of `active`, readable synchronously by callers.
	shared_state: Arc<AtomicBool>,
	outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl Multiplexer {
	pub(crate) fn new(shared_state: Arc<AtomicBool>, outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
		Self {
			streams: HashMap::new(),
			registry: EventRegistry::new(),
			active: false,
			shared_state,
			outbound,
		}
	}

	/// Apply one caller command. `Close` is handled by the dispatch loop.
	pub(crate) fn apply(&mut self, command: Command) {
		match command {
			Command::Subscribe {
				id,
				descriptor,
				message,
			} => {
				debug!("registered stream {} for {}", id, descriptor);
				self.streams.insert(id, StreamEntry::new(descriptor));
				self.send(message);
			}
			Command::Register {
				id,
				slot,
			} => {
				// Registration on a stream already torn down is a no-op.
				if let Some(entry) = self.streams.get_mut(&id) {
					match slot {
						CallbackSlot::Next(callback) => entry.on_next = Some(callback),
						CallbackSlot::Complete(callback) => entry.on_complete = Some(callback),
						CallbackSlot::Error(callback) => entry.on_error = Some(callback),
					}
				}
			}
			Command::Cancel {
				id,
			} => {
				if let Some(entry) = self.streams.get_mut(&id) {
					entry.cancelled = true;
					debug!("cancelled stream {} ({})", id, entry.descriptor);
				}
				self.send(ClientMessage::Unsubscribe {
					id,
				});
			}
			Command::AddListener {
				event_type,
				token,
				listener,
			} => self.registry.add(event_type, token, listener),
			Command::RemoveListener {
				token,
			} => self.registry.remove(token),
			Command::Close => {}
		}
	}

	/// Handle one transport event. An `Err` is a protocol violation; it
	/// aborts only this dispatch pass.
	pub(crate) fn handle_event(&mut self, event: TransportEvent) -> Result<(), Error> {
		match event {
			TransportEvent::Connected => {
				self.set_active(true);
				Ok(())
			}
			TransportEvent::Disconnected => {
				self.set_active(false);
				Ok(())
			}
			TransportEvent::ConnectError(reason) => {
				// The transport retries on its own; streams are left pending.
				warn!("transport connect error: {}", reason);
				Ok(())
			}
			TransportEvent::Message(text) => self.handle_message(&text),
		}
	}

	fn handle_message(&mut self, text: &str) -> Result<(), Error> {
		let message: ServerMessage = serde_json::from_str(text).map_err(|_| Error::UnrecognizedMessage {
			raw: text.to_string(),
		})?;

		match message {
			ServerMessage::Update {
				id,
				item,
			} => self.handle_update(id, item),
			ServerMessage::Complete {
				id,
			} => {
				self.handle_complete(id);
				Ok(())
			}
			ServerMessage::Error {
				id,
				message,
			} => self.handle_error(id, message),
		}
	}

	fn handle_update(&mut self, id: String, item: Value) -> Result<(), Error> {
		match self.streams.get_mut(&id) {
			Some(entry) if entry.cancelled => {
				// Cancellation is cooperative; late items are expected.
				debug!("dropping update for cancelled stream {}", id);
				Ok(())
			}
			Some(entry) => match entry.on_next.as_mut() {
				Some(callback) => {
					callback(item);
					Ok(())
				}
				None => Err(Error::UnknownStream {
					id,
				}),
			},
			None => Err(Error::UnknownStream {
				id,
			}),
		}
	}

	fn handle_complete(&mut self, id: String) {
		// Completion always terminates the stream, callback or not.
		if let Some(mut entry) = self.streams.remove(&id) {
			debug!("stream {} completed ({})", id, entry.descriptor);
			if let Some(callback) = entry.on_complete.take() {
				callback();
			}
		}
	}

	fn handle_error(&mut self, id: String, message: String) -> Result<(), Error> {
		match self.streams.remove(&id) {
			Some(mut entry) => match entry.on_error.take() {
				Some(callback) => {
					callback();
					Ok(())
				}
				None => Err(Error::UnhandledStreamError {
					descriptor: entry.descriptor,
					message,
				}),
			},
			None => Err(Error::UnhandledStreamError {
				descriptor: format!("stream {}", id),
				message,
			}),
		}
	}

	/// Transition the connectivity state. Self-transitions are no-ops and
	/// fire no listeners.
	fn set_active(&mut self, active: bool) {
		if self.active == active {
			return;
		}
		self.active = active;
		self.shared_state.store(active, Ordering::Relaxed);
		self.registry.dispatch(&ConnectionEvent::StateChanged {
			active,
		});
		if !active {
			self.purge_streams();
		}
	}

	/// Tear down every live stream as if the server had errored it.
	///
	/// Runs when the connection drops: reconnection restores transport
	/// connectivity only, so no stale callback may fire afterwards.
	fn purge_streams(&mut self) {
		for (id, mut entry) in self.streams.drain() {
			match entry.on_error.take() {
				Some(callback) => callback(),
				None => warn!("stream {} ({}) dropped with the connection", id, entry.descriptor),
			}
		}
	}

	fn send(&self, message: ClientMessage) {
		if self.outbound.send(message).is_err() {
			warn!("transport closed, dropping outbound message");
		}
	}
}

/// Dispatcher task: sole consumer of caller commands and transport events.
///
/// Commands drain before transport events so that callback registrations
/// land before the messages that need them. Inbound messages are processed
/// one at a time, to completion, in transport delivery order.
pub(crate) async fn run(
	mut multiplexer: Multiplexer,
	mut commands: mpsc::UnboundedReceiver<Command>,
	mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
	loop {
		tokio::select! {
			biased;

			command = commands.recv() => match command {
				Some(Command::Close) | None => break,
				Some(command) => multiplexer.apply(command),
			},

			event = events.recv() => match event {
				Some(event) => {
					if let Err(violation) = multiplexer.handle_event(event) {
						error!("protocol violation: {}", violation);
					}
				}
				None => break,
			},
		}
	}
	debug!("dispatcher stopped");
}
