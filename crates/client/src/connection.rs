// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! The caller-facing connection type.

use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicU64, Ordering},
};

use pushmux_protocol::ClientMessage;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
	config::ConnectOptions,
	error::Error,
	event::{ConnectionEvent, ConnectionState, EventType, ListenerToken},
	multiplexer::{self, Command, CommandSender, Multiplexer},
	subscription::Subscription,
	transport::{Transport, ws},
};

/// A persistent connection multiplexing any number of server-pushed streams.
///
/// The connection is constructed once per logical session and immediately
/// attempts the transport connection; it lives for the duration of the
/// consuming application. Every method is non-blocking: callers hand work
/// to a single dispatcher task that owns all stream bookkeeping.
///
/// On disconnect, every live stream is torn down as if the server had
/// errored it: its error callback (if any) fires once and its bookkeeping
/// is removed. Reconnection restores transport connectivity only; streams
/// are not resubscribed.
///
/// # Example
///
/// ```no_run
/// use pushmux_client::{ConnectOptions, PushConnection};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// 	let connection = PushConnection::open(
/// 		ConnectOptions::new("ws://localhost:8090").with_path("/push"),
/// 	)?;
///
/// 	let subscription = connection
/// 		.subscribe("counter", "count", None)
/// 		.on_next(|item| println!("counter: {item}"))
/// 		.on_complete(|| println!("done"));
///
/// 	Ok(())
/// }
/// ```
pub struct PushConnection {
	commands: CommandSender,
	next_stream_id: AtomicU64,
	next_listener_token: AtomicU64,
	active: Arc<AtomicBool>,
}

impl PushConnection {
	/// Open a connection over the WebSocket transport.
	///
	/// Invalid options fail immediately and no connection attempt is made.
	/// Connect errors after construction are observed and retried by the
	/// transport; they are never escalated here.
	///
	/// Must be called from within a tokio runtime.
	pub fn open(options: ConnectOptions) -> Result<Self, Error> {
		Ok(Self::with_transport(ws::connect(options)?))
	}

	/// Open a connection over an arbitrary transport, such as
	/// [`Transport::in_memory`].
	///
	/// Must be called from within a tokio runtime.
	pub fn with_transport(transport: Transport) -> Self {
		let Transport {
			events,
			outbound,
		} = transport;

		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let active = Arc::new(AtomicBool::new(false));
		let multiplexer = Multiplexer::new(active.clone(), outbound);
		tokio::spawn(multiplexer::run(multiplexer, command_rx, events));

		Self {
			commands: command_tx,
			next_stream_id: AtomicU64::new(0),
			next_listener_token: AtomicU64::new(0),
			active,
		}
	}

	/// Subscribe to the stream produced by the given endpoint method.
	///
	/// Sends the subscribe request immediately, fire-and-forget, and never
	/// fails synchronously; stream failures are reported through the
	/// handle's `on_error` callback. Stream ids are strictly increasing for
	/// the lifetime of the connection and never reused.
	pub fn subscribe(&self, endpoint_name: &str, method_name: &str, parameters: Option<Vec<Value>>) -> Subscription {
		let id = self.next_stream_id.fetch_add(1, Ordering::Relaxed).to_string();
		let params = parameters.unwrap_or_default();

		let _ = self.commands.send(Command::Subscribe {
			id: id.clone(),
			descriptor: descriptor(endpoint_name, method_name, &params),
			message: ClientMessage::Subscribe {
				id: id.clone(),
				endpoint_name: endpoint_name.to_string(),
				method_name: method_name.to_string(),
				params,
			},
		});

		Subscription::new(id, self.commands.clone())
	}

	/// Register a listener for the given event type.
	///
	/// Returns the token to pass to [`remove_event_listener`]. Listeners
	/// fire in registration order; a listener registered while an event is
	/// being dispatched receives only subsequent events.
	///
	/// [`remove_event_listener`]: Self::remove_event_listener
	pub fn add_event_listener(
		&self,
		event_type: EventType,
		listener: impl FnMut(&ConnectionEvent) + Send + 'static,
	) -> ListenerToken {
		let token = ListenerToken(self.next_listener_token.fetch_add(1, Ordering::Relaxed));
		let _ = self.commands.send(Command::AddListener {
			event_type,
			token,
			listener: Box::new(listener),
		});
		token
	}

	/// Remove a previously registered listener.
	pub fn remove_event_listener(&self, token: ListenerToken) {
		let _ = self.commands.send(Command::RemoveListener {
			token,
		});
	}

	/// Current connectivity state.
	pub fn state(&self) -> ConnectionState {
		if self.active.load(Ordering::Relaxed) {
			ConnectionState::Active
		} else {
			ConnectionState::Inactive
		}
	}

	/// Shut down the connection: stops the dispatcher and lets the
	/// transport send its close frame.
	pub fn close(&self) -> Result<(), Error> {
		self.commands.send(Command::Close).map_err(|_| Error::Closed)
	}
}

impl Drop for PushConnection {
	fn drop(&mut self) {
		// Best effort shutdown; the dispatcher may already be gone.
		let _ = self.commands.send(Command::Close);
	}
}

/// Human-readable stream label kept for diagnostics:
/// `"<endpoint>.<method>(<json-params>)"`.
fn descriptor(endpoint_name: &str, method_name: &str, params: &[Value]) -> String {
	let params = serde_json::to_string(params).unwrap_or_else(|_| "[]".to_string());
	format!("{}.{}({})", endpoint_name, method_name, params)
}
