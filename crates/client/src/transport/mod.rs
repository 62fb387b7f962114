// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! Transport layer.
//!
//! A transport is a duplex channel: an ordered stream of inbound
//! [`TransportEvent`]s plus a fire-and-forget sender for outbound protocol
//! messages. The dispatcher task is the sole consumer of the inbound side,
//! which is what keeps message dispatch strictly ordered.

use pushmux_protocol::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

pub(crate) mod ws;

/// Lifecycle and message events emitted by a transport, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
	/// The connection was (re)established.
	Connected,
	/// The connection dropped.
	Disconnected,
	/// A connection attempt failed; the transport retries on its own.
	ConnectError(String),
	/// One serialized protocol message.
	Message(String),
}

/// A duplex transport as seen by the multiplexer.
pub struct Transport {
	pub(crate) events: mpsc::UnboundedReceiver<TransportEvent>,
	pub(crate) outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl Transport {
	/// In-memory transport for tests.
	///
	/// The returned [`TransportDriver`] plays the server role: it injects
	/// transport events and observes the typed messages the client sends.
	pub fn in_memory() -> (Transport, TransportDriver) {
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		(
			Transport {
				events: event_rx,
				outbound: outbound_tx,
			},
			TransportDriver {
				events: event_tx,
				outbound: outbound_rx,
			},
		)
	}
}

/// Server-side half of [`Transport::in_memory`].
pub struct TransportDriver {
	events: mpsc::UnboundedSender<TransportEvent>,
	outbound: mpsc::UnboundedReceiver<ClientMessage>,
}

impl TransportDriver {
	/// Inject a transport event as if delivered by the network.
	pub fn emit(&self, event: TransportEvent) {
		let _ = self.events.send(event);
	}

	/// Push one server message, serialized the way the wire would carry it.
	pub fn push(&self, message: &ServerMessage) {
		if let Ok(text) = serde_json::to_string(message) {
			self.emit(TransportEvent::Message(text));
		}
	}

	/// Next outbound client message, awaiting delivery.
	pub async fn recv(&mut self) -> Option<ClientMessage> {
		self.outbound.recv().await
	}

	/// Non-blocking read of the next outbound client message.
	pub fn try_recv(&mut self) -> Option<ClientMessage> {
		self.outbound.try_recv().ok()
	}
}
