// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! Client for the pushmux multiplexed subscription protocol.
//!
//! A [`PushConnection`] owns one persistent WebSocket connection and
//! multiplexes any number of independent, long-lived, server-pushed streams
//! over it. Each `subscribe` call allocates a fresh stream id, sends the
//! subscribe request, and returns a [`Subscription`] handle with chainable
//! callback registration and cooperative cancellation. Connectivity changes
//! are published to registered listeners as state-changed events.
//!
//! # Features
//!
//! - Many independent streams over one connection, dispatched in strict
//!   delivery order
//! - Fire-and-forget subscribe/cancel: no caller-facing method blocks
//! - Single dispatcher task owns all bookkeeping; callbacks may call back
//!   into the API freely
//! - WebSocket transport with once-computed request headers and automatic
//!   reconnection; in-memory transport for tests
//!
//! # Example
//!
//! ```no_run
//! use pushmux_client::{ConnectOptions, ConnectionEvent, EventType, PushConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! 	let connection = PushConnection::open(
//! 		ConnectOptions::new("ws://localhost:8090")
//! 			.with_path("/push")
//! 			.with_header("X-Auth-Token", "mysecrettoken"),
//! 	)?;
//!
//! 	connection.add_event_listener(EventType::StateChanged, |event| {
//! 		let ConnectionEvent::StateChanged { active } = event;
//! 		println!("connection active: {active}");
//! 	});
//!
//! 	let subscription = connection
//! 		.subscribe("counter", "count", None)
//! 		.on_next(|item| println!("counter: {item}"))
//! 		.on_complete(|| println!("counter stream completed"))
//! 		.on_error(|| eprintln!("counter stream failed"));
//!
//! 	// ... later
//! 	subscription.cancel();
//! 	Ok(())
//! }
//! ```

pub mod config;
mod connection;
pub mod error;
pub mod event;
mod multiplexer;
pub mod subscription;
pub mod transport;

pub use config::ConnectOptions;
pub use connection::PushConnection;
pub use error::Error;
pub use event::{ConnectionEvent, ConnectionState, EventType, ListenerToken};
pub use subscription::Subscription;
pub use transport::{Transport, TransportDriver, TransportEvent};
