// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

use std::time::Duration;

use pushmux_client::{ConnectionState, PushConnection, TransportDriver};
use pushmux_protocol::ClientMessage;
use serde_json::Value;
use tokio::{
	sync::mpsc,
	time::{sleep, timeout},
};

/// Await the next outbound client message, failing the test after a second.
pub async fn recv_outbound(driver: &mut TransportDriver) -> ClientMessage {
	timeout(Duration::from_secs(1), driver.recv())
		.await
		.expect("timed out waiting for an outbound message")
		.expect("transport closed")
}

/// Await one value from a callback channel, failing the test after a second.
pub async fn recv_one<T>(receiver: &mut mpsc::UnboundedReceiver<T>) -> T {
	timeout(Duration::from_secs(1), receiver.recv())
		.await
		.expect("timed out waiting for a callback")
		.expect("callback channel closed")
}

/// Poll until the connection reports the expected state.
///
/// The state mirror flips when the dispatcher processes the transport
/// event, so this doubles as a synchronization point: every event emitted
/// before the transition has been dispatched once this returns.
pub async fn wait_for_state(connection: &PushConnection, state: ConnectionState) {
	timeout(Duration::from_secs(1), async {
		while connection.state() != state {
			sleep(Duration::from_millis(2)).await;
		}
	})
	.await
	.expect("connection did not reach the expected state");
}

/// Collect everything currently buffered in a callback channel.
pub fn drain<T>(receiver: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
	let mut values = Vec::new();
	while let Ok(value) = receiver.try_recv() {
		values.push(value);
	}
	values
}

/// Channel-backed `on_next` callback.
pub fn item_channel() -> (impl FnMut(Value) + Send + 'static, mpsc::UnboundedReceiver<Value>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(
		move |item| {
			let _ = tx.send(item);
		},
		rx,
	)
}

/// Channel-backed `on_complete`/`on_error` callback.
pub fn unit_channel() -> (impl FnOnce() + Send + 'static, mpsc::UnboundedReceiver<()>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(
		move || {
			let _ = tx.send(());
		},
		rx,
	)
}
