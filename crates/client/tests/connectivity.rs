// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

mod common;

use std::time::Duration;

use common::{drain, item_channel, recv_one, recv_outbound, unit_channel, wait_for_state};
use pushmux_client::{
	ConnectionEvent, ConnectionState, EventType, PushConnection, Transport, TransportEvent,
};
use pushmux_protocol::ServerMessage;
use serde_json::json;
use tokio::{
	sync::mpsc,
	time::{sleep, timeout},
};

fn state_listener() -> (impl FnMut(&ConnectionEvent) + Send + 'static, mpsc::UnboundedReceiver<ConnectionEvent>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(
		move |event: &ConnectionEvent| {
			let _ = tx.send(*event);
		},
		rx,
	)
}

#[tokio::test]
async fn test_state_transitions_fire_exactly_once() {
	let (transport, driver) = Transport::in_memory();
	let connection = PushConnection::with_transport(transport);

	let (listener, mut events) = state_listener();
	connection.add_event_listener(EventType::StateChanged, listener);

	assert_eq!(connection.state(), ConnectionState::Inactive);

	driver.emit(TransportEvent::Connected);
	wait_for_state(&connection, ConnectionState::Active).await;
	driver.emit(TransportEvent::Connected);

	driver.emit(TransportEvent::Disconnected);
	wait_for_state(&connection, ConnectionState::Inactive).await;
	driver.emit(TransportEvent::Disconnected);

	driver.emit(TransportEvent::Connected);
	wait_for_state(&connection, ConnectionState::Active).await;

	// The duplicate connect/disconnect signals fired no listeners.
	assert_eq!(
		drain(&mut events),
		vec![
			ConnectionEvent::StateChanged {
				active: true
			},
			ConnectionEvent::StateChanged {
				active: false
			},
			ConnectionEvent::StateChanged {
				active: true
			},
		]
	);
}

#[tokio::test]
async fn test_connect_error_is_not_a_transition() {
	let (transport, driver) = Transport::in_memory();
	let connection = PushConnection::with_transport(transport);

	let (listener, mut events) = state_listener();
	connection.add_event_listener(EventType::StateChanged, listener);

	driver.emit(TransportEvent::ConnectError("connection refused".to_string()));
	driver.emit(TransportEvent::Connected);
	wait_for_state(&connection, ConnectionState::Active).await;

	assert_eq!(
		drain(&mut events),
		vec![ConnectionEvent::StateChanged {
			active: true
		}]
	);
}

#[tokio::test]
async fn test_removed_listener_no_longer_fires() {
	let (transport, driver) = Transport::in_memory();
	let connection = PushConnection::with_transport(transport);

	let (removed_listener, mut removed_events) = state_listener();
	let (kept_listener, mut kept_events) = state_listener();
	let token = connection.add_event_listener(EventType::StateChanged, removed_listener);
	connection.add_event_listener(EventType::StateChanged, kept_listener);
	connection.remove_event_listener(token);

	driver.emit(TransportEvent::Connected);
	wait_for_state(&connection, ConnectionState::Active).await;

	assert_eq!(
		drain(&mut kept_events),
		vec![ConnectionEvent::StateChanged {
			active: true
		}]
	);
	assert!(drain(&mut removed_events).is_empty());
}

#[tokio::test]
async fn test_disconnect_purges_live_streams() {
	let (transport, mut driver) = Transport::in_memory();
	let connection = PushConnection::with_transport(transport);

	let (on_error, mut failed) = unit_channel();
	let _subscription = connection.subscribe("counter", "count", None).on_error(on_error);
	assert_eq!(recv_outbound(&mut driver).await.id(), "0");

	driver.emit(TransportEvent::Connected);
	wait_for_state(&connection, ConnectionState::Active).await;
	driver.emit(TransportEvent::Disconnected);
	wait_for_state(&connection, ConnectionState::Inactive).await;

	// The purge fired the error callback exactly once.
	recv_one(&mut failed).await;
	assert!(drain(&mut failed).is_empty());

	// Reconnection restores connectivity only; the old stream stays gone
	// and a fresh subscribe gets the next id.
	driver.emit(TransportEvent::Connected);
	wait_for_state(&connection, ConnectionState::Active).await;

	driver.push(&ServerMessage::Update {
		id: "0".to_string(),
		item: json!(1),
	});
	let (probe_next, mut probe_items) = item_channel();
	let probe = connection.subscribe("probe", "items", None).on_next(probe_next);
	assert_eq!(probe.id(), "1");
	assert_eq!(recv_outbound(&mut driver).await.id(), "1");
	driver.push(&ServerMessage::Update {
		id: "1".to_string(),
		item: json!("alive"),
	});
	recv_one(&mut probe_items).await;
}

#[tokio::test]
async fn test_close_stops_the_dispatcher() {
	let (transport, mut driver) = Transport::in_memory();
	let connection = PushConnection::with_transport(transport);

	connection.close().expect("first close should succeed");

	// Once the dispatcher has exited, further closes report Closed and the
	// outbound side of the transport is gone.
	timeout(Duration::from_secs(1), async {
		while connection.close().is_ok() {
			sleep(Duration::from_millis(2)).await;
		}
	})
	.await
	.expect("dispatcher did not stop");

	assert!(driver.recv().await.is_none());

	// Subscribing after close is fire-and-forget into a stopped dispatcher;
	// it must not panic.
	let _subscription = connection.subscribe("counter", "count", None);
}
