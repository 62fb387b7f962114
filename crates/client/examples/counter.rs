// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

use std::time::Duration;

use pushmux_client::{ConnectOptions, ConnectionEvent, EventType, PushConnection};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

	// Connect to the push endpoint
	let connection = PushConnection::open(
		ConnectOptions::new("ws://127.0.0.1:8090")
			.with_path("/push")
			.with_header("X-Auth-Token", "mysecrettoken"),
	)?;

	connection.add_event_listener(EventType::StateChanged, |event| {
		let ConnectionEvent::StateChanged {
			active,
		} = event;
		println!("connection active: {active}");
	});

	// Stream server-side counter ticks
	let subscription = connection
		.subscribe("counter", "count", None)
		.on_next(|item| println!("counter: {item}"))
		.on_complete(|| println!("counter stream completed"))
		.on_error(|| eprintln!("counter stream failed"));
	println!("subscribed as stream {}", subscription.id());

	tokio::time::sleep(Duration::from_secs(30)).await;

	subscription.cancel();
	connection.close()?;
	Ok(())
}
