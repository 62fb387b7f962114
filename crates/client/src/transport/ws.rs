// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! WebSocket transport over tokio-tungstenite.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pushmux_protocol::ClientMessage;
use tokio::{sync::mpsc, time::sleep};
use tokio_tungstenite::{
	connect_async,
	tungstenite::{
		Message,
		client::IntoClientRequest,
		http::{HeaderMap, HeaderName, HeaderValue},
	},
};
use tracing::{debug, warn};

use crate::{
	config::ConnectOptions,
	error::Error,
	transport::{Transport, TransportEvent},
};

/// Open the WebSocket transport.
///
/// Validates the options and computes the header set once, then spawns the
/// connection task. Connect failures after this point are reported as
/// [`TransportEvent::ConnectError`] and retried after the configured delay;
/// they are never escalated to the caller.
pub(crate) fn connect(options: ConnectOptions) -> Result<Transport, Error> {
	let url = options.request_url()?;
	let headers = build_headers(options.headers())?;

	let (event_tx, event_rx) = mpsc::unbounded_channel();
	let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

	tokio::spawn(run(url, headers, options.reconnect_delay(), event_tx, outbound_rx));

	Ok(Transport {
		events: event_rx,
		outbound: outbound_tx,
	})
}

fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap, Error> {
	let mut map = HeaderMap::new();
	for (name, value) in headers {
		let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::Config {
			reason: format!("invalid header name: {}", name),
		})?;
		let value = HeaderValue::from_str(value).map_err(|_| Error::Config {
			reason: format!("invalid value for header {}", name),
		})?;
		map.append(name, value);
	}
	Ok(map)
}

/// Connection task: connect, pump frames, reconnect on loss.
async fn run(
	url: String,
	headers: HeaderMap,
	reconnect_delay: Duration,
	events: mpsc::UnboundedSender<TransportEvent>,
	mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
) {
	loop {
		let mut request = match url.as_str().into_client_request() {
			Ok(request) => request,
			Err(e) => {
				// A malformed URL will not improve on retry.
				let _ = events.send(TransportEvent::ConnectError(e.to_string()));
				return;
			}
		};
		for (name, value) in headers.iter() {
			request.headers_mut().append(name.clone(), value.clone());
		}

		let (stream, _) = match connect_async(request).await {
			Ok(connected) => connected,
			Err(e) => {
				warn!("connect to {} failed: {}", url, e);
				if events.send(TransportEvent::ConnectError(e.to_string())).is_err() {
					return;
				}
				sleep(reconnect_delay).await;
				continue;
			}
		};

		if events.send(TransportEvent::Connected).is_err() {
			return;
		}
		debug!("connected to {}", url);

		let (mut write, mut read) = stream.split();

		loop {
			tokio::select! {
				inbound = read.next() => match inbound {
					Some(Ok(Message::Text(text))) => {
						if events.send(TransportEvent::Message(text.to_string())).is_err() {
							return;
						}
					}
					Some(Ok(Message::Ping(data))) => {
						let _ = write.send(Message::Pong(data)).await;
					}
					Some(Ok(Message::Close(_))) | None => break,
					Some(Ok(_)) => {}
					Some(Err(e)) => {
						debug!("websocket read failed: {}", e);
						break;
					}
				},

				message = outbound.recv() => match message {
					Some(message) => match serde_json::to_string(&message) {
						Ok(json) => {
							if write.send(Message::Text(json.into())).await.is_err() {
								break;
							}
						}
						Err(e) => warn!("failed to serialize outbound message: {}", e),
					},
					None => {
						// The connection was dropped; leave cleanly.
						let _ = write.send(Message::Close(None)).await;
						let _ = events.send(TransportEvent::Disconnected);
						return;
					}
				},
			}
		}

		if events.send(TransportEvent::Disconnected).is_err() {
			return;
		}
		debug!("disconnected from {}, reconnecting", url);
		sleep(reconnect_delay).await;
	}
}
