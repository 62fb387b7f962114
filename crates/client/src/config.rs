// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! Connection options.

use std::time::Duration;

use crate::error::Error;

/// Options for opening a [`PushConnection`](crate::PushConnection).
///
/// The request headers are computed once here and attached to every
/// connection attempt made by the transport.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use pushmux_client::ConnectOptions;
///
/// let options = ConnectOptions::new("ws://localhost:8090")
/// 	.with_path("/push")
/// 	.with_header("X-Auth-Token", "mysecrettoken")
/// 	.with_reconnect_delay(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectOptions {
	url: String,
	path: String,
	headers: Vec<(String, String)>,
	reconnect_delay: Duration,
}

impl ConnectOptions {
	/// Options for the given server URL.
	///
	/// Plain `host:port` addresses are accepted and treated as `ws://`.
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			path: String::new(),
			headers: Vec::new(),
			reconnect_delay: Duration::from_secs(2),
		}
	}

	/// Namespace path appended to the URL, e.g. `/push`.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	/// Add one request header to attach to every connection attempt.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Delay between reconnection attempts of the WebSocket transport.
	pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
		self.reconnect_delay = delay;
		self
	}

	pub(crate) fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	pub(crate) fn reconnect_delay(&self) -> Duration {
		self.reconnect_delay
	}

	/// The full request URL: validated scheme plus namespace path.
	pub(crate) fn request_url(&self) -> Result<String, Error> {
		if self.url.is_empty() {
			return Err(Error::Config {
				reason: "server URL is empty".to_string(),
			});
		}

		let url = if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
			self.url.clone()
		} else if self.url.contains("://") {
			return Err(Error::Config {
				reason: format!("unsupported URL scheme in {}", self.url),
			});
		} else {
			format!("ws://{}", self.url)
		};

		if self.path.is_empty() {
			return Ok(url);
		}

		let path = if self.path.starts_with('/') {
			self.path.clone()
		} else {
			format!("/{}", self.path)
		};
		Ok(format!("{}{}", url.trim_end_matches('/'), path))
	}
}
