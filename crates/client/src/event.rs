// Copyright (c) pushmux.dev 2025
// This file is licensed under the MIT

//! Connectivity events and the listener registry.

use std::collections::HashMap;

/// Connectivity state of the underlying transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Inactive,
	Active,
}

/// Event types listeners can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
	/// The connection transitioned between active and inactive.
	StateChanged,
}

/// Payload delivered to event listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
	/// The connection became active (`true`) or inactive (`false`).
	StateChanged { active: bool },
}

impl ConnectionEvent {
	/// The event type this payload belongs to.
	pub fn event_type(&self) -> EventType {
		match self {
			ConnectionEvent::StateChanged { .. } => EventType::StateChanged,
		}
	}
}

/// Token handed out at listener registration, used for removal.
///
/// Removal by token sidesteps the identity-equality pitfalls of comparing
/// closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub(crate) u64);

pub(crate) type Listener = Box<dyn FnMut(&ConnectionEvent) + Send>;

/// Ordered listener registry keyed by event type.
///
/// Dispatch iterates the listeners registered for the event's type in
/// registration order. The registry is owned by the dispatcher task, so a
/// listener added while an event is being dispatched receives only
/// subsequent events.
pub(crate) struct EventRegistry {
	listeners: HashMap<EventType, Vec<(ListenerToken, Listener)>>,
}

impl EventRegistry {
	pub(crate) fn new() -> Self {
		Self {
			listeners: HashMap::new(),
		}
	}

	pub(crate) fn add(&mut self, event_type: EventType, token: ListenerToken, listener: Listener) {
		self.listeners.entry(event_type).or_default().push((token, listener));
	}

	pub(crate) fn remove(&mut self, token: ListenerToken) {
		for entries in self.listeners.values_mut() {
			entries.retain(|(registered, _)| *registered != token);
		}
	}

	pub(crate) fn dispatch(&mut self, event: &ConnectionEvent) {
		if let Some(entries) = self.listeners.get_mut(&event.event_type()) {
			for (_, listener) in entries.iter_mut() {
				listener(event);
			}
		}
	}
}
