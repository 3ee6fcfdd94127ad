// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Aircraft change events.
//!
//! The surveillance side publishes add/remove/modify/point-out events on an
//! [`EventBus`]. Each display holds an [`EventFeed`] and drains it once at the
//! start of every frame, so changes are applied in delivery order and never
//! while a placement or proximity pass is running.

use log::warn;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::aircraft::AircraftId;

/// Default broadcast capacity; a display that falls further behind than this
/// between two frames loses the oldest events.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A change to the set of aircraft or to one aircraft's data.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeEvent {
    /// A new aircraft appeared.
    Added(AircraftId),
    /// An aircraft went away.
    Removed(AircraftId),
    /// Something about an aircraft changed that may affect its label.
    Modified(AircraftId),
    /// Another controller pointed the aircraft out to us.
    PointOut {
        id: AircraftId,
        controller: String,
    },
}

impl ScopeEvent {
    #[must_use]
    pub fn aircraft(&self) -> &AircraftId {
        match self {
            Self::Added(id) | Self::Removed(id) | Self::Modified(id) => id,
            Self::PointOut { id, .. } => id,
        }
    }
}

/// Publishing side of the event stream.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScopeEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to every subscribed display. Events published while
    /// nobody is subscribed are dropped.
    pub fn publish(&self, event: ScopeEvent) {
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> EventFeed {
        EventFeed {
            rx: self.tx.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A display's subscription to an [`EventBus`].
#[derive(Debug)]
pub struct EventFeed {
    rx: broadcast::Receiver<ScopeEvent>,
}

impl EventFeed {
    /// Take every pending event without blocking, oldest first.
    pub fn drain(&mut self) -> Vec<ScopeEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Scope event feed lagged; {skipped} events were dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// A new subscription to the same bus, starting from now.
    #[must_use]
    pub fn resubscribe(&self) -> Self {
        Self {
            rx: self.rx.resubscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let bus = EventBus::default();
        let mut feed = bus.subscribe();
        bus.publish(ScopeEvent::Added(AircraftId::new("A")));
        bus.publish(ScopeEvent::Modified(AircraftId::new("A")));
        bus.publish(ScopeEvent::Removed(AircraftId::new("A")));

        let events = feed.drain();
        assert_eq!(
            events,
            vec![
                ScopeEvent::Added(AircraftId::new("A")),
                ScopeEvent::Modified(AircraftId::new("A")),
                ScopeEvent::Removed(AircraftId::new("A")),
            ]
        );
        assert!(feed.drain().is_empty());
    }

    #[test]
    fn test_lagged_feed_keeps_newest() {
        let bus = EventBus::new(2);
        let mut feed = bus.subscribe();
        for name in ["A", "B", "C", "D"] {
            bus.publish(ScopeEvent::Added(AircraftId::new(name)));
        }
        let events = feed.drain();
        assert_eq!(
            events,
            vec![
                ScopeEvent::Added(AircraftId::new("C")),
                ScopeEvent::Added(AircraftId::new("D")),
            ]
        );
    }

    #[test]
    fn test_resubscribe_is_independent() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = first.resubscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ScopeEvent::PointOut {
            id: AircraftId::new("A"),
            controller: "N90".to_string(),
        });
        assert_eq!(first.drain().len(), 1);
        assert_eq!(second.drain().len(), 1);
    }
}
