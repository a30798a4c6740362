//! Change notifications
//!
//! Services publish a `CouponEvent` after every successful mutation and
//! after remote state has been adopted. Subscribers are plain callbacks
//! run synchronously on the publishing thread.

use std::fmt;
use std::sync::RwLock;

use crate::models::ListId;
use crate::storage::keys::StorageKey;

use super::entitlement::UpsellReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponEvent {
    /// A record scope changed
    RecordsChanged(ListId),
    DeletedChanged,
    ListsChanged,
    SelectionChanged(ListId),
    /// A gated action was refused; the caller should show an upgrade prompt
    UpsellRequested(UpsellReason),
    /// Keys replaced from the remote replica during a pull
    RemoteApplied(Vec<StorageKey>),
}

impl CouponEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RecordsChanged(_) => "records.changed",
            Self::DeletedChanged => "deleted.changed",
            Self::ListsChanged => "lists.changed",
            Self::SelectionChanged(_) => "selection.changed",
            Self::UpsellRequested(_) => "upsell.requested",
            Self::RemoteApplied(_) => "remote.applied",
        }
    }
}

type Subscriber = Box<dyn Fn(&CouponEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&CouponEvent) + Send + Sync + 'static) {
        match self.subscribers.write() {
            Ok(mut subscribers) => subscribers.push(Box::new(callback)),
            Err(e) => tracing::warn!(error = %e, "event bus lock poisoned, subscriber dropped"),
        }
    }

    /// Deliver an event to every subscriber; with none, the event is dropped
    pub fn publish(&self, event: CouponEvent) {
        let subscribers = match self.subscribers.read() {
            Ok(subscribers) => subscribers,
            Err(e) => {
                tracing::warn!(error = %e, "event bus lock poisoned, event dropped");
                return;
            }
        };
        tracing::debug!(
            event_type = event.event_type(),
            subscriber_count = subscribers.len(),
            "publish"
        );
        for subscriber in subscribers.iter() {
            subscriber(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
