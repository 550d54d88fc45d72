//! Broadcast channel for change events

use crate::error::BusError;
use crate::event::{ChangeEvent, Topic};
use rpbank_ledger::UserLedger;
use rpbank_requests::Request;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

const DEFAULT_CAPACITY: usize = 256;

/// In-process pub/sub. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; returns the number of live receivers.
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn publish_request(&self, request: &Request) -> usize {
        self.publish(ChangeEvent::RequestChanged(request.clone()))
    }

    pub fn publish_ledger(&self, ledger: &UserLedger) -> usize {
        self.publish(ChangeEvent::LedgerChanged(ledger.clone()))
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            topic,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A topic-filtered receiver
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Wait for the next event on this topic.
    ///
    /// If the receiver fell behind, the missed events are skipped; later
    /// events still carry full state, so nothing is lost for the viewer.
    pub async fn recv(&mut self) -> Result<ChangeEvent, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.matches(&self.topic) => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, topic = ?self.topic, "subscriber lagged, skipping events");
                }
                Err(RecvError::Closed) => return Err(BusError::ChannelClosed),
            }
        }
    }

    /// Non-blocking variant of `recv`; `Ok(None)` when nothing is queued
    pub fn try_recv(&mut self) -> Result<Option<ChangeEvent>, BusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.matches(&self.topic) => return Ok(Some(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, topic = ?self.topic, "subscriber lagged, skipping events");
                }
                Err(TryRecvError::Closed) => return Err(BusError::ChannelClosed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpbank_core::{CreditScore, UserId};

    fn ledger(id: &str) -> UserLedger {
        UserLedger::new(UserId::new(id).unwrap(), id, None, CreditScore::clamped(600))
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = NotificationBus::default();
        assert_eq!(bus.publish_ledger(&ledger("RPB-A")), 0);
    }

    #[tokio::test]
    async fn test_subscription_filters_by_user() {
        let bus = NotificationBus::default();
        let user = UserId::new("RPB-B").unwrap();
        let mut sub = bus.subscribe(Topic::Ledger(user.clone()));

        bus.publish_ledger(&ledger("RPB-A"));
        bus.publish_ledger(&ledger("RPB-B"));

        match sub.recv().await.unwrap() {
            ChangeEvent::LedgerChanged(l) => assert_eq!(l.id, user),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(sub.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_lagging_subscriber_recovers() {
        let bus = NotificationBus::new(2);
        let mut sub = bus.subscribe(Topic::All);

        for i in 0..5 {
            bus.publish_ledger(&ledger(&format!("RPB-{}", i)));
        }

        // Oldest events were overwritten; the newest are still delivered
        let mut seen = Vec::new();
        while let Some(ChangeEvent::LedgerChanged(l)) = sub.try_recv().unwrap() {
            seen.push(l.id.to_string());
        }
        assert_eq!(seen, vec!["RPB-3".to_string(), "RPB-4".to_string()]);
    }

    #[test]
    fn test_closed_channel() {
        let bus = NotificationBus::default();
        let mut sub = bus.subscribe(Topic::All);
        drop(bus);
        assert!(matches!(sub.try_recv(), Err(BusError::ChannelClosed)));
    }
}
