//! Event subscriber trait for async event handling

use crate::channel::NotificationBus;
use crate::error::BusError;
use crate::event::{ChangeEvent, Topic};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Trait for event subscribers
///
/// Subscribers must be idempotent: the same state may be delivered more
/// than once.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Get the subscriber name (for logging)
    fn name(&self) -> &str;

    /// Handle a change event
    async fn handle(&self, event: &ChangeEvent) -> Result<(), BusError>;
}

/// Drive `subscriber` from a background task until the bus is dropped.
///
/// A failing `handle` call is logged and does not stop the loop.
pub fn spawn_subscriber(
    bus: &NotificationBus,
    topic: Topic,
    subscriber: Arc<dyn EventSubscriber>,
) -> JoinHandle<()> {
    let mut subscription = bus.subscribe(topic);

    tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(event) => {
                    if let Err(e) = subscriber.handle(&event).await {
                        warn!(subscriber = subscriber.name(), error = %e, "subscriber failed");
                    }
                }
                Err(BusError::ChannelClosed) => {
                    debug!(subscriber = subscriber.name(), "bus closed, stopping subscriber");
                    break;
                }
                Err(e) => {
                    warn!(subscriber = subscriber.name(), error = %e, "subscription error");
                }
            }
        }
    })
}
