//! RPBank Event Bus - change notification for viewers
//!
//! Every event carries the full current state of the changed request or
//! ledger. Delivery is at-least-once from the viewer's point of view:
//! consumers must treat a repeated identical payload as a no-op.

pub mod channel;
pub mod error;
pub mod event;
pub mod subscriber;

pub use channel::{NotificationBus, Subscription};
pub use error::BusError;
pub use event::{ChangeEvent, Topic};
pub use subscriber::{spawn_subscriber, EventSubscriber};
