//! Event bus errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Subscriber '{name}' failed: {reason}")]
    SubscriberFailed { name: String, reason: String },

    #[error("Channel closed")]
    ChannelClosed,
}
