//! RPBank Journal - append-only record of request decisions
//!
//! One JSON line per decided request, rotated into one file per day.
//! The journal is an audit trail; the stores remain the source of truth.

pub mod error;
pub mod reader;
pub mod record;
pub mod store;
pub mod subscriber;

pub use error::JournalError;
pub use reader::JournalReader;
pub use record::JournalRecord;
pub use store::JournalStore;
pub use subscriber::JournalSubscriber;
