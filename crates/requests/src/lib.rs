//! # RPBank Request Store
//!
//! Durable customer requests awaiting a staff decision.
//!
//! ## Lifecycle
//! - Born `Pending`
//! - Claimed by one approver at a time (a lease that expires)
//! - Moved to exactly one terminal state (`Approved` or `Denied`) by a
//!   compare-and-swap that requires the claim token
//! - Terminal requests are never reopened

mod memory;
mod request;
mod sqlite;
mod store;

pub use memory::InMemoryRequestStore;
pub use request::{
    Claim, KycDetails, LoanApplication, Request, RequestKind, RequestPayload, RequestStatus,
};
pub use sqlite::SqliteRequestStore;
pub use store::{RequestStore, RequestStoreError, TerminalUpdate};
