//! Approval engine errors
//!
//! Business refusals are not errors: they end as a Denied outcome. These
//! are the cases where the caller gets no decision.

use rpbank_ledger::LedgerError;
use rpbank_requests::{RequestStatus, RequestStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Request not found: {0}")]
    NotFound(String),

    /// Someone else decided or is deciding this request
    #[error("Request {id} already processed (status: {})", .status.as_str())]
    AlreadyProcessed { id: String, status: RequestStatus },

    /// Transient; the request is Pending again and the call may be retried
    #[error("Ledger contention on request {id} after {attempts} attempts")]
    Contention { id: String, attempts: u32 },

    #[error("Request store error: {0}")]
    Store(#[from] RequestStoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
