//! Request store contract

use crate::request::{Claim, Request, RequestKind, RequestStatus};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestStoreError {
    #[error("Request not found: {0}")]
    NotFound(String),

    /// The compare-and-swap lost: the request is terminal, claimed by
    /// someone else, or the claim token no longer matches
    #[error("Request {id} cannot change state (status: {})", .status.as_str())]
    Conflict { id: String, status: RequestStatus },

    #[error("Invalid terminal status: {0:?}")]
    InvalidTransition(RequestStatus),

    #[error("Request already exists: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// The terminal write for a claimed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalUpdate {
    pub status: RequestStatus,
    pub decided_by: String,
    pub reason: Option<String>,
}

impl TerminalUpdate {
    pub fn approved(decided_by: impl Into<String>) -> Self {
        Self {
            status: RequestStatus::Approved,
            decided_by: decided_by.into(),
            reason: None,
        }
    }

    pub fn denied(decided_by: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: RequestStatus::Denied,
            decided_by: decided_by.into(),
            reason: Some(reason.into()),
        }
    }
}

pub trait RequestStore: Send + Sync {
    /// Store a new pending request, returning its id
    fn submit(&self, request: &Request) -> Result<String, RequestStoreError>;

    fn get(&self, id: &str) -> Result<Request, RequestStoreError>;

    /// Requests in creation order, optionally filtered by kind
    fn list_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<Vec<Request>, RequestStoreError>;

    fn count_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<usize, RequestStoreError>;

    /// Take the processing lease on a pending request.
    ///
    /// Succeeds only if the request is Pending and unclaimed (or its claim is
    /// older than `ttl`); otherwise fails with `Conflict`.
    fn claim(&self, id: &str, now: DateTime<Utc>, ttl: Duration) -> Result<Claim, RequestStoreError>;

    /// Give the lease back without deciding
    fn release(&self, id: &str, token: &str) -> Result<(), RequestStoreError>;

    /// Compare-and-swap to a terminal status. Succeeds only if the request is
    /// still Pending and holds the claim `token`.
    fn transition(
        &self,
        id: &str,
        token: &str,
        update: &TerminalUpdate,
        now: DateTime<Utc>,
    ) -> Result<Request, RequestStoreError>;

    fn list_pending(&self, kind: RequestKind) -> Result<Vec<Request>, RequestStoreError> {
        self.list_by_status(Some(kind), RequestStatus::Pending)
    }
}
