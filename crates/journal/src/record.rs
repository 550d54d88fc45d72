//! Journal record

use crate::error::JournalError;
use chrono::{DateTime, Utc};
use rpbank_core::UserId;
use rpbank_requests::{Request, RequestKind, RequestStatus};
use serde::{Deserialize, Serialize};

/// A terminal decision as written to the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub request_id: String,
    pub user_id: UserId,
    pub user_name: String,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub decided_by: Option<String>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl JournalRecord {
    /// Build a record from a decided request. Pending requests are refused.
    pub fn from_request(request: &Request) -> Result<Self, JournalError> {
        if !request.status.is_terminal() {
            return Err(JournalError::NotDecided(request.id.clone()));
        }

        Ok(Self {
            request_id: request.id.clone(),
            user_id: request.user_id.clone(),
            user_name: request.user_name.clone(),
            kind: request.kind(),
            status: request.status,
            decided_by: request.decided_by.clone(),
            reason: request.denial_reason.clone(),
            timestamp: request.decided_at.unwrap_or(request.created_at),
        })
    }
}
