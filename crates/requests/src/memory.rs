//! In-memory request store

use crate::request::{Claim, Request, RequestKind, RequestStatus};
use crate::store::{RequestStore, RequestStoreError, TerminalUpdate};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard};

/// Requests kept in submission order behind one mutex
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: Mutex<Vec<Request>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Request>>, RequestStoreError> {
        self.requests
            .lock()
            .map_err(|_| RequestStoreError::Storage("request lock poisoned".to_string()))
    }
}

fn find_mut<'a>(requests: &'a mut [Request], id: &str) -> Result<&'a mut Request, RequestStoreError> {
    requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| RequestStoreError::NotFound(id.to_string()))
}

fn matches_filter(request: &Request, kind: Option<RequestKind>, status: RequestStatus) -> bool {
    request.status == status && kind.map_or(true, |k| request.kind() == k)
}

impl RequestStore for InMemoryRequestStore {
    fn submit(&self, request: &Request) -> Result<String, RequestStoreError> {
        let mut requests = self.lock()?;
        if requests.iter().any(|r| r.id == request.id) {
            return Err(RequestStoreError::Duplicate(request.id.clone()));
        }
        requests.push(request.clone());
        Ok(request.id.clone())
    }

    fn get(&self, id: &str) -> Result<Request, RequestStoreError> {
        self.lock()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| RequestStoreError::NotFound(id.to_string()))
    }

    fn list_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<Vec<Request>, RequestStoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| matches_filter(r, kind, status))
            .cloned()
            .collect())
    }

    fn count_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<usize, RequestStoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| matches_filter(r, kind, status))
            .count())
    }

    fn claim(&self, id: &str, now: DateTime<Utc>, ttl: Duration) -> Result<Claim, RequestStoreError> {
        let mut requests = self.lock()?;
        let request = find_mut(&mut requests, id)?;

        if !request.is_claimable(now, ttl) {
            return Err(RequestStoreError::Conflict {
                id: id.to_string(),
                status: request.status,
            });
        }

        let claim = Claim::new(now);
        request.claim = Some(claim.clone());
        Ok(claim)
    }

    fn release(&self, id: &str, token: &str) -> Result<(), RequestStoreError> {
        let mut requests = self.lock()?;
        let request = find_mut(&mut requests, id)?;

        if request.claim.as_ref().is_some_and(|c| c.token == token) {
            request.claim = None;
        }
        Ok(())
    }

    fn transition(
        &self,
        id: &str,
        token: &str,
        update: &TerminalUpdate,
        now: DateTime<Utc>,
    ) -> Result<Request, RequestStoreError> {
        if !update.status.is_terminal() {
            return Err(RequestStoreError::InvalidTransition(update.status));
        }

        let mut requests = self.lock()?;
        let request = find_mut(&mut requests, id)?;

        let holds_claim = request.claim.as_ref().is_some_and(|c| c.token == token);
        if request.status != RequestStatus::Pending || !holds_claim {
            return Err(RequestStoreError::Conflict {
                id: id.to_string(),
                status: request.status,
            });
        }

        request.status = update.status;
        request.decided_at = Some(now);
        request.decided_by = Some(update.decided_by.clone());
        request.denial_reason = update.reason.clone();
        request.claim = None;
        Ok(request.clone())
    }
}
