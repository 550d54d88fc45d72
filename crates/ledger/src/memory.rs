//! In-memory ledger store

use crate::delta::LedgerDelta;
use crate::error::LedgerError;
use crate::model::UserLedger;
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use rpbank_core::{UserId, UserRef};
use std::collections::HashMap;
use std::sync::RwLock;

/// Ledger store held in process memory. Deltas are serialized by a single
/// write lock; the version check still applies so callers observe the same
/// conflicts as with the SQLite store.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    ledgers: RwLock<HashMap<UserId, UserLedger>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Storage("ledger lock poisoned".to_string())
}

impl LedgerStore for InMemoryLedgerStore {
    fn create(&self, ledger: &UserLedger) -> Result<(), LedgerError> {
        let mut ledgers = self.ledgers.write().map_err(poisoned)?;

        if ledgers.contains_key(&ledger.id) {
            return Err(LedgerError::DuplicateUser(ledger.id.to_string()));
        }
        if let Some(handle) = &ledger.discord_handle {
            if ledgers.values().any(|l| l.discord_handle.as_ref() == Some(handle)) {
                return Err(LedgerError::DuplicateUser(handle.clone()));
            }
        }

        ledgers.insert(ledger.id.clone(), ledger.clone());
        Ok(())
    }

    fn load(&self, id: &UserId) -> Result<UserLedger, LedgerError> {
        self.ledgers
            .read()
            .map_err(poisoned)?
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::UserNotFound(id.to_string()))
    }

    fn resolve(&self, user: &UserRef) -> Result<UserId, LedgerError> {
        self.ledgers
            .read()
            .map_err(poisoned)?
            .values()
            .find(|l| l.matches(user))
            .map(|l| l.id.clone())
            .ok_or_else(|| LedgerError::UserNotFound(user.to_string()))
    }

    fn list_users(&self) -> Result<Vec<UserId>, LedgerError> {
        let mut ids: Vec<UserId> = self.ledgers.read().map_err(poisoned)?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn apply_delta_at(
        &self,
        id: &UserId,
        delta: &LedgerDelta,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<UserLedger, LedgerError> {
        let mut ledgers = self.ledgers.write().map_err(poisoned)?;
        let current = ledgers
            .get(id)
            .ok_or_else(|| LedgerError::UserNotFound(id.to_string()))?;

        if current.version != expected_version {
            return Err(LedgerError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }

        let next = delta.apply(current, now)?;
        ledgers.insert(id.clone(), next.clone());
        Ok(next)
    }
}
