//! Ledger store contract and the optimistic update loop

use crate::delta::LedgerDelta;
use crate::error::LedgerError;
use crate::model::UserLedger;
use chrono::{DateTime, Utc};
use rpbank_core::{UserId, UserRef};
use thiserror::Error;
use tracing::debug;

/// Durable owner of every `UserLedger`.
///
/// Implementations must apply a delta atomically and only when
/// `expected_version` matches the stored version.
pub trait LedgerStore: Send + Sync {
    /// Persist a newly registered ledger
    fn create(&self, ledger: &UserLedger) -> Result<(), LedgerError>;

    /// Raw stored state, without lazy expiry
    fn load(&self, id: &UserId) -> Result<UserLedger, LedgerError>;

    /// Resolve a lookup key to the bank id
    fn resolve(&self, user: &UserRef) -> Result<UserId, LedgerError>;

    fn list_users(&self) -> Result<Vec<UserId>, LedgerError>;

    /// Apply `delta` iff the stored version equals `expected_version`
    fn apply_delta_at(
        &self,
        id: &UserId,
        delta: &LedgerDelta,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<UserLedger, LedgerError>;

    fn apply_delta(
        &self,
        id: &UserId,
        delta: &LedgerDelta,
        expected_version: u64,
    ) -> Result<UserLedger, LedgerError> {
        self.apply_delta_at(id, delta, expected_version, Utc::now())
    }

    /// Snapshot with expired flags cleared as of `now`
    fn get_at(&self, id: &UserId, now: DateTime<Utc>) -> Result<UserLedger, LedgerError> {
        Ok(self.load(id)?.with_expired_cleared(now))
    }

    fn get(&self, id: &UserId) -> Result<UserLedger, LedgerError> {
        self.get_at(id, Utc::now())
    }

    fn find(&self, user: &UserRef) -> Result<UserLedger, LedgerError> {
        let id = self.resolve(user)?;
        self.get(&id)
    }
}

/// Failure of `update_with_retry`
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// The planner refused to produce a delta
    #[error("rejected: {0:?}")]
    Rejected(E),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Ledger still contended after {attempts} attempts")]
    Contention { attempts: u32 },
}

/// Read the current ledger, plan a delta from it, and apply it against the
/// version that was read. Version conflicts re-run the whole cycle, up to
/// `max_attempts` times.
pub fn update_with_retry<F, E>(
    store: &dyn LedgerStore,
    id: &UserId,
    max_attempts: u32,
    now: DateTime<Utc>,
    mut plan: F,
) -> Result<UserLedger, RetryError<E>>
where
    F: FnMut(&UserLedger) -> Result<LedgerDelta, E>,
{
    let attempts = max_attempts.max(1);

    for attempt in 1..=attempts {
        let current = store.get_at(id, now)?;
        let delta = plan(&current).map_err(RetryError::Rejected)?;

        match store.apply_delta_at(id, &delta, current.version, now) {
            Ok(updated) => return Ok(updated),
            Err(LedgerError::VersionConflict { expected, actual, .. }) => {
                debug!(user = %id, attempt, expected, actual, "ledger version conflict, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(RetryError::Contention { attempts })
}
