//! Risk flags and time-bound restrictions
//!
//! Time-bound flags carry their own expiry. Expired flags are cleared lazily
//! whenever a ledger is read or mutated (see `RiskFlags::clear_expired`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A restriction that is active until `expires_at` (or indefinitely if None)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedFlag {
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TimedFlag {
    pub fn until(expires_at: DateTime<Utc>) -> Self {
        Self {
            active: true,
            expires_at: Some(expires_at),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired(now)
    }

    /// Extend to `expires_at`, keeping a later existing expiry
    pub fn extend_to(&mut self, expires_at: DateTime<Utc>) {
        let keep_existing = self.active && self.expires_at.is_some_and(|at| at > expires_at);
        if !keep_existing {
            *self = TimedFlag::until(expires_at);
        }
    }

    /// Returns true if the flag was expired and has been cleared
    pub fn clear_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            *self = TimedFlag::default();
            true
        } else {
            false
        }
    }
}

/// Creditworthiness restrictions attached to a ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub is_frozen: bool,
    pub credit_frozen: TimedFlag,
    pub credit_card_suspended: TimedFlag,
    pub is_loan_blacklisted: bool,
    pub new_loan_blocked_until: Option<DateTime<Utc>>,
    pub is_suspicious: bool,
    pub internal_affairs_triggered: bool,
    /// Added to the annual rate of newly issued loans
    pub loan_interest_surcharge: Option<Decimal>,
}

impl RiskFlags {
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.credit_frozen.is_expired(now)
            || self.credit_card_suspended.is_expired(now)
            || self.new_loan_blocked_until.is_some_and(|at| now >= at)
    }

    /// Clear every time-bound flag whose expiry has passed.
    /// Returns true if anything changed.
    pub fn clear_expired(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = self.credit_frozen.clear_if_expired(now);
        changed |= self.credit_card_suspended.clear_if_expired(now);
        if self.new_loan_blocked_until.is_some_and(|at| now >= at) {
            self.new_loan_blocked_until = None;
            changed = true;
        }
        changed
    }

    pub fn is_credit_frozen(&self, now: DateTime<Utc>) -> bool {
        self.credit_frozen.is_active_at(now)
    }

    pub fn is_credit_card_suspended(&self, now: DateTime<Utc>) -> bool {
        self.credit_card_suspended.is_active_at(now)
    }

    pub fn is_new_loan_blocked(&self, now: DateTime<Utc>) -> bool {
        self.new_loan_blocked_until.is_some_and(|at| now < at)
    }
}
