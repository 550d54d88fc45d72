//! Risk engine - score updates, penalties and the expiry sweep
//!
//! All writes go through the ledger store as single deltas under the
//! optimistic retry loop, so a penalty never races a concurrent approval.

use crate::config::RiskConfig;
use crate::credit::credit_limit_for;
use crate::error::RiskError;
use crate::penalty::Penalty;
use chrono::{DateTime, Utc};
use rpbank_bus::NotificationBus;
use rpbank_core::{CreditScore, UserRef};
use rpbank_ledger::{
    update_with_retry, LedgerDelta, LedgerError, LedgerStore, PenaltyRecord, ScoreChange,
    UserLedger,
};
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub struct RiskEngine {
    ledgers: Arc<dyn LedgerStore>,
    config: RiskConfig,
    bus: NotificationBus,
    max_attempts: u32,
}

impl RiskEngine {
    pub fn new(ledgers: Arc<dyn LedgerStore>, config: RiskConfig, bus: NotificationBus) -> Self {
        Self {
            ledgers,
            config,
            bus,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Bound on read-plan-apply cycles per write
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Card limit for `score`; None means the application is auto-denied
    pub fn credit_limit(&self, score: i32) -> Option<Decimal> {
        credit_limit_for(score, &self.config.credit_tiers)
    }

    /// Set a user's score, clamped to the valid range
    pub fn update_score(&self, user: &UserRef, value: i32) -> Result<UserLedger, RiskError> {
        let id = self.ledgers.resolve(user)?;
        let updated = update_with_retry(
            self.ledgers.as_ref(),
            &id,
            self.max_attempts,
            Utc::now(),
            |_| Ok::<_, Infallible>(LedgerDelta::new().score(ScoreChange::Set(value))),
        )?;

        info!(user = %id, score = updated.credit_score.value(), "credit score updated");
        self.bus.publish_ledger(&updated);
        Ok(updated)
    }

    pub fn apply_penalty(&self, user: &UserRef, penalty: Penalty) -> Result<UserLedger, RiskError> {
        self.apply_penalty_at(user, penalty, Utc::now())
    }

    /// Apply one catalog entry as a single delta and record it in the
    /// ledger's penalty history
    pub fn apply_penalty_at(
        &self,
        user: &UserRef,
        penalty: Penalty,
        now: DateTime<Utc>,
    ) -> Result<UserLedger, RiskError> {
        let id = self.ledgers.resolve(user)?;
        let effect = penalty.effect(&self.config, now);

        let updated = update_with_retry(self.ledgers.as_ref(), &id, self.max_attempts, now, |ledger| {
            let before = ledger.credit_score;
            let after = effect.score.map_or(before, |change| scored(before, change));

            let mut delta = LedgerDelta::new().penalty(PenaltyRecord {
                category: penalty.category.title().to_string(),
                tier: penalty.tier.level(),
                score_before: before,
                score_after: after,
                applied_at: now,
            });
            delta.score = effect.score;
            delta.flags = effect.flags.clone();
            Ok::<_, Infallible>(delta)
        })?;

        info!(
            user = %id,
            penalty = %penalty,
            score = updated.credit_score.value(),
            "penalty applied"
        );
        self.bus.publish_ledger(&updated);
        Ok(updated)
    }

    /// Persist the clearing of expired time-bound flags on every ledger.
    ///
    /// Returns how many ledgers changed. A ledger that another writer
    /// touched in the meantime is skipped; that write already cleared it.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RiskError> {
        let mut cleared = 0;

        for id in self.ledgers.list_users()? {
            let ledger = self.ledgers.load(&id)?;
            if !ledger.flags.has_expired(now) {
                continue;
            }

            match self
                .ledgers
                .apply_delta_at(&id, &LedgerDelta::new(), ledger.version, now)
            {
                Ok(updated) => {
                    cleared += 1;
                    self.bus.publish_ledger(&updated);
                }
                Err(LedgerError::VersionConflict { .. }) => {
                    debug!(user = %id, "ledger changed during sweep, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        if cleared > 0 {
            info!(cleared, "expired risk flags cleared");
        }
        Ok(cleared)
    }
}

fn scored(score: CreditScore, change: ScoreChange) -> CreditScore {
    match change {
        ScoreChange::Set(value) => CreditScore::clamped(value),
        ScoreChange::Adjust(delta) => score.adjust(delta),
        ScoreChange::CapAt(ceiling) => score.cap_at(ceiling),
    }
}
