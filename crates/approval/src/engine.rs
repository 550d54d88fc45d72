//! Approval engine

use crate::config::BankConfig;
use crate::decision::{ApprovalStats, Decision, DenialReason, Outcome};
use crate::error::ApprovalError;
use crate::rules;
use chrono::{DateTime, Utc};
use rpbank_bus::NotificationBus;
use rpbank_core::{CreditScore, UserId, UserRef};
use rpbank_ledger::{update_with_retry, LedgerError, LedgerStore, RetryError, UserLedger};
use rpbank_requests::{
    Claim, Request, RequestKind, RequestStatus, RequestStore, RequestStoreError, TerminalUpdate,
};
use rpbank_risk::RiskEngine;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a claimed request ends, before the terminal CAS
enum Resolution {
    Approved(UserLedger),
    Denied(DenialReason),
}

pub struct ApprovalEngine {
    requests: Arc<dyn RequestStore>,
    ledgers: Arc<dyn LedgerStore>,
    risk: RiskEngine,
    bus: NotificationBus,
    config: BankConfig,
}

impl ApprovalEngine {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        ledgers: Arc<dyn LedgerStore>,
        bus: NotificationBus,
        config: BankConfig,
    ) -> Self {
        let risk = RiskEngine::new(ledgers.clone(), config.risk.clone(), bus.clone())
            .with_max_attempts(config.max_apply_attempts);
        Self {
            requests,
            ledgers,
            risk,
            bus,
            config,
        }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    pub fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Create a ledger for a new user at the baseline score
    pub fn register(
        &self,
        display_name: &str,
        discord_handle: Option<String>,
    ) -> Result<UserLedger, ApprovalError> {
        let ledger = UserLedger::new(
            UserId::generate(),
            display_name,
            discord_handle,
            CreditScore::clamped(self.config.baseline_credit_score),
        );
        self.ledgers.create(&ledger)?;

        info!(user = %ledger.id, name = display_name, "user registered");
        self.bus.publish_ledger(&ledger);
        Ok(ledger)
    }

    /// Queue a request as Pending
    pub fn submit(&self, request: Request) -> Result<String, ApprovalError> {
        let id = self.requests.submit(&request)?;
        info!(request = %id, kind = %request.kind(), user = %request.user_id, "request submitted");
        self.bus.publish_request(&request);
        Ok(id)
    }

    pub fn list_pending(&self, kind: RequestKind) -> Result<Vec<Request>, ApprovalError> {
        Ok(self.requests.list_pending(kind)?)
    }

    pub fn list_all_pending(&self) -> Result<Vec<Request>, ApprovalError> {
        Ok(self.requests.list_by_status(None, RequestStatus::Pending)?)
    }

    pub fn request(&self, id: &str) -> Result<Request, ApprovalError> {
        self.requests.get(id).map_err(|e| match e {
            RequestStoreError::NotFound(id) => ApprovalError::NotFound(id),
            other => other.into(),
        })
    }

    /// Read-only ledger view, with expired restrictions cleared
    pub fn snapshot(&self, user: &UserRef) -> Result<UserLedger, ApprovalError> {
        Ok(self.ledgers.find(user)?)
    }

    pub fn stats(&self, kind: Option<RequestKind>) -> Result<ApprovalStats, ApprovalError> {
        Ok(ApprovalStats {
            pending: self.requests.count_by_status(kind, RequestStatus::Pending)?,
            approved: self.requests.count_by_status(kind, RequestStatus::Approved)?,
            denied: self.requests.count_by_status(kind, RequestStatus::Denied)?,
        })
    }

    pub fn decide(
        &self,
        id: &str,
        decision: Decision,
        actor: &str,
    ) -> Result<Outcome, ApprovalError> {
        self.decide_at(id, decision, actor, Utc::now())
    }

    /// Decide a request exactly once.
    ///
    /// Approval may still end Denied when the request fails validation or
    /// the user's restrictions. `Contention` leaves the request Pending and
    /// unclaimed, so the call can be repeated.
    pub fn decide_at(
        &self,
        id: &str,
        decision: Decision,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ApprovalError> {
        let request = self.request(id)?;
        let claim = self.claim(&request, now)?;

        let resolution = match decision {
            Decision::Deny => Ok(Resolution::Denied(DenialReason::AdminDenied)),
            Decision::Approve => self.resolve_approval(&request, now),
        };

        let resolution = match resolution {
            Ok(resolution) => resolution,
            Err(e) => {
                if let Err(release_err) = self.requests.release(&request.id, &claim.token) {
                    warn!(request = %request.id, error = %release_err, "failed to release claim");
                }
                return Err(e);
            }
        };

        let (update, reason, ledger) = match resolution {
            Resolution::Approved(ledger) => (TerminalUpdate::approved(actor), None, Some(ledger)),
            Resolution::Denied(reason) => (
                TerminalUpdate::denied(actor, reason.to_string()),
                Some(reason),
                None,
            ),
        };

        let decided = self
            .requests
            .transition(&request.id, &claim.token, &update, now)
            .map_err(|e| match e {
                // lease went stale and was taken over; the new holder sees
                // this request's transaction and does not apply it again
                RequestStoreError::Conflict { id, status } => {
                    warn!(request = %id, status = status.as_str(), "claim lost before terminal write");
                    ApprovalError::AlreadyProcessed { id, status }
                }
                other => {
                    if ledger.is_some() {
                        error!(
                            request = %request.id,
                            error = %other,
                            "ledger updated but request could not be marked approved"
                        );
                    }
                    other.into()
                }
            })?;

        match &reason {
            Some(reason) => info!(request = %decided.id, actor, %reason, "request denied"),
            None => info!(request = %decided.id, actor, "request approved"),
        }

        self.bus.publish_request(&decided);
        if let Some(ledger) = &ledger {
            self.bus.publish_ledger(ledger);
        }

        Ok(Outcome {
            request: decided,
            reason,
            ledger,
        })
    }

    fn claim(&self, request: &Request, now: DateTime<Utc>) -> Result<Claim, ApprovalError> {
        self.requests
            .claim(&request.id, now, self.config.claim_ttl())
            .map_err(|e| match e {
                RequestStoreError::Conflict { id, status } => {
                    ApprovalError::AlreadyProcessed { id, status }
                }
                RequestStoreError::NotFound(id) => ApprovalError::NotFound(id),
                other => other.into(),
            })
    }

    fn resolve_approval(
        &self,
        request: &Request,
        now: DateTime<Utc>,
    ) -> Result<Resolution, ApprovalError> {
        let result = update_with_retry(
            self.ledgers.as_ref(),
            &request.user_id,
            self.config.max_apply_attempts,
            now,
            |ledger| rules::plan(request, ledger, &self.risk, now),
        );

        match result {
            Ok(ledger) => Ok(Resolution::Approved(ledger)),
            Err(RetryError::Rejected(reason)) => Ok(Resolution::Denied(reason)),
            Err(RetryError::Ledger(LedgerError::UserNotFound(user))) => {
                warn!(request = %request.id, %user, "orphaned request: user has no ledger");
                Ok(Resolution::Denied(DenialReason::UserNotFound))
            }
            Err(RetryError::Ledger(LedgerError::InsufficientFunds {
                account,
                available,
                required,
            })) => Ok(Resolution::Denied(DenialReason::InsufficientFunds {
                account,
                available,
                required,
            })),
            Err(RetryError::Ledger(LedgerError::Overflow)) => {
                warn!(request = %request.id, "amount overflows balance");
                Ok(Resolution::Denied(DenialReason::ValidationFailed(
                    "amount overflows balance".to_string(),
                )))
            }
            Err(RetryError::Ledger(e)) => Err(e.into()),
            Err(RetryError::Contention { attempts }) => {
                warn!(request = %request.id, attempts, "ledger contention, releasing request");
                Err(ApprovalError::Contention {
                    id: request.id.clone(),
                    attempts,
                })
            }
        }
    }
}
