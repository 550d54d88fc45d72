//! Request data structures

use chrono::{DateTime, Duration, Utc};
use rpbank_core::{AccountType, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Visible status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Awaiting a decision
    Pending,
    /// Approved and applied to the ledger
    Approved,
    /// Denied by staff or by validation
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "denied" => Some(RequestStatus::Denied),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum RequestKind {
    AccountOpen,
    Deposit,
    Withdrawal,
    CreditCard,
    Loan,
}

/// Know-your-customer answers collected with an account opening
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycDetails {
    pub legal_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub loan_type: String,
    pub amount: Decimal,
    pub term_months: u32,
    /// Fraction, e.g. 0.05 for 5%
    pub annual_rate: Decimal,
    pub credit_score_at_application: i32,
    pub collateral_link: Option<String>,
    pub down_payment: Option<Decimal>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestPayload {
    AccountOpen {
        account_type: AccountType,
        initial_deposit: Decimal,
        proof_link: Option<String>,
        #[serde(default)]
        kyc: KycDetails,
    },
    Deposit {
        amount: Decimal,
        proof_link: Option<String>,
    },
    Withdrawal {
        amount: Decimal,
        source_account: AccountType,
    },
    CreditCard {
        credit_score_at_application: i32,
    },
    Loan(LoanApplication),
}

impl RequestPayload {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestPayload::AccountOpen { .. } => RequestKind::AccountOpen,
            RequestPayload::Deposit { .. } => RequestKind::Deposit,
            RequestPayload::Withdrawal { .. } => RequestKind::Withdrawal,
            RequestPayload::CreditCard { .. } => RequestKind::CreditCard,
            RequestPayload::Loan(_) => RequestKind::Loan,
        }
    }
}

/// Lease held by the approver currently processing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub token: String,
    pub claimed_at: DateTime<Utc>,
}

impl Claim {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            claimed_at: now,
        }
    }

    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now >= self.claimed_at + ttl
    }
}

/// A customer request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub user_id: UserId,
    pub user_name: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub payload: RequestPayload,
    pub claim: Option<Claim>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub denial_reason: Option<String>,
}

impl Request {
    pub fn new(user_id: UserId, user_name: impl Into<String>, payload: RequestPayload) -> Self {
        Self {
            id: format!("REQ-{}", uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()),
            user_id,
            user_name: user_name.into(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            payload,
            claim: None,
            decided_at: None,
            decided_by: None,
            denial_reason: None,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.payload.kind()
    }

    /// Pending and not held by a live claim
    pub fn is_claimable(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.status == RequestStatus::Pending
            && self.claim.as_ref().map_or(true, |c| c.is_stale(now, ttl))
    }
}
