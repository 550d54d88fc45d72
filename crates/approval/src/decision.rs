//! Decisions and their outcomes

use rpbank_core::AccountType;
use rpbank_ledger::UserLedger;
use rpbank_requests::{Request, RequestStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the staff member asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Deny,
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" | "yes" => Ok(Decision::Approve),
            "deny" | "denied" | "no" => Ok(Decision::Deny),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// Why a request ended Denied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    AdminDenied,
    ValidationFailed(String),
    InsufficientFunds {
        account: AccountType,
        available: Decimal,
        required: Decimal,
    },
    UserNotFound,
    CreditScoreTooLow(i32),
    ActivePersonalLoan,
    Restricted(String),
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::AdminDenied => write!(f, "denied by staff"),
            DenialReason::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            DenialReason::InsufficientFunds {
                account,
                available,
                required,
            } => write!(
                f,
                "insufficient funds in {}: available {}, required {}",
                account, available, required
            ),
            DenialReason::UserNotFound => write!(f, "user not found"),
            DenialReason::CreditScoreTooLow(score) => {
                write!(f, "credit score {} is below every card tier", score)
            }
            DenialReason::ActivePersonalLoan => write!(f, "user already has an active personal loan"),
            DenialReason::Restricted(msg) => write!(f, "restricted: {}", msg),
        }
    }
}

/// Result of a `decide` call that reached a terminal state
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The request in its terminal state
    pub request: Request,
    pub reason: Option<DenialReason>,
    /// Post-decision ledger, present when the ledger was mutated
    pub ledger: Option<UserLedger>,
}

impl Outcome {
    pub fn status(&self) -> RequestStatus {
        self.request.status
    }

    pub fn is_approved(&self) -> bool {
        self.request.status == RequestStatus::Approved
    }
}

/// Request counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalStats {
    pub pending: usize,
    pub approved: usize,
    pub denied: usize,
}

impl ApprovalStats {
    pub fn total(&self) -> usize {
        self.pending + self.approved + self.denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decision() {
        assert_eq!("Approve".parse::<Decision>().unwrap(), Decision::Approve);
        assert_eq!("deny".parse::<Decision>().unwrap(), Decision::Deny);
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn test_reason_text() {
        let reason = DenialReason::InsufficientFunds {
            account: AccountType::Personal,
            available: dec!(100),
            required: dec!(150),
        };
        assert_eq!(
            reason.to_string(),
            "insufficient funds in Personal: available 100, required 150"
        );
    }
}
