//! Ledger records

use crate::error::LedgerError;
use crate::flags::RiskFlags;
use chrono::{DateTime, Utc};
use rpbank_core::{AccountType, Amount, CreditScore, UserId, UserRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Loan type limited to one active entry per user
pub const PERSONAL_LOAN: &str = "Personal Loan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Completed,
}

/// One line of the append-only transaction history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: DateTime<Utc>,
    pub description: String,
    /// Signed: credits positive, debits negative
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub proof_link: Option<String>,
    /// Request that produced this transaction, if any
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanEntry {
    /// Id of the originating loan request
    pub id: String,
    pub loan_type: String,
    pub principal: Decimal,
    pub term_months: u32,
    pub annual_rate: Decimal,
    pub monthly_payment: Decimal,
    pub date_issued: DateTime<Utc>,
    pub status: LoanStatus,
    pub collateral_link: Option<String>,
    pub down_payment: Option<Decimal>,
    pub region: Option<String>,
}

impl LoanEntry {
    pub fn is_active_personal_loan(&self) -> bool {
        self.loan_type == PERSONAL_LOAN && self.status == LoanStatus::Active
    }
}

/// Opaque debit card artifact issued with the first Personal account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitCard {
    pub number: String,
    pub issued_at: DateTime<Utc>,
}

impl DebitCard {
    pub fn issue(now: DateTime<Utc>) -> Self {
        let digits: String = uuid::Uuid::new_v4()
            .as_u128()
            .to_string()
            .chars()
            .take(16)
            .collect();
        Self {
            number: digits,
            issued_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub category: String,
    pub tier: u8,
    pub score_before: CreditScore,
    pub score_after: CreditScore,
    pub applied_at: DateTime<Utc>,
}

/// The per-user ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLedger {
    pub id: UserId,
    pub display_name: String,
    pub discord_handle: Option<String>,
    pub balances: BTreeMap<AccountType, Amount>,
    /// Maintained alongside `balances`; always equal to their sum
    pub overall_balance: Decimal,
    pub credit_score: CreditScore,
    pub flags: RiskFlags,
    pub has_credit_card: bool,
    pub debit_card: Option<DebitCard>,
    pub transactions: Vec<Transaction>,
    pub loan_history: Vec<LoanEntry>,
    pub penalties: Vec<PenaltyRecord>,
    /// Optimistic concurrency token, bumped by every applied delta
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserLedger {
    /// A freshly registered ledger: every account at zero, score at `baseline`
    pub fn new(
        id: UserId,
        display_name: impl Into<String>,
        discord_handle: Option<String>,
        baseline: CreditScore,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            display_name: display_name.into(),
            discord_handle,
            balances: AccountType::iter().map(|a| (a, Amount::ZERO)).collect(),
            overall_balance: Decimal::ZERO,
            credit_score: baseline,
            flags: RiskFlags::default(),
            has_credit_card: false,
            debit_card: None,
            transactions: Vec::new(),
            loan_history: Vec::new(),
            penalties: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self, account: AccountType) -> Amount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn balance_sum(&self) -> Decimal {
        self.balances.values().map(|a| a.value()).sum()
    }

    pub fn check_invariant(&self) -> Result<(), LedgerError> {
        let sum = self.balance_sum();
        if sum != self.overall_balance {
            return Err(LedgerError::BalanceInvariant {
                overall: self.overall_balance,
                sum,
            });
        }
        Ok(())
    }

    pub fn has_active_personal_loan(&self) -> bool {
        self.loan_history.iter().any(LoanEntry::is_active_personal_loan)
    }

    pub fn matches(&self, user: &UserRef) -> bool {
        match user {
            UserRef::BankId(id) => &self.id == id,
            UserRef::DiscordHandle(handle) => self.discord_handle.as_deref() == Some(handle.as_str()),
        }
    }

    /// Snapshot view with expired time-bound flags cleared
    pub fn with_expired_cleared(mut self, now: DateTime<Utc>) -> Self {
        self.flags.clear_expired(now);
        self
    }
}
