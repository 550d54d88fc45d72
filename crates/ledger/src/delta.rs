//! Ledger deltas - pure descriptions of a change to one ledger
//!
//! A delta is computed from a snapshot and applied by the store against the
//! snapshot's version. `LedgerDelta::apply` is all-or-nothing: it returns a
//! new ledger or an error, never a partially updated one.

use crate::error::LedgerError;
use crate::model::{DebitCard, LoanEntry, PenaltyRecord, Transaction, TransactionStatus, UserLedger};
use chrono::{DateTime, Utc};
use rpbank_core::{AccountType, Amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceChange {
    /// Signed movement on one account (and on the overall balance)
    Adjust { account: AccountType, amount: Decimal },
    /// Replace an account balance outright
    Set { account: AccountType, amount: Amount },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreChange {
    Set(i32),
    Adjust(i32),
    /// Lower the score to at most this value
    CapAt(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagUpdate {
    Frozen(bool),
    CreditFrozenUntil(DateTime<Utc>),
    CreditCardSuspendedUntil(DateTime<Utc>),
    LoanBlacklisted(bool),
    NewLoanBlockedUntil(DateTime<Utc>),
    Suspicious(bool),
    InternalAffairs(bool),
    LoanInterestSurcharge(Decimal),
}

/// A transaction waiting to be stamped and appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub proof_link: Option<String>,
    pub request_id: Option<String>,
}

impl TransactionDraft {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
            status: TransactionStatus::Completed,
            proof_link: None,
            request_id: None,
        }
    }

    pub fn proof(mut self, link: Option<String>) -> Self {
        self.proof_link = link;
        self
    }

    pub fn request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    pub balances: Vec<BalanceChange>,
    pub score: Option<ScoreChange>,
    pub flags: Vec<FlagUpdate>,
    pub has_credit_card: Option<bool>,
    pub issue_debit_card: bool,
    pub transactions: Vec<TransactionDraft>,
    pub loans: Vec<LoanEntry>,
    pub penalties: Vec<PenaltyRecord>,
}

impl LedgerDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(mut self, account: AccountType, amount: Decimal) -> Self {
        self.balances.push(BalanceChange::Adjust { account, amount });
        self
    }

    pub fn debit(mut self, account: AccountType, amount: Decimal) -> Self {
        self.balances.push(BalanceChange::Adjust {
            account,
            amount: -amount,
        });
        self
    }

    pub fn set_balance(mut self, account: AccountType, amount: Amount) -> Self {
        self.balances.push(BalanceChange::Set { account, amount });
        self
    }

    pub fn score(mut self, change: ScoreChange) -> Self {
        self.score = Some(change);
        self
    }

    pub fn flag(mut self, update: FlagUpdate) -> Self {
        self.flags.push(update);
        self
    }

    pub fn credit_card(mut self, has_card: bool) -> Self {
        self.has_credit_card = Some(has_card);
        self
    }

    pub fn issue_debit_card(mut self) -> Self {
        self.issue_debit_card = true;
        self
    }

    pub fn transaction(mut self, draft: TransactionDraft) -> Self {
        self.transactions.push(draft);
        self
    }

    pub fn loan(mut self, entry: LoanEntry) -> Self {
        self.loans.push(entry);
        self
    }

    pub fn penalty(mut self, record: PenaltyRecord) -> Self {
        self.penalties.push(record);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Compute the ledger that results from applying this delta at `now`.
    ///
    /// Expired time-bound flags are cleared first. The result has its version
    /// bumped and satisfies the balance invariant.
    pub fn apply(&self, ledger: &UserLedger, now: DateTime<Utc>) -> Result<UserLedger, LedgerError> {
        let mut next = ledger.clone();
        next.flags.clear_expired(now);

        for change in &self.balances {
            apply_balance(&mut next, change)?;
        }

        if let Some(change) = self.score {
            next.credit_score = match change {
                ScoreChange::Set(value) => value.into(),
                ScoreChange::Adjust(delta) => next.credit_score.adjust(delta),
                ScoreChange::CapAt(ceiling) => next.credit_score.cap_at(ceiling),
            };
        }

        for update in &self.flags {
            apply_flag(&mut next, update);
        }

        if let Some(has_card) = self.has_credit_card {
            next.has_credit_card = has_card;
        }
        if self.issue_debit_card && next.debit_card.is_none() {
            next.debit_card = Some(DebitCard::issue(now));
        }

        next.transactions
            .extend(self.transactions.iter().map(|draft| Transaction {
                date: now,
                description: draft.description.clone(),
                amount: draft.amount,
                status: draft.status,
                proof_link: draft.proof_link.clone(),
                request_id: draft.request_id.clone(),
            }));
        next.loan_history.extend(self.loans.iter().cloned());
        next.penalties.extend(self.penalties.iter().cloned());

        next.check_invariant()?;
        next.version = ledger.version + 1;
        next.updated_at = now;
        Ok(next)
    }
}

fn apply_balance(ledger: &mut UserLedger, change: &BalanceChange) -> Result<(), LedgerError> {
    let (account, movement) = match change {
        BalanceChange::Adjust { account, amount } => (*account, *amount),
        BalanceChange::Set { account, amount } => {
            let current = ledger.balance(*account).value();
            (*account, amount.value() - current)
        }
    };

    let current = ledger.balance(account);
    let raw = current
        .value()
        .checked_add(movement)
        .ok_or(LedgerError::Overflow)?;
    let updated = Amount::new(raw).map_err(|_| LedgerError::InsufficientFunds {
        account,
        available: current.value(),
        required: -movement,
    })?;

    ledger.overall_balance = ledger
        .overall_balance
        .checked_add(movement)
        .ok_or(LedgerError::Overflow)?;
    ledger.balances.insert(account, updated);
    Ok(())
}

fn apply_flag(ledger: &mut UserLedger, update: &FlagUpdate) {
    let flags = &mut ledger.flags;
    match update {
        FlagUpdate::Frozen(value) => flags.is_frozen = *value,
        FlagUpdate::CreditFrozenUntil(at) => flags.credit_frozen.extend_to(*at),
        FlagUpdate::CreditCardSuspendedUntil(at) => flags.credit_card_suspended.extend_to(*at),
        FlagUpdate::LoanBlacklisted(value) => flags.is_loan_blacklisted = *value,
        FlagUpdate::NewLoanBlockedUntil(at) => {
            let later = flags.new_loan_blocked_until.map_or(*at, |existing| existing.max(*at));
            flags.new_loan_blocked_until = Some(later);
        }
        FlagUpdate::Suspicious(value) => flags.is_suspicious = *value,
        FlagUpdate::InternalAffairs(value) => flags.internal_affairs_triggered = *value,
        FlagUpdate::LoanInterestSurcharge(rate) => flags.loan_interest_surcharge = Some(*rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rpbank_core::{CreditScore, UserId};
    use rust_decimal_macros::dec;

    fn ledger() -> UserLedger {
        UserLedger::new(
            UserId::new("RPB-DELTA001").unwrap(),
            "Dana",
            None,
            CreditScore::clamped(600),
        )
    }

    #[test]
    fn test_credit_updates_account_and_overall() {
        let delta = LedgerDelta::new()
            .credit(AccountType::Savings, dec!(250))
            .transaction(TransactionDraft::new("Account Opened", dec!(250)));

        let next = delta.apply(&ledger(), Utc::now()).unwrap();
        assert_eq!(next.balance(AccountType::Savings).value(), dec!(250));
        assert_eq!(next.overall_balance, dec!(250));
        assert_eq!(next.transactions.len(), 1);
        assert_eq!(next.version, 1);
    }

    #[test]
    fn test_overdraft_rejected_without_partial_state() {
        let start = LedgerDelta::new()
            .credit(AccountType::Personal, dec!(100))
            .apply(&ledger(), Utc::now())
            .unwrap();

        let delta = LedgerDelta::new()
            .credit(AccountType::Savings, dec!(10))
            .debit(AccountType::Personal, dec!(150));
        let err = delta.apply(&start, Utc::now()).unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { account: AccountType::Personal, .. }
        ));
        // Input snapshot untouched
        assert_eq!(start.balance(AccountType::Savings).value(), dec!(0));
        assert_eq!(start.overall_balance, dec!(100));
    }

    #[test]
    fn test_set_balance_keeps_invariant() {
        let start = LedgerDelta::new()
            .credit(AccountType::CreditCard, dec!(40))
            .credit(AccountType::Personal, dec!(60))
            .apply(&ledger(), Utc::now())
            .unwrap();

        let next = LedgerDelta::new()
            .set_balance(AccountType::CreditCard, Amount::new(dec!(15000)).unwrap())
            .credit_card(true)
            .apply(&start, Utc::now())
            .unwrap();

        assert_eq!(next.balance(AccountType::CreditCard).value(), dec!(15000));
        assert_eq!(next.overall_balance, dec!(15060));
        assert!(next.has_credit_card);
        assert!(next.check_invariant().is_ok());
    }

    #[test]
    fn test_score_changes_are_clamped() {
        let base = ledger();
        let now = Utc::now();

        let next = LedgerDelta::new().score(ScoreChange::Adjust(-500)).apply(&base, now).unwrap();
        assert_eq!(next.credit_score.value(), 300);

        let next = LedgerDelta::new().score(ScoreChange::Set(1000)).apply(&base, now).unwrap();
        assert_eq!(next.credit_score.value(), 850);

        let next = LedgerDelta::new().score(ScoreChange::CapAt(399)).apply(&base, now).unwrap();
        assert_eq!(next.credit_score.value(), 399);
    }

    #[test]
    fn test_flag_updates() {
        let now = Utc::now();
        let next = LedgerDelta::new()
            .flag(FlagUpdate::CreditFrozenUntil(now + Duration::days(5)))
            .flag(FlagUpdate::Suspicious(true))
            .flag(FlagUpdate::LoanInterestSurcharge(dec!(0.10)))
            .apply(&ledger(), now)
            .unwrap();

        assert!(next.flags.is_credit_frozen(now));
        assert!(next.flags.is_suspicious);
        assert_eq!(next.flags.loan_interest_surcharge, Some(dec!(0.10)));
    }

    #[test]
    fn test_debit_card_issued_once() {
        let now = Utc::now();
        let first = LedgerDelta::new().issue_debit_card().apply(&ledger(), now).unwrap();
        let number = first.debit_card.clone().unwrap().number;

        let second = LedgerDelta::new().issue_debit_card().apply(&first, now).unwrap();
        assert_eq!(second.debit_card.unwrap().number, number);
    }

    #[test]
    fn test_overflow_is_not_reported_as_overdraft() {
        let big = Decimal::MAX - dec!(1);
        let start = LedgerDelta::new()
            .credit(AccountType::Personal, big)
            .apply(&ledger(), Utc::now())
            .unwrap();

        // account itself overflows
        let err = LedgerDelta::new()
            .credit(AccountType::Personal, big)
            .apply(&start, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Overflow));

        // only the overall balance overflows
        let err = LedgerDelta::new()
            .credit(AccountType::Savings, big)
            .apply(&start, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Overflow));
    }

    #[test]
    fn test_empty_delta() {
        assert!(LedgerDelta::new().is_empty());
        assert!(!LedgerDelta::new().credit_card(true).is_empty());
    }
}
