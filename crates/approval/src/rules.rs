//! Per-kind approval rules
//!
//! `plan` turns an approved request and the current ledger snapshot into
//! the delta to apply, or the reason the request must be denied instead.
//! It is pure, so the engine can re-run it after a version conflict.

use crate::decision::DenialReason;
use chrono::{DateTime, Utc};
use rpbank_core::{AccountType, Amount};
use rpbank_ledger::{
    LedgerDelta, LoanEntry, LoanStatus, TransactionDraft, UserLedger, PERSONAL_LOAN,
};
use rpbank_requests::{LoanApplication, Request, RequestPayload};
use rpbank_risk::{monthly_payment, RiskEngine};
use rust_decimal::Decimal;

pub fn plan(
    request: &Request,
    ledger: &UserLedger,
    risk: &RiskEngine,
    now: DateTime<Utc>,
) -> Result<LedgerDelta, DenialReason> {
    // A delta carrying this request id already landed; the decision was
    // interrupted before the request was marked terminal
    if ledger
        .transactions
        .iter()
        .any(|tx| tx.request_id.as_deref() == Some(request.id.as_str()))
    {
        return Ok(LedgerDelta::new());
    }

    match &request.payload {
        RequestPayload::AccountOpen {
            account_type,
            initial_deposit,
            proof_link,
            ..
        } => account_open(request, *account_type, *initial_deposit, proof_link.clone()),
        RequestPayload::Deposit { amount, proof_link } => {
            deposit(request, *amount, proof_link.clone())
        }
        RequestPayload::Withdrawal {
            amount,
            source_account,
        } => withdrawal(request, ledger, *amount, *source_account),
        RequestPayload::CreditCard {
            credit_score_at_application,
        } => credit_card(request, ledger, risk, *credit_score_at_application, now),
        RequestPayload::Loan(application) => loan(request, ledger, application, now),
    }
}

fn require_positive(what: &str, amount: Decimal) -> Result<(), DenialReason> {
    if amount <= Decimal::ZERO {
        return Err(DenialReason::ValidationFailed(format!(
            "{} must be positive, got {}",
            what, amount
        )));
    }
    Ok(())
}

fn account_open(
    request: &Request,
    account_type: AccountType,
    initial_deposit: Decimal,
    proof_link: Option<String>,
) -> Result<LedgerDelta, DenialReason> {
    if initial_deposit < Decimal::ZERO {
        return Err(DenialReason::ValidationFailed(format!(
            "initial deposit cannot be negative, got {}",
            initial_deposit
        )));
    }
    if account_type == AccountType::CreditCard {
        return Err(DenialReason::ValidationFailed(
            "credit card accounts are opened by a card application".to_string(),
        ));
    }

    let mut delta = LedgerDelta::new()
        .credit(account_type, initial_deposit)
        .transaction(
            TransactionDraft::new(format!("Account Opened: {}", account_type), initial_deposit)
                .proof(proof_link)
                .request(&request.id),
        );
    if account_type == AccountType::Personal {
        delta = delta.issue_debit_card();
    }
    Ok(delta)
}

fn deposit(
    request: &Request,
    amount: Decimal,
    proof_link: Option<String>,
) -> Result<LedgerDelta, DenialReason> {
    require_positive("deposit amount", amount)?;

    Ok(LedgerDelta::new()
        .credit(AccountType::Personal, amount)
        .transaction(
            TransactionDraft::new("Deposit", amount)
                .proof(proof_link)
                .request(&request.id),
        ))
}

fn withdrawal(
    request: &Request,
    ledger: &UserLedger,
    amount: Decimal,
    source_account: AccountType,
) -> Result<LedgerDelta, DenialReason> {
    require_positive("withdrawal amount", amount)?;
    if ledger.flags.is_frozen {
        return Err(DenialReason::Restricted("account is frozen".to_string()));
    }

    let available = ledger.balance(source_account).value();
    if available < amount {
        return Err(DenialReason::InsufficientFunds {
            account: source_account,
            available,
            required: amount,
        });
    }

    Ok(LedgerDelta::new()
        .debit(source_account, amount)
        .transaction(
            TransactionDraft::new(format!("Withdrawal from {}", source_account), -amount)
                .request(&request.id),
        ))
}

fn credit_card(
    request: &Request,
    ledger: &UserLedger,
    risk: &RiskEngine,
    score: i32,
    now: DateTime<Utc>,
) -> Result<LedgerDelta, DenialReason> {
    let limit = risk
        .credit_limit(score)
        .ok_or(DenialReason::CreditScoreTooLow(score))?;

    let flags = &ledger.flags;
    if flags.is_frozen {
        return Err(DenialReason::Restricted("account is frozen".to_string()));
    }
    if flags.is_credit_frozen(now) {
        return Err(DenialReason::Restricted("credit is frozen".to_string()));
    }
    if flags.is_credit_card_suspended(now) {
        return Err(DenialReason::Restricted("credit card privileges suspended".to_string()));
    }
    if ledger.has_credit_card {
        return Err(DenialReason::ValidationFailed(
            "user already has a credit card".to_string(),
        ));
    }

    let limit_amount = Amount::new(limit)
        .map_err(|e| DenialReason::ValidationFailed(e.to_string()))?;

    Ok(LedgerDelta::new()
        .set_balance(AccountType::CreditCard, limit_amount)
        .credit_card(true)
        .transaction(
            TransactionDraft::new(format!("Credit card issued with limit {}", limit), limit)
                .request(&request.id),
        ))
}

fn loan(
    request: &Request,
    ledger: &UserLedger,
    application: &LoanApplication,
    now: DateTime<Utc>,
) -> Result<LedgerDelta, DenialReason> {
    require_positive("loan amount", application.amount)?;
    if application.term_months == 0 {
        return Err(DenialReason::ValidationFailed(
            "loan term must be at least one month".to_string(),
        ));
    }
    if application.annual_rate < Decimal::ZERO {
        return Err(DenialReason::ValidationFailed(format!(
            "annual rate cannot be negative, got {}",
            application.annual_rate
        )));
    }

    let flags = &ledger.flags;
    if flags.is_frozen {
        return Err(DenialReason::Restricted("account is frozen".to_string()));
    }
    if flags.is_credit_frozen(now) {
        return Err(DenialReason::Restricted("credit is frozen".to_string()));
    }
    if flags.is_loan_blacklisted {
        return Err(DenialReason::Restricted("user is blacklisted from loans".to_string()));
    }
    if flags.is_new_loan_blocked(now) {
        return Err(DenialReason::Restricted("new loans are blocked".to_string()));
    }
    if application.loan_type == PERSONAL_LOAN && ledger.has_active_personal_loan() {
        return Err(DenialReason::ActivePersonalLoan);
    }

    let annual_rate = application.annual_rate + flags.loan_interest_surcharge.unwrap_or_default();
    let payment = monthly_payment(application.amount, annual_rate, application.term_months)
        .map_err(|e| DenialReason::ValidationFailed(e.to_string()))?;

    Ok(LedgerDelta::new()
        .credit(AccountType::Personal, application.amount)
        .loan(LoanEntry {
            id: request.id.clone(),
            loan_type: application.loan_type.clone(),
            principal: application.amount,
            term_months: application.term_months,
            annual_rate,
            monthly_payment: payment,
            date_issued: now,
            status: LoanStatus::Active,
            collateral_link: application.collateral_link.clone(),
            down_payment: application.down_payment,
            region: application.region.clone(),
        })
        .transaction(
            TransactionDraft::new(
                format!("Loan disbursed: {}", application.loan_type),
                application.amount,
            )
            .request(&request.id),
        ))
}
