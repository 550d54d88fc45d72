//! Credit limits and loan amortization

use crate::config::CreditTier;
use crate::error::RiskError;
use rust_decimal::{Decimal, MathematicalOps};

const MONTHS_PER_YEAR: u32 = 12;

/// Card limit for a score, or None if the score is below every tier
pub fn credit_limit_for(score: i32, tiers: &[CreditTier]) -> Option<Decimal> {
    tiers
        .iter()
        .filter(|tier| score >= tier.min_score)
        .max_by_key(|tier| tier.min_score)
        .map(|tier| tier.limit)
}

/// Standard amortized payment `P * r / (1 - (1 + r)^-n)` with `r` the
/// monthly rate, rounded to cents. A zero rate splits the principal evenly.
pub fn monthly_payment(
    principal: Decimal,
    annual_rate: Decimal,
    term_months: u32,
) -> Result<Decimal, RiskError> {
    if principal <= Decimal::ZERO {
        return Err(RiskError::InvalidLoanTerms(format!(
            "principal must be positive: {}",
            principal
        )));
    }
    if term_months == 0 {
        return Err(RiskError::InvalidLoanTerms("term must be at least one month".to_string()));
    }
    if annual_rate < Decimal::ZERO {
        return Err(RiskError::InvalidLoanTerms(format!(
            "annual rate cannot be negative: {}",
            annual_rate
        )));
    }

    let n = Decimal::from(term_months);
    if annual_rate.is_zero() {
        return Ok((principal / n).round_dp(2));
    }

    let r = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(term_months))
        .ok_or_else(|| RiskError::InvalidLoanTerms("rate and term overflow".to_string()))?;
    let discount = Decimal::ONE - Decimal::ONE / growth;

    principal
        .checked_mul(r)
        .and_then(|interest| interest.checked_div(discount))
        .map(|payment| payment.round_dp(2))
        .ok_or_else(|| RiskError::InvalidLoanTerms("payment overflow".to_string()))
}

/// Repayment summary for a loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanQuote {
    pub monthly_payment: Decimal,
    pub total_repayment: Decimal,
    pub total_interest: Decimal,
}

impl LoanQuote {
    pub fn new(principal: Decimal, annual_rate: Decimal, term_months: u32) -> Result<Self, RiskError> {
        let monthly_payment = monthly_payment(principal, annual_rate, term_months)?;
        let total_repayment = monthly_payment
            .checked_mul(Decimal::from(term_months))
            .ok_or_else(|| RiskError::InvalidLoanTerms("total repayment overflow".to_string()))?;
        let total_interest = total_repayment
            .checked_sub(principal)
            .ok_or_else(|| RiskError::InvalidLoanTerms("total interest overflow".to_string()))?;
        Ok(Self {
            monthly_payment,
            total_repayment,
            total_interest,
        })
    }
}
