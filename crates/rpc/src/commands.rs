//! CLI commands

use crate::context::AppContext;
use chrono::Utc;
use rpbank_approval::{ApprovalError, Decision};
use rpbank_core::{AccountType, UserRef};
use rpbank_journal::JournalReader;
use rpbank_ledger::{LoanStatus, UserLedger};
use rpbank_requests::{LoanApplication, Request, RequestKind, RequestPayload};
use rpbank_risk::{LoanQuote, Penalty};
use rust_decimal::Decimal;

/// Register a new user and print the bank id
pub fn register(
    ctx: &AppContext,
    name: &str,
    discord: Option<String>,
) -> Result<UserLedger, anyhow::Error> {
    let ledger = ctx.approval.register(name, discord)?;
    println!("✅ Registered {} as {}", ledger.display_name, ledger.id);
    Ok(ledger)
}

fn submit(ctx: &AppContext, user: &UserRef, payload: RequestPayload) -> Result<String, anyhow::Error> {
    let ledger = ctx.approval.snapshot(user)?;
    let kind = payload.kind();
    let id = ctx
        .approval
        .submit(Request::new(ledger.id, ledger.display_name, payload))?;

    println!("✅ Submitted {} request {}", kind, id);
    Ok(id)
}

pub fn open_account(
    ctx: &AppContext,
    user: &UserRef,
    account_type: AccountType,
    initial_deposit: Decimal,
    proof_link: Option<String>,
) -> Result<String, anyhow::Error> {
    submit(
        ctx,
        user,
        RequestPayload::AccountOpen {
            account_type,
            initial_deposit,
            proof_link,
            kyc: Default::default(),
        },
    )
}

pub fn deposit(
    ctx: &AppContext,
    user: &UserRef,
    amount: Decimal,
    proof_link: Option<String>,
) -> Result<String, anyhow::Error> {
    submit(ctx, user, RequestPayload::Deposit { amount, proof_link })
}

pub fn withdraw(
    ctx: &AppContext,
    user: &UserRef,
    amount: Decimal,
    source_account: AccountType,
) -> Result<String, anyhow::Error> {
    submit(
        ctx,
        user,
        RequestPayload::Withdrawal {
            amount,
            source_account,
        },
    )
}

/// Apply for a credit card; the score defaults to the ledger's current one
pub fn apply_card(
    ctx: &AppContext,
    user: &UserRef,
    score: Option<i32>,
) -> Result<String, anyhow::Error> {
    let credit_score_at_application = match score {
        Some(score) => score,
        None => ctx.approval.snapshot(user)?.credit_score.value(),
    };
    submit(
        ctx,
        user,
        RequestPayload::CreditCard {
            credit_score_at_application,
        },
    )
}

pub struct LoanArgs {
    pub loan_type: String,
    pub amount: Decimal,
    pub term_months: u32,
    pub annual_rate: Decimal,
    pub collateral_link: Option<String>,
    pub down_payment: Option<Decimal>,
    pub region: Option<String>,
}

/// Apply for a loan and print the repayment estimate at the requested rate
pub fn apply_loan(ctx: &AppContext, user: &UserRef, args: LoanArgs) -> Result<String, anyhow::Error> {
    let score = ctx.approval.snapshot(user)?.credit_score.value();
    let quote = LoanQuote::new(args.amount, args.annual_rate, args.term_months).ok();

    let id = submit(
        ctx,
        user,
        RequestPayload::Loan(LoanApplication {
            loan_type: args.loan_type,
            amount: args.amount,
            term_months: args.term_months,
            annual_rate: args.annual_rate,
            credit_score_at_application: score,
            collateral_link: args.collateral_link,
            down_payment: args.down_payment,
            region: args.region,
        }),
    )?;

    if let Some(quote) = quote {
        println!(
            "   Estimated {}/month, {} total interest",
            quote.monthly_payment, quote.total_interest
        );
    }
    Ok(id)
}

/// List pending requests, oldest first
pub fn pending(ctx: &AppContext, kind: Option<RequestKind>) -> Result<Vec<Request>, anyhow::Error> {
    let requests = match kind {
        Some(kind) => ctx.approval.list_pending(kind)?,
        None => ctx.approval.list_all_pending()?,
    };

    if requests.is_empty() {
        println!("No pending requests");
    }
    for request in &requests {
        println!(
            "{}  {:<13} {:<20} {}",
            request.id,
            request.kind().to_string(),
            request.user_name,
            request.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(requests)
}

/// Decide a request. A request someone else already decided is reported,
/// not treated as a failure.
pub fn decide(
    ctx: &AppContext,
    request_id: &str,
    decision: Decision,
    actor: &str,
) -> Result<(), anyhow::Error> {
    match ctx.approval.decide(request_id, decision, actor) {
        Ok(outcome) => {
            match &outcome.reason {
                None => println!("✅ {} approved by {}", outcome.request.id, actor),
                Some(reason) => println!("❌ {} denied: {}", outcome.request.id, reason),
            }
            Ok(())
        }
        Err(ApprovalError::AlreadyProcessed { id, status }) => {
            println!("❌ {} already processed (status: {})", id, status.as_str());
            Ok(())
        }
        Err(e @ ApprovalError::Contention { .. }) => {
            anyhow::bail!("{}; the request is still pending, try again", e)
        }
        Err(e) => Err(e.into()),
    }
}

/// Print a ledger snapshot
pub fn ledger(ctx: &AppContext, user: &UserRef) -> Result<UserLedger, anyhow::Error> {
    let ledger = ctx.approval.snapshot(user)?;
    let now = Utc::now();

    println!("💰 {} ({})", ledger.display_name, ledger.id);
    for (account, balance) in &ledger.balances {
        if !balance.is_zero() {
            println!("   {:<12} {}", account.to_string(), balance);
        }
    }
    println!("   {:<12} {}", "Overall", ledger.overall_balance);
    println!("   Credit score: {}", ledger.credit_score);
    if ledger.has_credit_card {
        println!("   Credit card: yes");
    }
    if let Some(card) = &ledger.debit_card {
        println!("   Debit card: **** {}", &card.number[card.number.len().saturating_sub(4)..]);
    }

    let flags = &ledger.flags;
    let mut restrictions = Vec::new();
    if flags.is_frozen {
        restrictions.push("frozen".to_string());
    }
    if flags.is_credit_frozen(now) {
        restrictions.push(until("credit frozen", flags.credit_frozen.expires_at));
    }
    if flags.is_credit_card_suspended(now) {
        restrictions.push(until("card suspended", flags.credit_card_suspended.expires_at));
    }
    if flags.is_loan_blacklisted {
        restrictions.push("loan blacklisted".to_string());
    }
    if flags.is_new_loan_blocked(now) {
        restrictions.push(until("new loans blocked", flags.new_loan_blocked_until));
    }
    if flags.is_suspicious {
        restrictions.push("suspicious".to_string());
    }
    if flags.internal_affairs_triggered {
        restrictions.push("internal affairs".to_string());
    }
    if let Some(surcharge) = flags.loan_interest_surcharge {
        restrictions.push(format!("loan surcharge +{}", surcharge));
    }
    if !restrictions.is_empty() {
        println!("   ⚠️  {}", restrictions.join(", "));
    }

    for loan in ledger.loan_history.iter().filter(|l| l.status == LoanStatus::Active) {
        println!(
            "   Loan {} {}: {} over {} months, {}/month",
            loan.id, loan.loan_type, loan.principal, loan.term_months, loan.monthly_payment
        );
    }
    Ok(ledger)
}

fn until(label: &str, expires_at: Option<chrono::DateTime<Utc>>) -> String {
    match expires_at {
        Some(at) => format!("{} until {}", label, at.format("%Y-%m-%d %H:%M")),
        None => label.to_string(),
    }
}

pub fn score(ctx: &AppContext, user: &UserRef, value: i32) -> Result<UserLedger, anyhow::Error> {
    let ledger = ctx.approval.risk().update_score(user, value)?;
    println!("✅ Credit score for {} is now {}", ledger.id, ledger.credit_score);
    Ok(ledger)
}

pub fn penalty(
    ctx: &AppContext,
    user: &UserRef,
    category: &str,
    tier: &str,
) -> Result<UserLedger, anyhow::Error> {
    let penalty = Penalty::parse(category, tier)?;
    let ledger = ctx.approval.risk().apply_penalty(user, penalty)?;
    println!(
        "✅ Applied {} to {} (score {})",
        penalty, ledger.id, ledger.credit_score
    );
    Ok(ledger)
}

pub fn sweep(ctx: &AppContext) -> Result<usize, anyhow::Error> {
    let cleared = ctx.approval.risk().sweep_expired(Utc::now())?;
    println!("✅ Cleared expired restrictions on {} ledger(s)", cleared);
    Ok(cleared)
}

pub fn stats(ctx: &AppContext, kind: Option<RequestKind>) -> Result<(), anyhow::Error> {
    let stats = ctx.approval.stats(kind)?;
    let scope = kind.map_or_else(|| "all".to_string(), |k| k.to_string());
    println!(
        "📊 Requests ({}): {} pending, {} approved, {} denied",
        scope, stats.pending, stats.approved, stats.denied
    );
    Ok(())
}

/// Print the most recent journaled decisions
pub fn journal(ctx: &AppContext, limit: usize) -> Result<(), anyhow::Error> {
    let records = JournalReader::from_directory(ctx.journal_path())?.tail(limit)?;
    if records.is_empty() {
        println!("Journal is empty");
    }
    for record in records {
        println!(
            "{}  {}  {:<13} {:<8} by {}{}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.request_id,
            record.kind.to_string(),
            record.status.as_str(),
            record.decided_by.as_deref().unwrap_or("-"),
            record.reason.map(|r| format!(" ({})", r)).unwrap_or_default()
        );
    }
    Ok(())
}
