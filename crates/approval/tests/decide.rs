//! End-to-end decisions against shared stores

use chrono::{Duration, Utc};
use rpbank_approval::{ApprovalEngine, ApprovalError, BankConfig, Decision, DenialReason};
use rpbank_bus::{ChangeEvent, NotificationBus, Topic};
use rpbank_core::{AccountType, UserId, UserRef};
use rpbank_ledger::{
    InMemoryLedgerStore, LedgerDelta, LedgerError, LedgerStore, SqliteLedgerStore,
    TransactionDraft, UserLedger, PERSONAL_LOAN,
};
use rpbank_requests::{
    Claim, InMemoryRequestStore, LoanApplication, Request, RequestKind, RequestPayload,
    RequestStatus, RequestStore, RequestStoreError, SqliteRequestStore, TerminalUpdate,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

struct Bank {
    engine: ApprovalEngine,
    requests: Arc<dyn RequestStore>,
    ledgers: Arc<dyn LedgerStore>,
}

fn bank() -> Bank {
    let requests: Arc<dyn RequestStore> = Arc::new(InMemoryRequestStore::new());
    let ledgers: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());
    let engine = ApprovalEngine::new(
        requests.clone(),
        ledgers.clone(),
        NotificationBus::default(),
        BankConfig::default(),
    );
    Bank {
        engine,
        requests,
        ledgers,
    }
}

fn submit(bank: &Bank, user: &UserLedger, payload: RequestPayload) -> String {
    bank.engine
        .submit(Request::new(user.id.clone(), user.display_name.clone(), payload))
        .unwrap()
}

fn fund(bank: &Bank, user: &UserLedger, amount: Decimal) {
    let id = submit(
        bank,
        user,
        RequestPayload::Deposit {
            amount,
            proof_link: Some("https://proof.example/deposit".to_string()),
        },
    );
    assert!(bank.engine.decide(&id, Decision::Approve, "teller").unwrap().is_approved());
}

fn loan(loan_type: &str, amount: Decimal, annual_rate: Decimal, term_months: u32) -> RequestPayload {
    RequestPayload::Loan(LoanApplication {
        loan_type: loan_type.to_string(),
        amount,
        term_months,
        annual_rate,
        credit_score_at_application: 680,
        collateral_link: None,
        down_payment: None,
        region: Some("Downtown".to_string()),
    })
}

fn snapshot(bank: &Bank, user: &UserLedger) -> UserLedger {
    bank.engine.snapshot(&UserRef::bank(user.id.clone())).unwrap()
}

#[test]
fn test_concurrent_decides_mutate_once() {
    let bank = bank();
    let user = bank.engine.register("Ada", Some("ada#0001".to_string())).unwrap();
    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(250),
            proof_link: None,
        },
    );

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let engine = &bank.engine;
                let id = id.as_str();
                s.spawn(move || engine.decide(id, Decision::Approve, &format!("staff-{}", n)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let approved = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| matches!(r, Err(ApprovalError::AlreadyProcessed { .. })))
        .count();
    assert_eq!(approved, 1);
    assert_eq!(already, 7);

    let ledger = snapshot(&bank, &user);
    assert_eq!(ledger.balance(AccountType::Personal).value(), dec!(250));
    assert_eq!(ledger.transactions.len(), 1);
    assert_eq!(ledger.version, 1);
}

#[test]
fn test_second_decide_reports_already_processed() {
    let bank = bank();
    let user = bank.engine.register("Bo", None).unwrap();
    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(10),
            proof_link: None,
        },
    );

    bank.engine.decide(&id, Decision::Approve, "teller").unwrap();
    let second = bank.engine.decide(&id, Decision::Deny, "manager");

    match second {
        Err(ApprovalError::AlreadyProcessed { status, .. }) => {
            assert_eq!(status, RequestStatus::Approved)
        }
        other => panic!("expected AlreadyProcessed, got {:?}", other.map(|o| o.status())),
    }
    assert_eq!(snapshot(&bank, &user).transactions.len(), 1);
}

#[test]
fn test_unknown_request() {
    let bank = bank();
    assert!(matches!(
        bank.engine.decide("REQ-MISSING0", Decision::Approve, "teller"),
        Err(ApprovalError::NotFound(_))
    ));
}

#[test]
fn test_overdrawn_withdrawal_is_denied_and_ledger_unchanged() {
    let bank = bank();
    let user = bank.engine.register("Cy", None).unwrap();
    fund(&bank, &user, dec!(100));
    let before = snapshot(&bank, &user);

    let id = submit(
        &bank,
        &user,
        RequestPayload::Withdrawal {
            amount: dec!(150),
            source_account: AccountType::Personal,
        },
    );
    let outcome = bank.engine.decide(&id, Decision::Approve, "teller").unwrap();

    assert_eq!(outcome.status(), RequestStatus::Denied);
    assert!(matches!(
        outcome.reason,
        Some(DenialReason::InsufficientFunds { required, .. }) if required == dec!(150)
    ));
    assert!(outcome.ledger.is_none());
    assert_eq!(snapshot(&bank, &user), before);
}

#[test]
fn test_withdrawal_debits_account_and_overall() {
    let bank = bank();
    let user = bank.engine.register("Di", None).unwrap();
    fund(&bank, &user, dec!(100));

    let id = submit(
        &bank,
        &user,
        RequestPayload::Withdrawal {
            amount: dec!(40),
            source_account: AccountType::Personal,
        },
    );
    let ledger = bank.engine.decide(&id, Decision::Approve, "teller").unwrap().ledger.unwrap();

    assert_eq!(ledger.balance(AccountType::Personal).value(), dec!(60));
    assert_eq!(ledger.overall_balance, dec!(60));
    assert_eq!(ledger.transactions.last().unwrap().amount, dec!(-40));
}

#[test]
fn test_credit_card_tiers() {
    let bank = bank();
    let good = bank.engine.register("Eve", None).unwrap();
    let poor = bank.engine.register("Fin", None).unwrap();

    let id = submit(
        &bank,
        &good,
        RequestPayload::CreditCard {
            credit_score_at_application: 620,
        },
    );
    let ledger = bank.engine.decide(&id, Decision::Approve, "banker").unwrap().ledger.unwrap();
    assert!(ledger.has_credit_card);
    assert_eq!(ledger.balance(AccountType::CreditCard).value(), dec!(15000));
    assert_eq!(ledger.overall_balance, dec!(15000));

    let id = submit(
        &bank,
        &poor,
        RequestPayload::CreditCard {
            credit_score_at_application: 480,
        },
    );
    let outcome = bank.engine.decide(&id, Decision::Approve, "banker").unwrap();
    assert_eq!(outcome.status(), RequestStatus::Denied);
    assert_eq!(outcome.reason, Some(DenialReason::CreditScoreTooLow(480)));
    assert!(!snapshot(&bank, &poor).has_credit_card);
}

#[test]
fn test_second_credit_card_denied() {
    let bank = bank();
    let user = bank.engine.register("Gus", None).unwrap();
    let card = RequestPayload::CreditCard {
        credit_score_at_application: 760,
    };

    let first = submit(&bank, &user, card.clone());
    assert!(bank.engine.decide(&first, Decision::Approve, "banker").unwrap().is_approved());

    let second = submit(&bank, &user, card);
    let outcome = bank.engine.decide(&second, Decision::Approve, "banker").unwrap();
    assert_eq!(outcome.status(), RequestStatus::Denied);
    assert_eq!(snapshot(&bank, &user).balance(AccountType::CreditCard).value(), dec!(20000));
}

#[test]
fn test_one_active_personal_loan() {
    let bank = bank();
    let user = bank.engine.register("Hal", None).unwrap();

    let first = submit(&bank, &user, loan(PERSONAL_LOAN, dec!(50000), dec!(0.05), 12));
    let outcome = bank.engine.decide(&first, Decision::Approve, "loans").unwrap();
    let ledger = outcome.ledger.unwrap();
    let entry = &ledger.loan_history[0];
    assert_eq!(entry.id, first);
    assert!((entry.monthly_payment - dec!(4280.37)).abs() <= dec!(0.01));
    assert_eq!(ledger.balance(AccountType::Personal).value(), dec!(50000));

    let second = submit(&bank, &user, loan(PERSONAL_LOAN, dec!(1000), dec!(0.05), 6));
    let outcome = bank.engine.decide(&second, Decision::Approve, "loans").unwrap();
    assert_eq!(outcome.reason, Some(DenialReason::ActivePersonalLoan));

    let car = submit(&bank, &user, loan("Car Loan", dec!(8000), Decimal::ZERO, 8));
    let outcome = bank.engine.decide(&car, Decision::Approve, "loans").unwrap();
    let ledger = outcome.ledger.unwrap();
    assert_eq!(ledger.loan_history[1].monthly_payment, dec!(1000));

    let active_personal = ledger
        .loan_history
        .iter()
        .filter(|l| l.is_active_personal_loan())
        .count();
    assert_eq!(active_personal, 1);
}

#[test]
fn test_account_open_issues_debit_card_once() {
    let bank = bank();
    let user = bank.engine.register("Ivy", None).unwrap();
    let open = |account_type, initial_deposit| RequestPayload::AccountOpen {
        account_type,
        initial_deposit,
        proof_link: None,
        kyc: Default::default(),
    };

    let id = submit(&bank, &user, open(AccountType::Personal, dec!(20)));
    let first = bank.engine.decide(&id, Decision::Approve, "teller").unwrap().ledger.unwrap();
    let card = first.debit_card.clone().unwrap();
    assert_eq!(card.number.len(), 16);

    let id = submit(&bank, &user, open(AccountType::Savings, dec!(30)));
    let second = bank.engine.decide(&id, Decision::Approve, "teller").unwrap().ledger.unwrap();
    assert_eq!(second.debit_card, Some(card));
    assert_eq!(second.overall_balance, dec!(50));
    assert_eq!(second.transactions[0].description, "Account Opened: Personal");
}

#[test]
fn test_orphaned_request_is_denied() {
    let bank = bank();
    let ghost = UserId::new("RPB-GHOST000").unwrap();
    let id = bank
        .engine
        .submit(Request::new(
            ghost,
            "Ghost",
            RequestPayload::Deposit {
                amount: dec!(5),
                proof_link: None,
            },
        ))
        .unwrap();

    let outcome = bank.engine.decide(&id, Decision::Approve, "teller").unwrap();
    assert_eq!(outcome.status(), RequestStatus::Denied);
    assert_eq!(outcome.reason, Some(DenialReason::UserNotFound));
    assert!(bank.engine.list_all_pending().unwrap().is_empty());
}

#[test]
fn test_staff_denial_leaves_ledger_alone() {
    let bank = bank();
    let user = bank.engine.register("Jay", None).unwrap();
    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(99),
            proof_link: None,
        },
    );

    let outcome = bank.engine.decide(&id, Decision::Deny, "manager").unwrap();
    assert_eq!(outcome.reason, Some(DenialReason::AdminDenied));
    assert_eq!(outcome.request.decided_by.as_deref(), Some("manager"));
    assert_eq!(outcome.request.denial_reason.as_deref(), Some("denied by staff"));
    assert_eq!(snapshot(&bank, &user).version, 0);
}

#[test]
fn test_stale_claim_can_be_taken_over() {
    let bank = bank();
    let user = bank.engine.register("Kai", None).unwrap();
    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(12),
            proof_link: None,
        },
    );

    // an approver that claimed and vanished
    let now = Utc::now();
    bank.requests
        .claim(&id, now - Duration::minutes(10), bank.engine.config().claim_ttl())
        .unwrap();

    let outcome = bank.engine.decide_at(&id, Decision::Approve, "teller", now).unwrap();
    assert!(outcome.is_approved());
}

#[test]
fn test_live_claim_blocks_other_approvers() {
    let bank = bank();
    let user = bank.engine.register("Lou", None).unwrap();
    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(12),
            proof_link: None,
        },
    );

    let now = Utc::now();
    bank.requests
        .claim(&id, now, bank.engine.config().claim_ttl())
        .unwrap();

    assert!(matches!(
        bank.engine.decide_at(&id, Decision::Approve, "teller", now),
        Err(ApprovalError::AlreadyProcessed {
            status: RequestStatus::Pending,
            ..
        })
    ));
}

#[test]
fn test_interrupted_approval_is_not_applied_twice() {
    let bank = bank();
    let user = bank.engine.register("Ines", None).unwrap();
    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(40),
            proof_link: None,
        },
    );

    // an approver claimed and wrote the ledger, then died before the
    // terminal write
    let now = Utc::now();
    let ttl = bank.engine.config().claim_ttl();
    bank.requests.claim(&id, now, ttl).unwrap();
    let delta = LedgerDelta::new()
        .credit(AccountType::Personal, dec!(40))
        .transaction(TransactionDraft::new("Deposit", dec!(40)).request(id.as_str()));
    bank.ledgers.apply_delta_at(&user.id, &delta, 0, now).unwrap();

    let later = now + ttl + Duration::seconds(1);
    let outcome = bank.engine.decide_at(&id, Decision::Approve, "teller", later).unwrap();
    assert!(outcome.is_approved());
    assert_eq!(bank.requests.get(&id).unwrap().status, RequestStatus::Approved);

    let ledger = snapshot(&bank, &user);
    assert_eq!(ledger.transactions.len(), 1);
    assert_eq!(ledger.balance(AccountType::Personal).value(), dec!(40));
    assert_eq!(ledger.overall_balance, dec!(40));
}

#[test]
fn test_overflowing_amounts_are_denied_not_left_pending() {
    let bank = bank();
    let user = bank.engine.register("Otto", None).unwrap();
    let huge = dec!(50000000000000000000000000000);
    fund(&bank, &user, huge);

    // the account fits, the overall balance does not
    let open = submit(
        &bank,
        &user,
        RequestPayload::AccountOpen {
            account_type: AccountType::Savings,
            initial_deposit: huge,
            proof_link: None,
            kyc: Default::default(),
        },
    );
    let outcome = bank.engine.decide(&open, Decision::Approve, "teller").unwrap();
    assert_eq!(outcome.status(), RequestStatus::Denied);
    assert_eq!(
        outcome.reason,
        Some(DenialReason::ValidationFailed("amount overflows balance".to_string()))
    );

    // the account itself overflows
    let deposit = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: huge,
            proof_link: None,
        },
    );
    let outcome = bank.engine.decide(&deposit, Decision::Approve, "teller").unwrap();
    assert_eq!(
        outcome.reason,
        Some(DenialReason::ValidationFailed("amount overflows balance".to_string()))
    );

    let ledger = snapshot(&bank, &user);
    assert_eq!(ledger.balance(AccountType::Personal).value(), huge);
    assert_eq!(ledger.overall_balance, huge);
}

/// Request store where another approver takes over the stale lease just
/// before the terminal write
struct LeaseLost(InMemoryRequestStore);

impl RequestStore for LeaseLost {
    fn submit(&self, request: &Request) -> Result<String, RequestStoreError> {
        self.0.submit(request)
    }

    fn get(&self, id: &str) -> Result<Request, RequestStoreError> {
        self.0.get(id)
    }

    fn list_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<Vec<Request>, RequestStoreError> {
        self.0.list_by_status(kind, status)
    }

    fn count_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<usize, RequestStoreError> {
        self.0.count_by_status(kind, status)
    }

    fn claim(
        &self,
        id: &str,
        now: chrono::DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Claim, RequestStoreError> {
        self.0.claim(id, now, ttl)
    }

    fn release(&self, id: &str, token: &str) -> Result<(), RequestStoreError> {
        self.0.release(id, token)
    }

    fn transition(
        &self,
        id: &str,
        token: &str,
        update: &TerminalUpdate,
        now: chrono::DateTime<Utc>,
    ) -> Result<Request, RequestStoreError> {
        let ttl = Duration::minutes(5);
        self.0.claim(id, now + ttl + Duration::seconds(1), ttl)?;
        self.0.transition(id, token, update, now)
    }
}

#[test]
fn test_lost_lease_reports_already_processed() {
    let requests: Arc<dyn RequestStore> = Arc::new(LeaseLost(InMemoryRequestStore::new()));
    let engine = ApprovalEngine::new(
        requests.clone(),
        Arc::new(InMemoryLedgerStore::new()),
        NotificationBus::default(),
        BankConfig::default(),
    );
    let user = engine.register("Rui", None).unwrap();
    let id = engine
        .submit(Request::new(
            user.id.clone(),
            "Rui",
            RequestPayload::Deposit {
                amount: dec!(5),
                proof_link: None,
            },
        ))
        .unwrap();

    assert!(matches!(
        engine.decide(&id, Decision::Approve, "teller"),
        Err(ApprovalError::AlreadyProcessed {
            status: RequestStatus::Pending,
            ..
        })
    ));
    assert_eq!(requests.get(&id).unwrap().status, RequestStatus::Pending);
}

#[test]
fn test_balance_invariant_after_mixed_approvals() {
    let bank = bank();
    let user = bank.engine.register("Max", None).unwrap();

    let payloads = vec![
        RequestPayload::AccountOpen {
            account_type: AccountType::Business,
            initial_deposit: dec!(500),
            proof_link: None,
            kyc: Default::default(),
        },
        RequestPayload::Deposit {
            amount: dec!(125.50),
            proof_link: None,
        },
        RequestPayload::Withdrawal {
            amount: dec!(200),
            source_account: AccountType::Business,
        },
        RequestPayload::CreditCard {
            credit_score_at_application: 510,
        },
        loan("Business Loan", dec!(3000), dec!(0.07), 24),
        RequestPayload::Withdrawal {
            amount: dec!(1000000),
            source_account: AccountType::Savings,
        },
    ];

    for payload in payloads {
        let id = submit(&bank, &user, payload);
        bank.engine.decide(&id, Decision::Approve, "teller").unwrap();
    }

    let ledger = snapshot(&bank, &user);
    assert_eq!(ledger.overall_balance, ledger.balance_sum());
    assert_eq!(ledger.overall_balance, dec!(8425.50));
}

#[test]
fn test_stats_by_kind() {
    let bank = bank();
    let user = bank.engine.register("Ned", None).unwrap();
    let deposit = RequestPayload::Deposit {
        amount: dec!(1),
        proof_link: None,
    };

    let a = submit(&bank, &user, deposit.clone());
    let b = submit(&bank, &user, deposit.clone());
    submit(&bank, &user, deposit);
    submit(
        &bank,
        &user,
        RequestPayload::CreditCard {
            credit_score_at_application: 700,
        },
    );
    bank.engine.decide(&a, Decision::Approve, "teller").unwrap();
    bank.engine.decide(&b, Decision::Deny, "teller").unwrap();

    let deposits = bank.engine.stats(Some(RequestKind::Deposit)).unwrap();
    assert_eq!((deposits.pending, deposits.approved, deposits.denied), (1, 1, 1));
    assert_eq!(bank.engine.stats(None).unwrap().total(), 4);
    assert_eq!(bank.engine.list_pending(RequestKind::CreditCard).unwrap().len(), 1);
}

#[test]
fn test_decisions_are_published() {
    let bank = bank();
    let user = bank.engine.register("Oli", None).unwrap();
    let mut requests = bank.engine.bus().subscribe(Topic::Requests(RequestKind::Deposit));
    let mut ledger_updates = bank.engine.bus().subscribe(Topic::Ledger(user.id.clone()));

    let id = submit(
        &bank,
        &user,
        RequestPayload::Deposit {
            amount: dec!(3),
            proof_link: None,
        },
    );
    bank.engine.decide(&id, Decision::Approve, "teller").unwrap();

    let mut statuses = Vec::new();
    while let Some(ChangeEvent::RequestChanged(request)) = requests.try_recv().unwrap() {
        statuses.push(request.status);
    }
    assert_eq!(statuses, vec![RequestStatus::Pending, RequestStatus::Approved]);

    match ledger_updates.try_recv().unwrap() {
        Some(ChangeEvent::LedgerChanged(ledger)) => {
            assert_eq!(ledger.balance(AccountType::Personal).value(), dec!(3))
        }
        other => panic!("expected ledger update, got {:?}", other),
    }
}

/// Ledger store whose every write loses the version race
struct AlwaysContended(InMemoryLedgerStore);

impl LedgerStore for AlwaysContended {
    fn create(&self, ledger: &UserLedger) -> Result<(), LedgerError> {
        self.0.create(ledger)
    }

    fn load(&self, id: &UserId) -> Result<UserLedger, LedgerError> {
        self.0.load(id)
    }

    fn resolve(&self, user: &UserRef) -> Result<UserId, LedgerError> {
        self.0.resolve(user)
    }

    fn list_users(&self) -> Result<Vec<UserId>, LedgerError> {
        self.0.list_users()
    }

    fn apply_delta_at(
        &self,
        id: &UserId,
        _delta: &LedgerDelta,
        expected_version: u64,
        _now: chrono::DateTime<Utc>,
    ) -> Result<UserLedger, LedgerError> {
        Err(LedgerError::VersionConflict {
            id: id.to_string(),
            expected: expected_version,
            actual: expected_version + 1,
        })
    }
}

#[test]
fn test_contention_leaves_request_retryable() {
    let requests: Arc<dyn RequestStore> = Arc::new(InMemoryRequestStore::new());
    let engine = ApprovalEngine::new(
        requests.clone(),
        Arc::new(AlwaysContended(InMemoryLedgerStore::new())),
        NotificationBus::default(),
        BankConfig::default(),
    );
    let user = engine.register("Pia", None).unwrap();
    let id = engine
        .submit(Request::new(
            user.id.clone(),
            "Pia",
            RequestPayload::Deposit {
                amount: dec!(8),
                proof_link: None,
            },
        ))
        .unwrap();

    let result = engine.decide(&id, Decision::Approve, "teller");
    assert!(matches!(result, Err(ApprovalError::Contention { attempts: 3, .. })));

    let request = requests.get(&id).unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.claim.is_none());

    // a retry gets past the claim and fails the same transient way
    assert!(matches!(
        engine.decide(&id, Decision::Approve, "teller"),
        Err(ApprovalError::Contention { .. })
    ));
    // staff can still deny it
    assert!(engine.decide(&id, Decision::Deny, "teller").is_ok());
}

#[test]
fn test_sqlite_backed_concurrent_withdrawals() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("bank.db");
    let requests: Arc<dyn RequestStore> = Arc::new(SqliteRequestStore::new(&db).unwrap());
    let ledgers: Arc<dyn LedgerStore> = Arc::new(SqliteLedgerStore::new(&db).unwrap());
    let engine = ApprovalEngine::new(
        requests.clone(),
        ledgers.clone(),
        NotificationBus::default(),
        BankConfig::default(),
    );
    let bank = Bank { engine, requests, ledgers };

    let user = bank.engine.register("Quin", Some("quin#4242".to_string())).unwrap();
    fund(&bank, &user, dec!(100));

    let ids: Vec<String> = (0..2)
        .map(|_| {
            submit(
                &bank,
                &user,
                RequestPayload::Withdrawal {
                    amount: dec!(70),
                    source_account: AccountType::Personal,
                },
            )
        })
        .collect();

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let engine = &bank.engine;
                s.spawn(move || engine.decide(id, Decision::Approve, "teller"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let approved = outcomes
        .iter()
        .filter(|o| o.as_ref().is_ok_and(|o| o.is_approved()))
        .count();
    assert_eq!(approved, 1);

    let ledger = bank.engine.snapshot(&UserRef::discord("quin#4242")).unwrap();
    assert_eq!(ledger.balance(AccountType::Personal).value(), dec!(30));
    assert_eq!(ledger.overall_balance, dec!(30));
}
