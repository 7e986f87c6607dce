mod common;

use bank_core::domain::{AccountStatus, Actor, FdStatus, TransactionKind};
use bank_core::errors::LedgerError;
use bank_core::lifecycle::{self, CreateFdRequest, OpenAccountRequest};
use common::*;

#[test]
fn open_account_posts_the_initial_deposit() {
    let store = fresh_store();
    let holder = adult(&store, "900100001V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 250_000, date(2025, 1, 1));

    let account = store.account(account_id).unwrap();
    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.balance_cents, 250_000);
    assert_eq!(account.open_date, date(2025, 1, 1));

    let history = store.transactions_for_account(account_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Deposit);
    assert_eq!(history[0].description, "Initial Deposit");
    assert_eq!(history[0].actor, TELLER);
}

#[test]
fn open_account_rejects_deposit_below_plan_minimum() {
    let store = fresh_store();
    let holder = adult(&store, "900100002V");
    let err = lifecycle::open_account(
        &store,
        OpenAccountRequest {
            primary_holder: holder,
            joint_holders: Vec::new(),
            plan_id: ADULT_PLAN,
            branch_id: 1,
            initial_deposit_cents: 50_000,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn underage_holder_cannot_open_an_adult_account() {
    let store = fresh_store();
    let teen = customer(&store, "T. Silva", "200801234567", date(2008, 5, 1));
    let err = lifecycle::open_account(
        &store,
        OpenAccountRequest {
            primary_holder: teen,
            joint_holders: Vec::new(),
            plan_id: ADULT_PLAN,
            branch_id: 1,
            initial_deposit_cents: 200_000,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::IneligiblePlan(_)));
    // Fail-fast: no orphan customer-account link or account row.
    assert!(matches!(
        store.account(1).unwrap_err(),
        LedgerError::AccountNotFound(1)
    ));
}

#[test]
fn teen_plan_accepts_a_twelve_year_old() {
    let store = fresh_store();
    let teen = customer(&store, "T. Silva", "201301234567", date(2013, 1, 1));
    let account_id = open_account(&store, teen, TEEN_PLAN, 50_000, date(2025, 1, 2));
    assert_eq!(store.account(account_id).unwrap().balance_cents, 50_000);
}

#[test]
fn joint_plan_requires_a_joint_holder() {
    let store = fresh_store();
    let holder = adult(&store, "900100003V");
    let err = lifecycle::open_account(
        &store,
        OpenAccountRequest {
            primary_holder: holder,
            joint_holders: Vec::new(),
            plan_id: JOINT_PLAN,
            branch_id: 1,
            initial_deposit_cents: 600_000,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::IneligiblePlan(_)));

    let co_holder = adult(&store, "900100004V");
    lifecycle::open_account(
        &store,
        OpenAccountRequest {
            primary_holder: holder,
            joint_holders: vec![co_holder],
            plan_id: JOINT_PLAN,
            branch_id: 1,
            initial_deposit_cents: 600_000,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap();
}

#[test]
fn close_account_withdraws_the_full_balance() {
    let store = fresh_store();
    let holder = adult(&store, "900100005V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 300_000, date(2025, 1, 1));

    let summary =
        lifecycle::close_account(&store, account_id, "relocating abroad", TELLER).unwrap();
    assert_eq!(summary.withdrawn_cents, 300_000);
    assert!(summary.withdrawal_transaction_id.is_some());

    let account = store.account(account_id).unwrap();
    assert_eq!(account.status, AccountStatus::Closed);
    assert_eq!(account.balance_cents, 0);
    assert!(account.closed_at.is_some());

    let history = store.transactions_for_account(account_id).unwrap();
    let closure = history.last().unwrap();
    assert_eq!(closure.kind, TransactionKind::Withdrawal);
    assert!(closure.description.contains("relocating abroad"));
}

#[test]
fn close_account_with_zero_balance_skips_the_withdrawal() {
    let store = fresh_store();
    let holder = customer(&store, "C. Perera", "201501234567", date(2015, 1, 1));
    let account_id = open_account(&store, holder, CHILDREN_PLAN, 0, date(2025, 1, 1));

    let summary = lifecycle::close_account(&store, account_id, "", TELLER).unwrap();
    assert_eq!(summary.withdrawn_cents, 0);
    assert!(summary.withdrawal_transaction_id.is_none());
    assert_eq!(
        store.account(account_id).unwrap().status,
        AccountStatus::Closed
    );
}

#[test]
fn close_is_refused_while_an_fd_is_active() {
    let store = fresh_store();
    let holder = adult(&store, "900100006V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 500_000, date(2025, 1, 1));
    lifecycle::create_fixed_deposit(
        &store,
        CreateFdRequest {
            customer_id: holder,
            account_id,
            fd_plan_id: FD_PLAN_6M,
            principal_cents: 300_000,
            auto_renew: false,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap();

    let err = lifecycle::close_account(&store, account_id, "done", TELLER).unwrap_err();
    assert!(matches!(err, LedgerError::AccountHasActiveFd(_)));
}

#[test]
fn fd_creation_debits_principal_and_links_the_fd() {
    let store = fresh_store();
    let holder = adult(&store, "900100007V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 500_000, date(2025, 1, 15));

    let opened = lifecycle::create_fixed_deposit(
        &store,
        CreateFdRequest {
            customer_id: holder,
            account_id,
            fd_plan_id: FD_PLAN_6M,
            principal_cents: 400_000,
            auto_renew: true,
            actor: TELLER,
        },
        date(2025, 1, 15),
    )
    .unwrap();
    assert_eq!(opened.maturity_date, date(2025, 7, 15));

    let account = store.account(account_id).unwrap();
    assert_eq!(account.balance_cents, 100_000);
    assert_eq!(account.fd_id, Some(opened.fd_id));

    let fd = store.fixed_deposit(opened.fd_id).unwrap();
    assert_eq!(fd.status, FdStatus::Active);
    assert_eq!(fd.balance_cents, 400_000);
    assert!(fd.auto_renew);
}

#[test]
fn fd_principal_may_not_invade_the_plan_minimum() {
    let store = fresh_store();
    let holder = adult(&store, "900100008V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 500_000, date(2025, 1, 1));

    // Adult plan keeps 1,000.00; at most 4,000.00 can move into an FD.
    let err = lifecycle::create_fixed_deposit(
        &store,
        CreateFdRequest {
            customer_id: holder,
            account_id,
            fd_plan_id: FD_PLAN_1Y,
            principal_cents: 400_001,
            auto_renew: false,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(store.account(account_id).unwrap().balance_cents, 500_000);
}

#[test]
fn minors_cannot_hold_fixed_deposits() {
    let store = fresh_store();
    let minor = customer(&store, "T. Silva", "201001234567", date(2010, 1, 1));
    let guardian = adult(&store, "900100009V");
    let account_id = open_account(&store, guardian, ADULT_PLAN, 500_000, date(2025, 1, 1));

    let err = lifecycle::create_fixed_deposit(
        &store,
        CreateFdRequest {
            customer_id: minor,
            account_id,
            fd_plan_id: FD_PLAN_6M,
            principal_cents: 100_000,
            auto_renew: false,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::IneligiblePlan(_)));
}

#[test]
fn deactivating_an_fd_returns_the_principal() {
    let store = fresh_store();
    let holder = adult(&store, "900100010V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 500_000, date(2025, 1, 1));
    let opened = lifecycle::create_fixed_deposit(
        &store,
        CreateFdRequest {
            customer_id: holder,
            account_id,
            fd_plan_id: FD_PLAN_6M,
            principal_cents: 350_000,
            auto_renew: false,
            actor: TELLER,
        },
        date(2025, 1, 1),
    )
    .unwrap();

    let returned = lifecycle::deactivate_fixed_deposit(&store, opened.fd_id, TELLER).unwrap();
    assert_eq!(returned.returned_cents, 350_000);
    assert_eq!(returned.account_id, account_id);

    let account = store.account(account_id).unwrap();
    assert_eq!(account.balance_cents, 500_000);
    assert_eq!(account.fd_id, None);
    assert_eq!(
        store.fixed_deposit(opened.fd_id).unwrap().status,
        FdStatus::Closed
    );

    // Terminal state: a second deactivation is refused.
    let err = lifecycle::deactivate_fixed_deposit(&store, opened.fd_id, TELLER).unwrap_err();
    assert!(matches!(err, LedgerError::FdNotActive(_)));
}

#[test]
fn plan_change_records_an_audit_row_and_moves_no_money() {
    let store = fresh_store();
    let holder = adult(&store, "900100011V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 300_000, date(2025, 1, 1));

    lifecycle::change_plan(
        &store,
        account_id,
        SENIOR_PLAN,
        Actor::Employee(7),
        "holder turned sixty",
        None,
        date(2055, 1, 2),
    )
    .unwrap();

    let account = store.account(account_id).unwrap();
    assert_eq!(account.plan_id, SENIOR_PLAN);
    assert_eq!(account.balance_cents, 300_000);
    assert_eq!(store.transactions_for_account(account_id).unwrap().len(), 1);

    let audits = store.plan_changes(account_id).unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].old_plan_id, ADULT_PLAN);
    assert_eq!(audits[0].new_plan_id, SENIOR_PLAN);
    assert_eq!(audits[0].actor, Actor::Employee(7));
    assert_eq!(audits[0].reason, "holder turned sixty");
}

#[test]
fn teen_to_adult_transition_requires_a_replacement_nic() {
    let store = fresh_store();
    let teen = customer(&store, "T. Silva", "BC-445566", date(2007, 1, 1));
    let account_id = open_account(&store, teen, TEEN_PLAN, 60_000, date(2024, 1, 1));

    let err = lifecycle::change_plan(
        &store,
        account_id,
        ADULT_PLAN,
        TELLER,
        "holder turned eighteen",
        None,
        date(2025, 6, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::IneligiblePlan(_)));

    lifecycle::change_plan(
        &store,
        account_id,
        ADULT_PLAN,
        TELLER,
        "holder turned eighteen",
        Some("200701234567"),
        date(2025, 6, 1),
    )
    .unwrap();
    assert_eq!(store.account(account_id).unwrap().plan_id, ADULT_PLAN);
    assert_eq!(store.customer(teen).unwrap().nic, "200701234567");
}

#[test]
fn plan_change_rejects_an_underage_target() {
    let store = fresh_store();
    let holder = adult(&store, "900100012V");
    let account_id = open_account(&store, holder, ADULT_PLAN, 300_000, date(2025, 1, 1));

    // A 35-year-old cannot move to the Senior plan.
    let err = lifecycle::change_plan(
        &store,
        account_id,
        SENIOR_PLAN,
        TELLER,
        "requested senior benefits",
        None,
        date(2025, 6, 1),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::IneligiblePlan(_)));
    assert_eq!(store.account(account_id).unwrap().plan_id, ADULT_PLAN);
    assert!(store.plan_changes(account_id).unwrap().is_empty());
}

#[test]
fn duplicate_nic_registration_is_rejected() {
    let store = fresh_store();
    customer(&store, "A. Perera", "900100013V", date(1990, 1, 1));
    let err =
        lifecycle::register_customer(&store, "B. Perera", "900100013V", date(1992, 2, 2))
            .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateNic(_)));
}
