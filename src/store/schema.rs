//! SQLite schema and seed reference data.

use rusqlite::Connection;

use crate::errors::LedgerResult;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS savings_plan (
    plan_id INTEGER PRIMARY KEY,
    plan_type TEXT NOT NULL,            -- Children/Teen/Adult/Senior/Joint
    rate_bps INTEGER NOT NULL,          -- annual rate, basis points
    min_balance_cents INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS fd_plan (
    fd_plan_id INTEGER PRIMARY KEY,
    term TEXT NOT NULL,                 -- '6 months' / '1 year' / '3 years'
    rate_bps INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS customer (
    customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    nic TEXT NOT NULL UNIQUE,
    date_of_birth TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS account (
    account_id INTEGER PRIMARY KEY AUTOINCREMENT,
    balance_cents INTEGER NOT NULL DEFAULT 0 CHECK (balance_cents >= 0),
    status TEXT NOT NULL,
    open_date TEXT NOT NULL,
    closed_at TEXT,
    plan_id INTEGER NOT NULL REFERENCES savings_plan(plan_id),
    fd_id INTEGER REFERENCES fixed_deposit(fd_id),
    branch_id INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS account_holder (
    customer_id INTEGER NOT NULL REFERENCES customer(customer_id),
    account_id INTEGER NOT NULL REFERENCES account(account_id),
    PRIMARY KEY (customer_id, account_id)
);

CREATE TABLE IF NOT EXISTS ledger_transaction (
    transaction_id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,                 -- Deposit/Withdrawal/Interest
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
    posted_at TEXT NOT NULL,
    description TEXT NOT NULL,
    account_id INTEGER NOT NULL REFERENCES account(account_id),
    actor TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fixed_deposit (
    fd_id INTEGER PRIMARY KEY AUTOINCREMENT,
    balance_cents INTEGER NOT NULL CHECK (balance_cents > 0),
    status TEXT NOT NULL,
    open_date TEXT NOT NULL,
    maturity_date TEXT NOT NULL,
    auto_renew INTEGER NOT NULL,
    fd_plan_id INTEGER NOT NULL REFERENCES fd_plan(fd_plan_id)
);

-- Append-only audit/idempotency rows, one per accrual window attempt.
CREATE TABLE IF NOT EXISTS savings_interest_calculation (
    calculation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL REFERENCES account(account_id),
    calculation_date TEXT NOT NULL,
    interest_cents INTEGER NOT NULL,
    rate_bps INTEGER NOT NULL,
    plan_type TEXT NOT NULL,
    status TEXT NOT NULL,               -- credited/failed
    credited_at TEXT
);

CREATE TABLE IF NOT EXISTS fd_interest_calculation (
    calculation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    fd_id INTEGER NOT NULL REFERENCES fixed_deposit(fd_id),
    calculation_date TEXT NOT NULL,
    interest_cents INTEGER NOT NULL,
    days_in_period INTEGER NOT NULL,
    credited_account_id INTEGER NOT NULL REFERENCES account(account_id),
    status TEXT NOT NULL,               -- credited/failed
    credited_at TEXT
);

CREATE TABLE IF NOT EXISTS plan_change_audit (
    audit_id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL REFERENCES account(account_id),
    old_plan_id INTEGER NOT NULL,
    new_plan_id INTEGER NOT NULL,
    actor TEXT NOT NULL,
    reason TEXT NOT NULL,
    changed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transaction_account
    ON ledger_transaction(account_id);
CREATE INDEX IF NOT EXISTS idx_savings_calc_account
    ON savings_interest_calculation(account_id, status);
CREATE INDEX IF NOT EXISTS idx_fd_calc_fd
    ON fd_interest_calculation(fd_id, status);
"#;

/// Seed plans match the deployed reference data; `INSERT OR IGNORE`
/// keeps reopening an existing store idempotent.
const SEED_PLANS: &str = r#"
INSERT OR IGNORE INTO savings_plan (plan_id, plan_type, rate_bps, min_balance_cents) VALUES
    (1, 'Children', 1200, 0),
    (2, 'Teen',     1100, 50000),
    (3, 'Adult',    1000, 100000),
    (4, 'Senior',   1300, 100000),
    (5, 'Joint',     700, 500000);

INSERT OR IGNORE INTO fd_plan (fd_plan_id, term, rate_bps) VALUES
    (1, '6 months', 1300),
    (2, '1 year',   1400),
    (3, '3 years',  1500);
"#;

pub fn apply(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(SCHEMA)?;
    conn.execute_batch(SEED_PLANS)?;
    Ok(())
}
