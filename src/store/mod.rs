//! SQLite-backed store.
//!
//! One connection, serialized behind a mutex: every balance mutation in the
//! engine runs inside [`Store::unit_of_work`], so per-account mutations are
//! totally ordered and callers never observe half-applied state.

pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    Account, AccountStatus, Actor, Customer, FdInterestCalculation, FdPlan, FdStatus, FdTerm,
    FixedDeposit, InterestStatus, PlanChangeAudit, PlanType, SavingsInterestCalculation,
    SavingsPlan, Transaction, TransactionKind,
};
use crate::errors::{LedgerError, LedgerResult};

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and applies the
    /// schema and seed plans.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by the test suites.
    pub fn open_in_memory() -> LedgerResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> LedgerResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::apply(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside a `BEGIN`..`COMMIT` transaction, rolling back on any
    /// error. This is the only write path; each validator call and each
    /// scheduler batch item is its own unit of work.
    pub fn unit_of_work<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback()?;
                Err(err)
            }
        }
    }

    /// Read-only access on the shared connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        f(&conn)
    }

    pub fn account(&self, id: i64) -> LedgerResult<Account> {
        self.with_conn(|conn| fetch_account(conn, id))
    }

    pub fn savings_plan(&self, id: i64) -> LedgerResult<SavingsPlan> {
        self.with_conn(|conn| fetch_savings_plan(conn, id))
    }

    pub fn fd_plan(&self, id: i64) -> LedgerResult<FdPlan> {
        self.with_conn(|conn| fetch_fd_plan(conn, id))
    }

    pub fn fixed_deposit(&self, id: i64) -> LedgerResult<FixedDeposit> {
        self.with_conn(|conn| fetch_fixed_deposit(conn, id))
    }

    pub fn customer(&self, id: i64) -> LedgerResult<Customer> {
        self.with_conn(|conn| fetch_customer(conn, id))
    }

    pub fn transactions_for_account(&self, account_id: i64) -> LedgerResult<Vec<Transaction>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT transaction_id, kind, amount_cents, posted_at, description, \
                        account_id, actor \
                 FROM ledger_transaction WHERE account_id = ?1 ORDER BY transaction_id",
            )?;
            let rows = stmt.query_map(params![account_id], map_transaction)?;
            collect(rows)
        })
    }

    pub fn savings_calculations(
        &self,
        account_id: i64,
    ) -> LedgerResult<Vec<SavingsInterestCalculation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT calculation_id, account_id, calculation_date, interest_cents, \
                        rate_bps, plan_type, status, credited_at \
                 FROM savings_interest_calculation WHERE account_id = ?1 \
                 ORDER BY calculation_id",
            )?;
            let rows = stmt.query_map(params![account_id], map_savings_calculation)?;
            collect(rows)
        })
    }

    pub fn fd_calculations(&self, fd_id: i64) -> LedgerResult<Vec<FdInterestCalculation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT calculation_id, fd_id, calculation_date, interest_cents, \
                        days_in_period, credited_account_id, status, credited_at \
                 FROM fd_interest_calculation WHERE fd_id = ?1 ORDER BY calculation_id",
            )?;
            let rows = stmt.query_map(params![fd_id], map_fd_calculation)?;
            collect(rows)
        })
    }

    pub fn plan_changes(&self, account_id: i64) -> LedgerResult<Vec<PlanChangeAudit>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT audit_id, account_id, old_plan_id, new_plan_id, actor, reason, \
                        changed_at \
                 FROM plan_change_audit WHERE account_id = ?1 ORDER BY audit_id",
            )?;
            let rows = stmt.query_map(params![account_id], map_plan_change)?;
            collect(rows)
        })
    }
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> LedgerResult<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// --- date/time column encoding -------------------------------------------

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn ts_to_db(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn column_err(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn db_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| column_err(format!("bad date `{raw}`: {e}")))
}

fn db_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| column_err(format!("bad timestamp `{raw}`: {e}")))
}

fn db_opt_ts(raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| db_ts(&s)).transpose()
}

// --- row mapping ----------------------------------------------------------

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    let status: String = row.get(2)?;
    let open_date: String = row.get(3)?;
    let closed_at: Option<String> = row.get(4)?;
    Ok(Account {
        id: row.get(0)?,
        balance_cents: row.get(1)?,
        status: AccountStatus::parse(&status)
            .ok_or_else(|| column_err(format!("bad account status `{status}`")))?,
        open_date: db_date(&open_date)?,
        closed_at: db_opt_ts(closed_at)?,
        plan_id: row.get(5)?,
        fd_id: row.get(6)?,
        branch_id: row.get(7)?,
    })
}

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(1)?;
    let posted_at: String = row.get(3)?;
    let actor: String = row.get(6)?;
    Ok(Transaction {
        id: row.get(0)?,
        kind: TransactionKind::parse(&kind)
            .ok_or_else(|| column_err(format!("bad transaction kind `{kind}`")))?,
        amount_cents: row.get(2)?,
        posted_at: db_ts(&posted_at)?,
        description: row.get(4)?,
        account_id: row.get(5)?,
        actor: Actor::parse(&actor)
            .ok_or_else(|| column_err(format!("bad actor `{actor}`")))?,
    })
}

fn map_fixed_deposit(row: &Row<'_>) -> rusqlite::Result<FixedDeposit> {
    let status: String = row.get(2)?;
    let open_date: String = row.get(3)?;
    let maturity_date: String = row.get(4)?;
    Ok(FixedDeposit {
        id: row.get(0)?,
        balance_cents: row.get(1)?,
        status: FdStatus::parse(&status)
            .ok_or_else(|| column_err(format!("bad FD status `{status}`")))?,
        open_date: db_date(&open_date)?,
        maturity_date: db_date(&maturity_date)?,
        auto_renew: row.get::<_, i64>(5)? != 0,
        plan_id: row.get(6)?,
    })
}

fn map_savings_plan(row: &Row<'_>) -> rusqlite::Result<SavingsPlan> {
    let plan_type: String = row.get(1)?;
    Ok(SavingsPlan {
        id: row.get(0)?,
        plan_type: PlanType::parse(&plan_type)
            .ok_or_else(|| column_err(format!("bad plan type `{plan_type}`")))?,
        rate_bps: row.get(2)?,
        min_balance_cents: row.get(3)?,
    })
}

fn map_fd_plan(row: &Row<'_>) -> rusqlite::Result<FdPlan> {
    let term: String = row.get(1)?;
    Ok(FdPlan {
        id: row.get(0)?,
        term: FdTerm::parse(&term)
            .ok_or_else(|| column_err(format!("bad FD term `{term}`")))?,
        rate_bps: row.get(2)?,
    })
}

fn map_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    let dob: String = row.get(3)?;
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        nic: row.get(2)?,
        date_of_birth: db_date(&dob)?,
    })
}

fn map_savings_calculation(row: &Row<'_>) -> rusqlite::Result<SavingsInterestCalculation> {
    let date: String = row.get(2)?;
    let plan_type: String = row.get(5)?;
    let status: String = row.get(6)?;
    let credited_at: Option<String> = row.get(7)?;
    Ok(SavingsInterestCalculation {
        id: row.get(0)?,
        account_id: row.get(1)?,
        calculation_date: db_date(&date)?,
        interest_cents: row.get(3)?,
        rate_bps: row.get(4)?,
        plan_type: PlanType::parse(&plan_type)
            .ok_or_else(|| column_err(format!("bad plan type `{plan_type}`")))?,
        status: InterestStatus::parse(&status)
            .ok_or_else(|| column_err(format!("bad calculation status `{status}`")))?,
        credited_at: db_opt_ts(credited_at)?,
    })
}

fn map_fd_calculation(row: &Row<'_>) -> rusqlite::Result<FdInterestCalculation> {
    let date: String = row.get(2)?;
    let status: String = row.get(6)?;
    let credited_at: Option<String> = row.get(7)?;
    Ok(FdInterestCalculation {
        id: row.get(0)?,
        fd_id: row.get(1)?,
        calculation_date: db_date(&date)?,
        interest_cents: row.get(3)?,
        days_in_period: row.get(4)?,
        credited_account_id: row.get(5)?,
        status: InterestStatus::parse(&status)
            .ok_or_else(|| column_err(format!("bad calculation status `{status}`")))?,
        credited_at: db_opt_ts(credited_at)?,
    })
}

fn map_plan_change(row: &Row<'_>) -> rusqlite::Result<PlanChangeAudit> {
    let actor: String = row.get(4)?;
    let changed_at: String = row.get(6)?;
    Ok(PlanChangeAudit {
        id: row.get(0)?,
        account_id: row.get(1)?,
        old_plan_id: row.get(2)?,
        new_plan_id: row.get(3)?,
        actor: Actor::parse(&actor)
            .ok_or_else(|| column_err(format!("bad actor `{actor}`")))?,
        reason: row.get(5)?,
        changed_at: db_ts(&changed_at)?,
    })
}

// --- in-transaction fetch helpers ----------------------------------------

pub(crate) fn fetch_account(conn: &Connection, id: i64) -> LedgerResult<Account> {
    conn.query_row(
        "SELECT account_id, balance_cents, status, open_date, closed_at, plan_id, \
                fd_id, branch_id \
         FROM account WHERE account_id = ?1",
        params![id],
        map_account,
    )
    .optional()?
    .ok_or(LedgerError::AccountNotFound(id))
}

pub(crate) fn fetch_savings_plan(conn: &Connection, id: i64) -> LedgerResult<SavingsPlan> {
    conn.query_row(
        "SELECT plan_id, plan_type, rate_bps, min_balance_cents \
         FROM savings_plan WHERE plan_id = ?1",
        params![id],
        map_savings_plan,
    )
    .optional()?
    .ok_or(LedgerError::PlanNotFound(id))
}

pub(crate) fn fetch_fd_plan(conn: &Connection, id: i64) -> LedgerResult<FdPlan> {
    conn.query_row(
        "SELECT fd_plan_id, term, rate_bps FROM fd_plan WHERE fd_plan_id = ?1",
        params![id],
        map_fd_plan,
    )
    .optional()?
    .ok_or(LedgerError::FdPlanNotFound(id))
}

pub(crate) fn fetch_fixed_deposit(conn: &Connection, id: i64) -> LedgerResult<FixedDeposit> {
    conn.query_row(
        "SELECT fd_id, balance_cents, status, open_date, maturity_date, auto_renew, \
                fd_plan_id \
         FROM fixed_deposit WHERE fd_id = ?1",
        params![id],
        map_fixed_deposit,
    )
    .optional()?
    .ok_or(LedgerError::FdNotFound(id))
}

pub(crate) fn fetch_customer(conn: &Connection, id: i64) -> LedgerResult<Customer> {
    conn.query_row(
        "SELECT customer_id, name, nic, date_of_birth FROM customer WHERE customer_id = ?1",
        params![id],
        map_customer,
    )
    .optional()?
    .ok_or(LedgerError::CustomerNotFound(id))
}

/// All holders linked to an account, primary holder first.
pub(crate) fn fetch_holders(conn: &Connection, account_id: i64) -> LedgerResult<Vec<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT c.customer_id, c.name, c.nic, c.date_of_birth \
         FROM customer c JOIN account_holder h ON h.customer_id = c.customer_id \
         WHERE h.account_id = ?1 ORDER BY h.rowid",
    )?;
    let rows = stmt.query_map(params![account_id], map_customer)?;
    collect(rows)
}

/// The account an active FD is linked to, if any.
pub(crate) fn fetch_account_for_fd(
    conn: &Connection,
    fd_id: i64,
) -> LedgerResult<Option<Account>> {
    conn.query_row(
        "SELECT account_id, balance_cents, status, open_date, closed_at, plan_id, \
                fd_id, branch_id \
         FROM account WHERE fd_id = ?1",
        params![fd_id],
        map_account,
    )
    .optional()
    .map_err(LedgerError::from)
}
