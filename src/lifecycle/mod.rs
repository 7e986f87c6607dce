//! Account lifecycle: opening, closing, and plan changes.
//!
//! Every operation here runs as a single unit of work; a validation
//! failure anywhere leaves nothing behind. Balance side effects always go
//! through `ledger::validator`.

pub mod fixed_deposit;

pub use fixed_deposit::{
    create_fixed_deposit, deactivate_fixed_deposit, CreateFdRequest, FdOpened, PrincipalReturn,
};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};

use crate::currency::format_lkr;
use crate::domain::{Actor, Customer, SavingsPlan, TransactionKind};
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::validator::{post_in_tx, NewTransaction, WithdrawalPolicy};
use crate::store::{self, Store};

#[derive(Debug, Clone)]
pub struct OpenAccountRequest {
    pub primary_holder: i64,
    pub joint_holders: Vec<i64>,
    pub plan_id: i64,
    pub branch_id: i64,
    pub initial_deposit_cents: i64,
    pub actor: Actor,
}

/// Summary returned by [`close_account`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureSummary {
    pub account_id: i64,
    pub withdrawn_cents: i64,
    pub withdrawal_transaction_id: Option<i64>,
}

/// Opens an account on `plan_id`, links its holders, and posts the
/// initial deposit. Fails fast with no account created on any
/// eligibility or minimum-deposit violation.
pub fn open_account(
    store: &Store,
    req: OpenAccountRequest,
    as_of: NaiveDate,
) -> LedgerResult<i64> {
    if req.initial_deposit_cents < 0 {
        return Err(LedgerError::Validation(
            "initial deposit cannot be negative".into(),
        ));
    }
    let account_id = store.unit_of_work(|tx| {
        let plan = store::fetch_savings_plan(tx, req.plan_id)?;
        if plan.plan_type == crate::domain::PlanType::Joint && req.joint_holders.is_empty() {
            return Err(LedgerError::IneligiblePlan(
                "a Joint account requires at least one joint holder".into(),
            ));
        }
        if req.initial_deposit_cents < plan.min_balance_cents {
            return Err(LedgerError::Validation(format!(
                "minimum opening deposit for the {} plan is {}",
                plan.plan_type.as_str(),
                format_lkr(plan.min_balance_cents),
            )));
        }

        let primary = store::fetch_customer(tx, req.primary_holder)?;
        check_holder_age(&primary, &plan, as_of)?;
        for holder_id in &req.joint_holders {
            let holder = store::fetch_customer(tx, *holder_id)?;
            if holder.age_on(as_of) < 18 {
                return Err(LedgerError::IneligiblePlan(format!(
                    "joint holder {} must be at least 18 years old",
                    holder.name,
                )));
            }
        }

        tx.execute(
            "INSERT INTO account (balance_cents, status, open_date, plan_id, branch_id) \
             VALUES (0, 'Active', ?1, ?2, ?3)",
            params![store::date_to_db(as_of), plan.id, req.branch_id],
        )?;
        let account_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO account_holder (customer_id, account_id) VALUES (?1, ?2)",
            params![primary.id, account_id],
        )?;
        for holder_id in &req.joint_holders {
            tx.execute(
                "INSERT INTO account_holder (customer_id, account_id) VALUES (?1, ?2)",
                params![holder_id, account_id],
            )?;
        }

        if req.initial_deposit_cents > 0 {
            post_in_tx(
                tx,
                &NewTransaction {
                    kind: TransactionKind::Deposit,
                    amount_cents: req.initial_deposit_cents,
                    description: "Initial Deposit".into(),
                    account_id,
                    actor: req.actor,
                },
                WithdrawalPolicy::EnforceMinimum,
                Utc::now(),
            )?;
        }
        Ok(account_id)
    })?;
    tracing::info!(
        account_id,
        plan_id = req.plan_id,
        holders = req.joint_holders.len() + 1,
        "opened account"
    );
    Ok(account_id)
}

/// Closes an account: withdraws the full balance (when positive) with a
/// closure description, then marks the account Closed. Refused while an
/// active FD is linked.
pub fn close_account(
    store: &Store,
    account_id: i64,
    reason: &str,
    actor: Actor,
) -> LedgerResult<ClosureSummary> {
    let summary = store.unit_of_work(|tx| {
        let account = store::fetch_account(tx, account_id)?;
        if !account.is_active() {
            return Err(LedgerError::AccountNotActive(account_id));
        }
        if let Some(fd_id) = account.fd_id {
            let fd = store::fetch_fixed_deposit(tx, fd_id)?;
            if fd.is_active() {
                return Err(LedgerError::AccountHasActiveFd(account_id));
            }
        }

        let reason = if reason.trim().is_empty() {
            "No reason provided"
        } else {
            reason.trim()
        };
        let withdrawal_transaction_id = if account.balance_cents > 0 {
            Some(post_in_tx(
                tx,
                &NewTransaction {
                    kind: TransactionKind::Withdrawal,
                    amount_cents: account.balance_cents,
                    description: format!(
                        "Account Closure - Full Balance Withdrawal - {reason}"
                    ),
                    account_id,
                    actor,
                },
                WithdrawalPolicy::AllowFullBalance,
                Utc::now(),
            )?)
        } else {
            None
        };

        tx.execute(
            "UPDATE account SET status = 'Closed', closed_at = ?1 WHERE account_id = ?2",
            params![store::ts_to_db(Utc::now()), account_id],
        )?;
        Ok(ClosureSummary {
            account_id,
            withdrawn_cents: account.balance_cents,
            withdrawal_transaction_id,
        })
    })?;
    tracing::info!(
        account_id,
        withdrawn = %format_lkr(summary.withdrawn_cents),
        "closed account"
    );
    Ok(summary)
}

/// Changes an account's savings plan. Moves no money; records a
/// plan-change audit row. A move off a minor plan requires a replacement
/// NIC for the primary holder.
pub fn change_plan(
    store: &Store,
    account_id: i64,
    new_plan_id: i64,
    actor: Actor,
    reason: &str,
    new_nic: Option<&str>,
    as_of: NaiveDate,
) -> LedgerResult<()> {
    if reason.trim().is_empty() {
        return Err(LedgerError::Validation(
            "a non-empty reason is required for a plan change".into(),
        ));
    }
    store.unit_of_work(|tx| {
        let account = store::fetch_account(tx, account_id)?;
        if !account.is_active() {
            return Err(LedgerError::AccountNotActive(account_id));
        }
        let old_plan = store::fetch_savings_plan(tx, account.plan_id)?;
        let new_plan = store::fetch_savings_plan(tx, new_plan_id)?;
        if old_plan.id == new_plan.id {
            return Err(LedgerError::Validation(format!(
                "account {account_id} is already on the {} plan",
                new_plan.plan_type.as_str(),
            )));
        }

        let holders = store::fetch_holders(tx, account_id)?;
        if holders.is_empty() {
            return Err(LedgerError::Validation(format!(
                "account {account_id} has no linked holders"
            )));
        }
        if new_plan.plan_type == crate::domain::PlanType::Joint && holders.len() < 2 {
            return Err(LedgerError::IneligiblePlan(
                "a Joint plan requires at least two holders".into(),
            ));
        }
        for holder in &holders {
            check_holder_age(holder, &new_plan, as_of)?;
        }

        // Minors carry a birth-certificate credential; graduating to an
        // adult plan replaces it with a NIC on the primary holder.
        if old_plan.plan_type.is_minor_plan() && !new_plan.plan_type.is_minor_plan() {
            let nic = new_nic
                .map(str::trim)
                .filter(|nic| !nic.is_empty())
                .ok_or_else(|| {
                    LedgerError::IneligiblePlan(format!(
                        "moving from the {} plan to the {} plan requires a \
                         replacement NIC",
                        old_plan.plan_type.as_str(),
                        new_plan.plan_type.as_str(),
                    ))
                })?;
            let taken: Option<i64> = tx
                .query_row(
                    "SELECT customer_id FROM customer WHERE nic = ?1 AND customer_id <> ?2",
                    params![nic, holders[0].id],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(LedgerError::DuplicateNic(nic.to_string()));
            }
            tx.execute(
                "UPDATE customer SET nic = ?1 WHERE customer_id = ?2",
                params![nic, holders[0].id],
            )?;
        }

        tx.execute(
            "UPDATE account SET plan_id = ?1 WHERE account_id = ?2",
            params![new_plan.id, account_id],
        )?;
        tx.execute(
            "INSERT INTO plan_change_audit \
                 (account_id, old_plan_id, new_plan_id, actor, reason, changed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account_id,
                old_plan.id,
                new_plan.id,
                actor.as_db_string(),
                reason.trim(),
                store::ts_to_db(Utc::now()),
            ],
        )?;
        tracing::info!(
            account_id,
            from = old_plan.plan_type.as_str(),
            to = new_plan.plan_type.as_str(),
            "changed account plan"
        );
        Ok(())
    })
}

/// Registers a customer with a unique NIC. The engine keeps only the
/// fields its eligibility checks need.
pub fn register_customer(
    store: &Store,
    name: &str,
    nic: &str,
    date_of_birth: NaiveDate,
) -> LedgerResult<i64> {
    let name = name.trim();
    let nic = nic.trim();
    if name.is_empty() || nic.is_empty() {
        return Err(LedgerError::Validation(
            "customer name and NIC are required".into(),
        ));
    }
    store.unit_of_work(|tx| {
        let exists: Option<i64> = tx
            .query_row(
                "SELECT customer_id FROM customer WHERE nic = ?1",
                params![nic],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(LedgerError::DuplicateNic(nic.to_string()));
        }
        tx.execute(
            "INSERT INTO customer (name, nic, date_of_birth) VALUES (?1, ?2, ?3)",
            params![name, nic, store::date_to_db(date_of_birth)],
        )?;
        Ok(tx.last_insert_rowid())
    })
}

fn check_holder_age(
    holder: &Customer,
    plan: &SavingsPlan,
    as_of: NaiveDate,
) -> LedgerResult<()> {
    let required = plan.plan_type.required_age();
    if holder.age_on(as_of) < required {
        return Err(LedgerError::IneligiblePlan(format!(
            "the {} plan requires holders to be at least {} years old",
            plan.plan_type.as_str(),
            required,
        )));
    }
    Ok(())
}
