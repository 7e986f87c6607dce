//! Fixed-deposit lifecycle: creation against a funding account and
//! manual deactivation. Maturity-driven closure lives in
//! `accrual::maturity` and shares [`close_fd_returning_principal`].

use chrono::{NaiveDate, Utc};
use rusqlite::params;

use crate::currency::format_lkr;
use crate::domain::{Actor, FixedDeposit, TransactionKind};
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::validator::{post_in_tx, NewTransaction, WithdrawalPolicy};
use crate::store::{self, Store};

#[derive(Debug, Clone)]
pub struct CreateFdRequest {
    pub customer_id: i64,
    pub account_id: i64,
    pub fd_plan_id: i64,
    pub principal_cents: i64,
    pub auto_renew: bool,
    pub actor: Actor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdOpened {
    pub fd_id: i64,
    pub maturity_date: NaiveDate,
}

/// Principal returned to a linked account when an FD closes, whether by
/// manual deactivation or maturity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalReturn {
    pub fd_id: i64,
    pub account_id: i64,
    pub returned_cents: i64,
}

/// Creates a fixed deposit funded from `account_id`: debits the principal
/// through the validator and links the FD to the account. The funding
/// account must keep its plan minimum after the carve-out.
pub fn create_fixed_deposit(
    store: &Store,
    req: CreateFdRequest,
    as_of: NaiveDate,
) -> LedgerResult<FdOpened> {
    if req.principal_cents <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    let opened = store.unit_of_work(|tx| {
        let customer = store::fetch_customer(tx, req.customer_id)?;
        if customer.age_on(as_of) < 18 {
            return Err(LedgerError::IneligiblePlan(
                "fixed deposits require the holder to be at least 18 years old".into(),
            ));
        }
        let account = store::fetch_account(tx, req.account_id)?;
        if !account.is_active() {
            return Err(LedgerError::AccountNotActive(account.id));
        }
        if account.fd_id.is_some() {
            return Err(LedgerError::AccountHasActiveFd(account.id));
        }
        let savings_plan = store::fetch_savings_plan(tx, account.plan_id)?;
        let available = account.balance_cents - savings_plan.min_balance_cents;
        if req.principal_cents > available {
            return Err(LedgerError::Validation(format!(
                "principal exceeds available funds: at most {} can be moved while \
                 {} remains in the {} plan account",
                format_lkr(available.max(0)),
                format_lkr(savings_plan.min_balance_cents),
                savings_plan.plan_type.as_str(),
            )));
        }
        let fd_plan = store::fetch_fd_plan(tx, req.fd_plan_id)?;
        let maturity_date = fd_plan.term.maturity_from(as_of);

        tx.execute(
            "INSERT INTO fixed_deposit \
                 (balance_cents, status, open_date, maturity_date, auto_renew, fd_plan_id) \
             VALUES (?1, 'Active', ?2, ?3, ?4, ?5)",
            params![
                req.principal_cents,
                store::date_to_db(as_of),
                store::date_to_db(maturity_date),
                req.auto_renew as i64,
                fd_plan.id,
            ],
        )?;
        let fd_id = tx.last_insert_rowid();

        post_in_tx(
            tx,
            &NewTransaction {
                kind: TransactionKind::Withdrawal,
                amount_cents: req.principal_cents,
                description: format!("Fixed Deposit Creation - {} Plan", fd_plan.term.as_str()),
                account_id: account.id,
                actor: req.actor,
            },
            WithdrawalPolicy::EnforceMinimum,
            Utc::now(),
        )?;
        tx.execute(
            "UPDATE account SET fd_id = ?1 WHERE account_id = ?2",
            params![fd_id, account.id],
        )?;
        Ok(FdOpened {
            fd_id,
            maturity_date,
        })
    })?;
    tracing::info!(
        fd_id = opened.fd_id,
        account_id = req.account_id,
        principal = %format_lkr(req.principal_cents),
        maturity = %opened.maturity_date,
        "created fixed deposit"
    );
    Ok(opened)
}

/// Manually deactivates an active FD, returning the full principal to the
/// linked account and clearing the link.
pub fn deactivate_fixed_deposit(
    store: &Store,
    fd_id: i64,
    actor: Actor,
) -> LedgerResult<PrincipalReturn> {
    let returned = store.unit_of_work(|tx| {
        let fd = store::fetch_fixed_deposit(tx, fd_id)?;
        if !fd.is_active() {
            return Err(LedgerError::FdNotActive(fd_id));
        }
        let description = format!("FD Deactivation - Principal Return (FD {fd_id})");
        close_fd_returning_principal(tx, &fd, &description, actor)
    })?;
    tracing::info!(
        fd_id,
        account_id = returned.account_id,
        returned = %format_lkr(returned.returned_cents),
        "deactivated fixed deposit"
    );
    Ok(returned)
}

/// Closes `fd` and returns its balance to the linked account through the
/// validator. Shared by manual deactivation and the maturity sweep; the
/// caller owns the unit of work.
pub(crate) fn close_fd_returning_principal(
    tx: &rusqlite::Transaction<'_>,
    fd: &FixedDeposit,
    description: &str,
    actor: Actor,
) -> LedgerResult<PrincipalReturn> {
    let account = store::fetch_account_for_fd(tx, fd.id)?.ok_or_else(|| {
        LedgerError::Validation(format!("FD {} has no linked savings account", fd.id))
    })?;
    post_in_tx(
        tx,
        &NewTransaction {
            kind: TransactionKind::Deposit,
            amount_cents: fd.balance_cents,
            description: description.to_string(),
            account_id: account.id,
            actor,
        },
        WithdrawalPolicy::EnforceMinimum,
        Utc::now(),
    )?;
    tx.execute(
        "UPDATE fixed_deposit SET status = 'Closed' WHERE fd_id = ?1",
        params![fd.id],
    )?;
    tx.execute(
        "UPDATE account SET fd_id = NULL WHERE fd_id = ?1",
        params![fd.id],
    )?;
    Ok(PrincipalReturn {
        fd_id: fd.id,
        account_id: account.id,
        returned_cents: fd.balance_cents,
    })
}
