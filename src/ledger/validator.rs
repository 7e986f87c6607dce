//! The single chokepoint through which every balance-affecting operation
//! passes. No other code updates `account.balance_cents`.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::currency::format_lkr;
use crate::domain::{Actor, TransactionKind};
use crate::errors::{LedgerError, LedgerResult};
use crate::store::{self, Store};

/// A transaction to be posted. Amounts are positive cents; the direction
/// comes from `kind`.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub description: String,
    pub account_id: i64,
    pub actor: Actor,
}

/// Whether a withdrawal must respect the plan's minimum balance.
///
/// `AllowFullBalance` exists for the one flow that legitimately empties
/// an account below its plan floor: account closure. Everything else,
/// FD principal carve-outs included, uses `EnforceMinimum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalPolicy {
    EnforceMinimum,
    AllowFullBalance,
}

/// Posts a teller-style transaction in its own unit of work and returns
/// the new transaction id.
pub fn post_transaction(store: &Store, new: NewTransaction) -> LedgerResult<i64> {
    store.unit_of_work(|tx| post_in_tx(tx, &new, WithdrawalPolicy::EnforceMinimum, Utc::now()))
}

/// Validates and applies one transaction inside an already-open unit of
/// work. The balance update and the transaction append commit (or roll
/// back) together with whatever else the caller has staged.
pub(crate) fn post_in_tx(
    tx: &rusqlite::Transaction<'_>,
    new: &NewTransaction,
    policy: WithdrawalPolicy,
    posted_at: DateTime<Utc>,
) -> LedgerResult<i64> {
    if new.amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    let account = store::fetch_account(tx, new.account_id)?;
    if !account.is_active() {
        return Err(LedgerError::AccountNotActive(account.id));
    }

    if new.kind == TransactionKind::Withdrawal {
        if new.amount_cents > account.balance_cents {
            return Err(LedgerError::InsufficientBalance);
        }
        if policy == WithdrawalPolicy::EnforceMinimum {
            let plan = store::fetch_savings_plan(tx, account.plan_id)?;
            if account.balance_cents - new.amount_cents < plan.min_balance_cents {
                return Err(LedgerError::MinimumBalanceRequired(format!(
                    "{} plan requires a balance of at least {}",
                    plan.plan_type.as_str(),
                    format_lkr(plan.min_balance_cents),
                )));
            }
        }
    }

    let new_balance = account.balance_cents + new.kind.balance_sign() * new.amount_cents;
    tx.execute(
        "UPDATE account SET balance_cents = ?1 WHERE account_id = ?2",
        params![new_balance, account.id],
    )?;
    tx.execute(
        "INSERT INTO ledger_transaction \
             (kind, amount_cents, posted_at, description, account_id, actor) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new.kind.as_str(),
            new.amount_cents,
            store::ts_to_db(posted_at),
            new.description,
            account.id,
            new.actor.as_db_string(),
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();
    tracing::debug!(
        account_id = account.id,
        transaction_id,
        kind = new.kind.as_str(),
        amount = %format_lkr(new.amount_cents),
        balance = %format_lkr(new_balance),
        "posted transaction"
    );
    Ok(transaction_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    /// Inserts an Active account directly, bypassing the lifecycle, so the
    /// validator can be exercised in isolation.
    fn seed_account(store: &Store, balance_cents: i64, plan_id: i64) -> i64 {
        store
            .unit_of_work(|tx| {
                tx.execute(
                    "INSERT INTO account (balance_cents, status, open_date, plan_id, branch_id) \
                     VALUES (?1, 'Active', '2025-01-01', ?2, 1)",
                    params![balance_cents, plan_id],
                )?;
                Ok(tx.last_insert_rowid())
            })
            .unwrap()
    }

    fn deposit(amount_cents: i64, account_id: i64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Deposit,
            amount_cents,
            description: "Cash deposit".into(),
            account_id,
            actor: Actor::Employee(1),
        }
    }

    fn withdrawal(amount_cents: i64, account_id: i64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Withdrawal,
            amount_cents,
            description: "Cash withdrawal".into(),
            account_id,
            actor: Actor::Employee(1),
        }
    }

    #[test]
    fn deposit_updates_balance_and_appends_row() {
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 0, 3);
        let txn_id = post_transaction(&store, deposit(250_000, account_id)).unwrap();
        assert!(txn_id > 0);
        let account = store.account(account_id).unwrap();
        assert_eq!(account.balance_cents, 250_000);
        let history = store.transactions_for_account(account_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Deposit);
        assert_eq!(history[0].actor, Actor::Employee(1));
    }

    #[test]
    fn withdrawal_respecting_minimum_succeeds() {
        // Account A: balance 10,000.00 on a plan with a 5,000.00 floor.
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 1_000_000, 5);
        post_transaction(&store, withdrawal(400_000, account_id)).unwrap();
        assert_eq!(store.account(account_id).unwrap().balance_cents, 600_000);
    }

    #[test]
    fn withdrawal_below_plan_minimum_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 1_000_000, 5);
        let err = post_transaction(&store, withdrawal(600_000, account_id)).unwrap_err();
        assert!(matches!(err, LedgerError::MinimumBalanceRequired(_)));
        // No partial effect.
        assert_eq!(store.account(account_id).unwrap().balance_cents, 1_000_000);
        assert!(store.transactions_for_account(account_id).unwrap().is_empty());
    }

    #[test]
    fn withdrawal_over_balance_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 100_000, 1);
        let err = post_transaction(&store, withdrawal(100_001, account_id)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance));
    }

    #[test]
    fn full_balance_policy_waives_the_minimum() {
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 1_000_000, 5);
        store
            .unit_of_work(|tx| {
                post_in_tx(
                    tx,
                    &withdrawal(1_000_000, account_id),
                    WithdrawalPolicy::AllowFullBalance,
                    Utc::now(),
                )
            })
            .unwrap();
        assert_eq!(store.account(account_id).unwrap().balance_cents, 0);
    }

    #[test]
    fn closed_account_rejects_everything() {
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 100_000, 1);
        store
            .unit_of_work(|tx| {
                tx.execute(
                    "UPDATE account SET status = 'Closed' WHERE account_id = ?1",
                    params![account_id],
                )?;
                Ok(())
            })
            .unwrap();
        let err = post_transaction(&store, deposit(100, account_id)).unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotActive(_)));
    }

    #[test]
    fn non_positive_amounts_are_rejected_before_any_read() {
        let store = Store::open_in_memory().unwrap();
        let err = post_transaction(&store, deposit(0, 999)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount));
    }

    #[test]
    fn missing_account_is_reported() {
        let store = Store::open_in_memory().unwrap();
        let err = post_transaction(&store, deposit(100, 42)).unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(42)));
    }

    #[test]
    fn balance_equals_sum_of_signed_amounts() {
        let store = Store::open_in_memory().unwrap();
        let account_id = seed_account(&store, 0, 1);
        post_transaction(&store, deposit(500_000, account_id)).unwrap();
        post_transaction(&store, withdrawal(120_000, account_id)).unwrap();
        post_transaction(&store, deposit(30_000, account_id)).unwrap();

        let account = store.account(account_id).unwrap();
        let signed_sum: i64 = store
            .transactions_for_account(account_id)
            .unwrap()
            .iter()
            .map(|t| t.kind.balance_sign() * t.amount_cents)
            .sum();
        assert_eq!(account.balance_cents, signed_sum);
    }
}
