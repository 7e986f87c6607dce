//! FD-track accrual: interest is computed on the FD principal and
//! credited to the linked savings account; the tick ends with the
//! maturity sweep.

use chrono::{NaiveDate, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::currency::{format_lkr, format_rate_percent, interest_for_window, WINDOW_DAYS};
use crate::domain::{Actor, InterestStatus, TransactionKind};
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::validator::{post_in_tx, NewTransaction, WithdrawalPolicy};
use crate::store::{self, Store};

use super::{maturity, DueFdInterest, FdRunReport};

/// Active FDs (with a linked account) whose accrual window has elapsed.
pub fn due_fd_interest(store: &Store, as_of: NaiveDate) -> LedgerResult<Vec<DueFdInterest>> {
    store.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT fd.fd_id, fd.balance_cents, fd.open_date, p.rate_bps, a.account_id, \
                    (SELECT MAX(c.calculation_date) \
                     FROM fd_interest_calculation c \
                     WHERE c.fd_id = fd.fd_id AND c.status = 'credited') \
             FROM fixed_deposit fd \
             JOIN fd_plan p ON p.fd_plan_id = fd.fd_plan_id \
             JOIN account a ON a.fd_id = fd.fd_id \
             WHERE fd.status = 'Active' \
             ORDER BY fd.fd_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut due = Vec::new();
        for row in rows {
            let (fd_id, balance_cents, open_date, rate_bps, linked_account_id, last_credited) =
                row?;
            let anchor = last_credited.as_deref().unwrap_or(&open_date);
            let anchor = NaiveDate::parse_from_str(anchor, "%Y-%m-%d")
                .map_err(|e| LedgerError::Validation(format!("bad date `{anchor}`: {e}")))?;
            if (as_of - anchor).num_days() < WINDOW_DAYS {
                continue;
            }
            due.push(DueFdInterest {
                fd_id,
                linked_account_id,
                balance_cents,
                interest_cents: interest_for_window(balance_cents, rate_bps, WINDOW_DAYS),
                rate_bps,
                days_in_period: WINDOW_DAYS,
            });
        }
        Ok(due)
    })
}

/// One FD accrual tick: per-FD independent credits, then the maturity
/// sweep. Mirrors the savings tick's failure isolation.
pub fn run_fd_tick(store: &Store, as_of: NaiveDate, run_id: Uuid) -> LedgerResult<FdRunReport> {
    let due = due_fd_interest(store, as_of)?;
    let mut report = FdRunReport {
        run_id,
        as_of,
        due: due.len(),
        credited: 0,
        failed: 0,
        skipped: 0,
        total_interest_cents: 0,
        maturity: Default::default(),
    };
    tracing::info!(%run_id, %as_of, due = due.len(), "FD accrual tick started");

    for item in due {
        if item.interest_cents <= 0 {
            report.skipped += 1;
            continue;
        }
        match credit_one(store, &item, as_of) {
            Ok(()) => {
                report.credited += 1;
                report.total_interest_cents += item.interest_cents;
                tracing::debug!(
                    %run_id,
                    fd_id = item.fd_id,
                    account_id = item.linked_account_id,
                    interest = %format_lkr(item.interest_cents),
                    "credited FD interest"
                );
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(
                    %run_id,
                    fd_id = item.fd_id,
                    error = %err,
                    "FD interest credit failed"
                );
                if let Err(record_err) = record_failure(store, &item, as_of) {
                    tracing::error!(
                        %run_id,
                        fd_id = item.fd_id,
                        error = %record_err,
                        "could not record failed FD calculation"
                    );
                }
            }
        }
    }

    report.maturity = maturity::process_matured_fds(store, as_of, Actor::System)?;

    tracing::info!(
        %run_id,
        credited = report.credited,
        failed = report.failed,
        total = %format_lkr(report.total_interest_cents),
        matured = report.maturity.processed,
        principal_returned = %format_lkr(report.maturity.total_principal_returned_cents),
        "FD accrual tick finished"
    );
    Ok(report)
}

fn credit_one(store: &Store, item: &DueFdInterest, as_of: NaiveDate) -> LedgerResult<()> {
    store.unit_of_work(|tx| {
        let now = Utc::now();
        post_in_tx(
            tx,
            &NewTransaction {
                kind: TransactionKind::Interest,
                amount_cents: item.interest_cents,
                description: format!(
                    "Monthly FD Interest - {} Plan",
                    format_rate_percent(item.rate_bps)
                ),
                account_id: item.linked_account_id,
                actor: Actor::System,
            },
            WithdrawalPolicy::EnforceMinimum,
            now,
        )?;
        tx.execute(
            "INSERT INTO fd_interest_calculation \
                 (fd_id, calculation_date, interest_cents, days_in_period, \
                  credited_account_id, status, credited_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.fd_id,
                store::date_to_db(as_of),
                item.interest_cents,
                item.days_in_period,
                item.linked_account_id,
                InterestStatus::Credited.as_str(),
                store::ts_to_db(now),
            ],
        )?;
        Ok(())
    })
}

fn record_failure(store: &Store, item: &DueFdInterest, as_of: NaiveDate) -> LedgerResult<()> {
    store.unit_of_work(|tx| {
        tx.execute(
            "INSERT INTO fd_interest_calculation \
                 (fd_id, calculation_date, interest_cents, days_in_period, \
                  credited_account_id, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.fd_id,
                store::date_to_db(as_of),
                item.interest_cents,
                item.days_in_period,
                item.linked_account_id,
                InterestStatus::Failed.as_str(),
            ],
        )?;
        Ok(())
    })
}
