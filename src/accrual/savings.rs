//! Savings-track accrual: the due query and the per-account credit loop.

use chrono::{NaiveDate, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::currency::{format_lkr, interest_for_window, WINDOW_DAYS};
use crate::domain::{Actor, InterestStatus, PlanType, TransactionKind};
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::validator::{post_in_tx, NewTransaction, WithdrawalPolicy};
use crate::store::{self, Store};

use super::{DueSavingsInterest, SavingsRunReport};

/// Active accounts whose last credited window (or open date) lies at
/// least [`WINDOW_DAYS`] before `as_of`, with one window's interest
/// computed at the plan rate.
pub fn due_savings_interest(
    store: &Store,
    as_of: NaiveDate,
) -> LedgerResult<Vec<DueSavingsInterest>> {
    store.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT a.account_id, a.balance_cents, a.open_date, p.rate_bps, p.plan_type, \
                    (SELECT MAX(s.calculation_date) \
                     FROM savings_interest_calculation s \
                     WHERE s.account_id = a.account_id AND s.status = 'credited') \
             FROM account a JOIN savings_plan p ON p.plan_id = a.plan_id \
             WHERE a.status = 'Active' \
             ORDER BY a.account_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut due = Vec::new();
        for row in rows {
            let (account_id, balance_cents, open_date, rate_bps, plan_type, last_credited) =
                row?;
            let plan_type = PlanType::parse(&plan_type).ok_or_else(|| {
                LedgerError::Validation(format!("unknown plan type `{plan_type}`"))
            })?;
            let anchor = parse_date(last_credited.as_deref().unwrap_or(&open_date))?;
            if (as_of - anchor).num_days() < WINDOW_DAYS {
                continue;
            }
            due.push(DueSavingsInterest {
                account_id,
                balance_cents,
                interest_cents: interest_for_window(balance_cents, rate_bps, WINDOW_DAYS),
                rate_bps,
                plan_type,
            });
        }
        Ok(due)
    })
}

/// One savings accrual tick: credits each due account independently and
/// records a `credited` or `failed` audit row per attempt. One account's
/// failure never rolls back another's credit.
pub fn run_savings_tick(
    store: &Store,
    as_of: NaiveDate,
    run_id: Uuid,
) -> LedgerResult<SavingsRunReport> {
    let due = due_savings_interest(store, as_of)?;
    let mut report = SavingsRunReport {
        run_id,
        as_of,
        due: due.len(),
        credited: 0,
        failed: 0,
        skipped: 0,
        total_interest_cents: 0,
    };
    tracing::info!(%run_id, %as_of, due = due.len(), "savings accrual tick started");

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
                    account_id = item.account_id,
                    interest = %format_lkr(item.interest_cents),
                    "credited savings interest"
                );
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(
                    %run_id,
                    account_id = item.account_id,
                    error = %err,
                    "savings interest credit failed"
                );
                if let Err(record_err) = record_failure(store, &item, as_of) {
                    tracing::error!(
                        %run_id,
                        account_id = item.account_id,
                        error = %record_err,
                        "could not record failed savings calculation"
                    );
                }
            }
        }
    }

    tracing::info!(
        %run_id,
        credited = report.credited,
        failed = report.failed,
        skipped = report.skipped,
        total = %format_lkr(report.total_interest_cents),
        "savings accrual tick finished"
    );
    Ok(report)
}

/// Credits one account and writes its `credited` row in a single unit of
/// work, so the interest transaction and the audit row land together.
fn credit_one(store: &Store, item: &DueSavingsInterest, as_of: NaiveDate) -> LedgerResult<()> {
    store.unit_of_work(|tx| {
        let now = Utc::now();
        post_in_tx(
            tx,
            &NewTransaction {
                kind: TransactionKind::Interest,
                amount_cents: item.interest_cents,
                description: format!(
                    "Monthly Savings Interest - {} Plan",
                    item.plan_type.as_str()
                ),
                account_id: item.account_id,
                actor: Actor::System,
            },
            WithdrawalPolicy::EnforceMinimum,
            now,
        )?;
        tx.execute(
            "INSERT INTO savings_interest_calculation \
                 (account_id, calculation_date, interest_cents, rate_bps, plan_type, \
                  status, credited_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.account_id,
                store::date_to_db(as_of),
                item.interest_cents,
                item.rate_bps,
                item.plan_type.as_str(),
                InterestStatus::Credited.as_str(),
                store::ts_to_db(now),
            ],
        )?;
        Ok(())
    })
}

fn record_failure(store: &Store, item: &DueSavingsInterest, as_of: NaiveDate) -> LedgerResult<()> {
    store.unit_of_work(|tx| {
        tx.execute(
            "INSERT INTO savings_interest_calculation \
                 (account_id, calculation_date, interest_cents, rate_bps, plan_type, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.account_id,
                store::date_to_db(as_of),
                item.interest_cents,
                item.rate_bps,
                item.plan_type.as_str(),
                InterestStatus::Failed.as_str(),
            ],
        )?;
        Ok(())
    })
}

fn parse_date(raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| LedgerError::Validation(format!("bad date `{raw}`: {e}")))
}
