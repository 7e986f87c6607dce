//! Maturity sweep: closes or rolls over FDs whose maturity date has
//! passed. Interest for the final window is handled by the accrual loop;
//! no money moves during a rollover.

use chrono::NaiveDate;
use rusqlite::params;

use crate::currency::format_lkr;
use crate::domain::Actor;
use crate::errors::{LedgerError, LedgerResult};
use crate::lifecycle::fixed_deposit::close_fd_returning_principal;
use crate::store::{self, Store};

use super::MaturityReport;

/// Processes every Active FD whose maturity date lies before `as_of`:
/// auto-renewing FDs start a new term of the same length and balance;
/// the rest are closed with principal returned to the linked account.
/// Each FD is its own unit of work; a failure is logged and skipped.
pub fn process_matured_fds(
    store: &Store,
    as_of: NaiveDate,
    actor: Actor,
) -> LedgerResult<MaturityReport> {
    let matured: Vec<i64> = store.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT fd_id FROM fixed_deposit \
             WHERE status = 'Active' AND maturity_date < ?1 \
             ORDER BY fd_id",
        )?;
        let rows = stmt.query_map(params![store::date_to_db(as_of)], |row| row.get(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    })?;

    let mut report = MaturityReport::default();
    for fd_id in matured {
        match process_one(store, fd_id, actor) {
            Ok(MaturityOutcome::Renewed { new_maturity }) => {
                report.processed += 1;
                report.renewed += 1;
                tracing::info!(fd_id, %new_maturity, "rolled over matured FD");
            }
            Ok(MaturityOutcome::Closed { returned_cents }) => {
                report.processed += 1;
                report.closed += 1;
                report.total_principal_returned_cents += returned_cents;
                tracing::info!(
                    fd_id,
                    returned = %format_lkr(returned_cents),
                    "closed matured FD"
                );
            }
            Err(err) => {
                tracing::warn!(fd_id, error = %err, "maturity processing failed for FD");
            }
        }
    }
    Ok(report)
}

enum MaturityOutcome {
    Renewed { new_maturity: NaiveDate },
    Closed { returned_cents: i64 },
}

fn process_one(store: &Store, fd_id: i64, actor: Actor) -> LedgerResult<MaturityOutcome> {
    store.unit_of_work(|tx| {
        let fd = store::fetch_fixed_deposit(tx, fd_id)?;
        if !fd.is_active() {
            return Err(LedgerError::FdNotActive(fd_id));
        }
        if fd.auto_renew {
            let plan = store::fetch_fd_plan(tx, fd.plan_id)?;
            // The new term starts where the old one ended, not at the
            // sweep date, so late sweeps do not stretch the term.
            let new_maturity = plan.term.maturity_from(fd.maturity_date);
            tx.execute(
                "UPDATE fixed_deposit SET maturity_date = ?1 WHERE fd_id = ?2",
                params![store::date_to_db(new_maturity), fd.id],
            )?;
            Ok(MaturityOutcome::Renewed { new_maturity })
        } else {
            let description = format!("FD Maturity - Principal Return (FD {fd_id})");
            let returned = close_fd_returning_principal(tx, &fd, &description, actor)?;
            Ok(MaturityOutcome::Closed {
                returned_cents: returned.returned_cents,
            })
        }
    })
}
