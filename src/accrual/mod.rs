//! Interest accrual: per-account 30-day cycles for savings accounts and
//! fixed deposits, plus the FD maturity sweep.
//!
//! Due-ness is anchored to each item's last *credited* audit row (or its
//! open date when it has never been credited), so a `failed` attempt does
//! not advance the window and is retried on the next tick, while a second
//! run on the same day credits nothing.

pub mod fd;
pub mod maturity;
pub mod savings;

pub use fd::{due_fd_interest, run_fd_tick};
pub use maturity::process_matured_fds;
pub use savings::{due_savings_interest, run_savings_tick};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::PlanType;

/// A savings account whose accrual window has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSavingsInterest {
    pub account_id: i64,
    pub balance_cents: i64,
    pub interest_cents: i64,
    pub rate_bps: i64,
    pub plan_type: PlanType,
}

/// An FD whose accrual window has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueFdInterest {
    pub fd_id: i64,
    pub linked_account_id: i64,
    pub balance_cents: i64,
    pub interest_cents: i64,
    pub rate_bps: i64,
    pub days_in_period: i64,
}

/// Outcome of one savings accrual tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavingsRunReport {
    pub run_id: Uuid,
    pub as_of: NaiveDate,
    pub due: usize,
    pub credited: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_interest_cents: i64,
}

/// Outcome of one FD accrual tick, maturity sweep included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdRunReport {
    pub run_id: Uuid,
    pub as_of: NaiveDate,
    pub due: usize,
    pub credited: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_interest_cents: i64,
    pub maturity: MaturityReport,
}

/// Outcome of one maturity sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaturityReport {
    pub processed: usize,
    pub renewed: usize,
    pub closed: usize,
    pub total_principal_returned_cents: i64,
}
