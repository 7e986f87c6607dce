use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::PlanType;

/// Outcome of a single accrual attempt. A `Credited` row is what advances
/// an account's 30-day window; `Failed` rows leave the window open so the
/// next tick retries naturally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InterestStatus {
    Credited,
    Failed,
}

impl InterestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestStatus::Credited => "credited",
            InterestStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "credited" => Some(InterestStatus::Credited),
            "failed" => Some(InterestStatus::Failed),
            _ => None,
        }
    }
}

/// Append-only audit row for one savings accrual attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsInterestCalculation {
    pub id: i64,
    pub account_id: i64,
    pub calculation_date: NaiveDate,
    pub interest_cents: i64,
    pub rate_bps: i64,
    pub plan_type: PlanType,
    pub status: InterestStatus,
    pub credited_at: Option<DateTime<Utc>>,
}

/// Append-only audit row for one FD accrual attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FdInterestCalculation {
    pub id: i64,
    pub fd_id: i64,
    pub calculation_date: NaiveDate,
    pub interest_cents: i64,
    pub days_in_period: i64,
    pub credited_account_id: i64,
    pub status: InterestStatus,
    pub credited_at: Option<DateTime<Utc>>,
}
