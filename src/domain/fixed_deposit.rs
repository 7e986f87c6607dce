use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fixed-deposit row, logically owned by exactly one account (via
/// `Account::fd_id`) while active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedDeposit {
    pub id: i64,
    pub balance_cents: i64,
    pub status: FdStatus,
    pub open_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub auto_renew: bool,
    pub plan_id: i64,
}

impl FixedDeposit {
    pub fn is_active(&self) -> bool {
        matches!(self.status, FdStatus::Active)
    }

    pub fn is_matured(&self, as_of: NaiveDate) -> bool {
        self.maturity_date < as_of
    }
}

/// Closed is terminal: a matured non-renewing FD and a manually
/// deactivated FD both end here with principal returned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FdStatus {
    Active,
    Closed,
}

impl FdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FdStatus::Active => "Active",
            FdStatus::Closed => "Closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Active" => Some(FdStatus::Active),
            "Closed" => Some(FdStatus::Closed),
            _ => None,
        }
    }
}
