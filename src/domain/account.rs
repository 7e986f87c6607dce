use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A savings account row. `balance_cents` is only ever mutated through
/// `ledger::validator::post_transaction`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub balance_cents: i64,
    pub status: AccountStatus,
    pub open_date: NaiveDate,
    pub closed_at: Option<DateTime<Utc>>,
    pub plan_id: i64,
    /// At most one linked fixed deposit for the account's active lifetime.
    pub fd_id: Option<i64>,
    pub branch_id: i64,
}

impl Account {
    pub fn is_active(&self) -> bool {
        matches!(self.status, AccountStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Closed => "Closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Active" => Some(AccountStatus::Active),
            "Closed" => Some(AccountStatus::Closed),
            _ => None,
        }
    }
}
