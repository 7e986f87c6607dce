use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only ledger transaction. Amounts are always positive; the
/// sign applied to the balance comes from `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub posted_at: DateTime<Utc>,
    pub description: String,
    pub account_id: i64,
    pub actor: Actor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Interest,
}

impl TransactionKind {
    /// Sign applied to the account balance: deposits and interest credit,
    /// withdrawals debit.
    pub fn balance_sign(&self) -> i64 {
        match self {
            TransactionKind::Deposit | TransactionKind::Interest => 1,
            TransactionKind::Withdrawal => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
            TransactionKind::Interest => "Interest",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Deposit" => Some(TransactionKind::Deposit),
            "Withdrawal" => Some(TransactionKind::Withdrawal),
            "Interest" => Some(TransactionKind::Interest),
            _ => None,
        }
    }
}

/// The identity acting on a financial row, threaded explicitly through
/// every mutating call and recorded for audit. Scheduler credits are
/// posted as `System`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Actor {
    System,
    Employee(i64),
}

impl Actor {
    pub fn as_db_string(&self) -> String {
        match self {
            Actor::System => "system".to_string(),
            Actor::Employee(id) => format!("employee:{}", id),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "system" {
            return Some(Actor::System);
        }
        raw.strip_prefix("employee:")
            .and_then(|id| id.parse().ok())
            .map(Actor::Employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_db_string_round_trips() {
        assert_eq!(Actor::parse("system"), Some(Actor::System));
        assert_eq!(Actor::parse("employee:42"), Some(Actor::Employee(42)));
        assert_eq!(Actor::parse(&Actor::Employee(7).as_db_string()), Some(Actor::Employee(7)));
        assert_eq!(Actor::parse("teller:1"), None);
    }

    #[test]
    fn kind_signs_match_direction() {
        assert_eq!(TransactionKind::Deposit.balance_sign(), 1);
        assert_eq!(TransactionKind::Interest.balance_sign(), 1);
        assert_eq!(TransactionKind::Withdrawal.balance_sign(), -1);
    }
}
