use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::transaction::Actor;

/// Immutable savings-plan reference data. Rates are annual basis points;
/// `min_balance_cents` is the floor an active account must retain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsPlan {
    pub id: i64,
    pub plan_type: PlanType,
    pub rate_bps: i64,
    pub min_balance_cents: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanType {
    Children,
    Teen,
    Adult,
    Senior,
    Joint,
}

impl PlanType {
    /// Minimum age of the primary holder for this plan type.
    pub fn required_age(&self) -> u32 {
        match self {
            PlanType::Children => 0,
            PlanType::Teen => 12,
            PlanType::Adult | PlanType::Joint => 18,
            PlanType::Senior => 60,
        }
    }

    /// Plans held by minors carry a birth-certificate credential instead
    /// of a NIC; moving off them requires supplying one.
    pub fn is_minor_plan(&self) -> bool {
        matches!(self, PlanType::Children | PlanType::Teen)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Children => "Children",
            PlanType::Teen => "Teen",
            PlanType::Adult => "Adult",
            PlanType::Senior => "Senior",
            PlanType::Joint => "Joint",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Children" => Some(PlanType::Children),
            "Teen" => Some(PlanType::Teen),
            "Adult" => Some(PlanType::Adult),
            "Senior" => Some(PlanType::Senior),
            "Joint" => Some(PlanType::Joint),
            _ => None,
        }
    }
}

/// Immutable fixed-deposit plan reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FdPlan {
    pub id: i64,
    pub term: FdTerm,
    pub rate_bps: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FdTerm {
    SixMonths,
    OneYear,
    ThreeYears,
}

impl FdTerm {
    pub fn months(&self) -> u32 {
        match self {
            FdTerm::SixMonths => 6,
            FdTerm::OneYear => 12,
            FdTerm::ThreeYears => 36,
        }
    }

    /// Maturity date for a term starting at `from`. Month-end overflow
    /// clamps to the last day of the target month.
    pub fn maturity_from(&self, from: NaiveDate) -> NaiveDate {
        from.checked_add_months(Months::new(self.months()))
            .unwrap_or(from)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FdTerm::SixMonths => "6 months",
            FdTerm::OneYear => "1 year",
            FdTerm::ThreeYears => "3 years",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "6 months" => Some(FdTerm::SixMonths),
            "1 year" => Some(FdTerm::OneYear),
            "3 years" => Some(FdTerm::ThreeYears),
            _ => None,
        }
    }
}

/// Audit row written by `lifecycle::change_plan`; plan changes move no
/// money but always record who changed what and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanChangeAudit {
    pub id: i64,
    pub account_id: i64,
    pub old_plan_id: i64,
    pub new_plan_id: i64,
    pub actor: Actor,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}
