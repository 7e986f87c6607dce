use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The slice of customer master data the engine consults for eligibility
/// checks. Full contact/KYC records live outside this core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    /// National identity credential; a birth-certificate number for
    /// minors, replaced by a NIC on transition to an adult plan.
    pub nic: String,
    pub date_of_birth: NaiveDate,
}

impl Customer {
    /// Whole years elapsed since the date of birth.
    pub fn age_on(&self, as_of: NaiveDate) -> u32 {
        let years = as_of.years_since(self.date_of_birth);
        years.unwrap_or(0)
    }
}
