use thiserror::Error;

/// Error type that captures ledger, lifecycle, and storage failures.
///
/// Business-rule violations (`InsufficientBalance`, `MinimumBalanceRequired`,
/// eligibility errors) are surfaced synchronously and never leave partial
/// state behind; the enclosing unit of work is rolled back.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Transaction amount must be positive")]
    InvalidAmount,
    #[error("Account not found: {0}")]
    AccountNotFound(i64),
    #[error("Account {0} is not active")]
    AccountNotActive(i64),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Minimum balance required: {0}")]
    MinimumBalanceRequired(String),
    #[error("Account {0} has an active fixed deposit; close the FD first")]
    AccountHasActiveFd(i64),
    #[error("Fixed deposit not found: {0}")]
    FdNotFound(i64),
    #[error("Fixed deposit {0} is not active")]
    FdNotActive(i64),
    #[error("Savings plan not found: {0}")]
    PlanNotFound(i64),
    #[error("FD plan not found: {0}")]
    FdPlanNotFound(i64),
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),
    #[error("A customer with NIC `{0}` already exists")]
    DuplicateNic(String),
    #[error("Ineligible plan: {0}")]
    IneligiblePlan(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
