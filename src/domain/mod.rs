//! Domain types for the ledger engine: accounts, transactions, fixed
//! deposits, plans, and customers. These are plain data carriers; all
//! behavior lives in the `ledger`, `lifecycle`, and `accrual` modules.

pub mod account;
pub mod customer;
pub mod fixed_deposit;
pub mod interest;
pub mod plan;
pub mod transaction;

pub use account::{Account, AccountStatus};
pub use customer::Customer;
pub use fixed_deposit::{FdStatus, FixedDeposit};
pub use interest::{FdInterestCalculation, InterestStatus, SavingsInterestCalculation};
pub use plan::{FdPlan, FdTerm, PlanChangeAudit, PlanType, SavingsPlan};
pub use transaction::{Actor, Transaction, TransactionKind};
