//! The ledger: validated, atomic balance mutation.

pub mod validator;

pub use validator::{post_transaction, NewTransaction, WithdrawalPolicy};
