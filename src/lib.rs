#![doc(test(attr(deny(warnings))))]

//! Bank Core is the ledger and interest-accrual engine of a retail-banking
//! back office: validated balance mutation, account and fixed-deposit
//! lifecycle, and recurring 30-day interest accrual with maturity
//! processing.

pub mod accrual;
pub mod config;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod scheduler;
pub mod store;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("bank_core=info".parse().expect("valid directive"));
        fmt().with_env_filter(filter).init();
        tracing::info!("Bank Core tracing initialized.");
    });
}
