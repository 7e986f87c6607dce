//! Daemon entry point: opens the store and keeps the two interest
//! schedulers running until the process is terminated. Termination is the
//! only abort path; per-item commits make it safe at any instant.

use std::sync::Arc;

use bank_core::config::ConfigManager;
use bank_core::errors::LedgerResult;
use bank_core::scheduler;
use bank_core::store::Store;

fn main() -> LedgerResult<()> {
    bank_core::init();

    let manager = ConfigManager::new()?;
    let mut config = manager.load()?;
    config.apply_env();
    tracing::info!(db = %config.db_path.display(), "opening ledger store");

    let store = Arc::new(Store::open(&config.db_path)?);
    let _schedulers = scheduler::spawn(store, config.schedule());

    loop {
        std::thread::park();
    }
}
