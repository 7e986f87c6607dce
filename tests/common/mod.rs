#![allow(dead_code)]

use bank_core::domain::Actor;
use bank_core::lifecycle::{self, OpenAccountRequest};
use bank_core::store::Store;
use chrono::NaiveDate;

pub const TELLER: Actor = Actor::Employee(1);

/// Seeded plan ids from the store schema.
pub const CHILDREN_PLAN: i64 = 1;
pub const TEEN_PLAN: i64 = 2;
pub const ADULT_PLAN: i64 = 3;
pub const SENIOR_PLAN: i64 = 4;
pub const JOINT_PLAN: i64 = 5;
pub const FD_PLAN_6M: i64 = 1;
pub const FD_PLAN_1Y: i64 = 2;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn fresh_store() -> Store {
    Store::open_in_memory().expect("in-memory store")
}

/// Registers a customer born on `dob` with a unique-ish NIC.
pub fn customer(store: &Store, name: &str, nic: &str, dob: NaiveDate) -> i64 {
    lifecycle::register_customer(store, name, nic, dob).expect("register customer")
}

/// A holder old enough for any non-senior plan.
pub fn adult(store: &Store, nic: &str) -> i64 {
    customer(store, "A. Perera", nic, date(1990, 1, 1))
}

/// Opens a single-holder account and returns its id.
pub fn open_account(
    store: &Store,
    holder: i64,
    plan_id: i64,
    initial_deposit_cents: i64,
    as_of: NaiveDate,
) -> i64 {
    lifecycle::open_account(
        store,
        OpenAccountRequest {
            primary_holder: holder,
            joint_holders: Vec::new(),
            plan_id,
            branch_id: 1,
            initial_deposit_cents,
            actor: TELLER,
        },
        as_of,
    )
    .expect("open account")
}
