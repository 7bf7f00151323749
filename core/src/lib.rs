//! debenture-core — the commission/remuneration engine behind a debenture
//! distribution platform.
//!
//! The platform's screens are thin; the hard parts live here:
//!   - expanding each investment into its amortized commission and
//!     remuneration installment schedules (`split`, `schedule`, `ledger`),
//!   - deciding, per field and per viewer, what a screen may render
//!     (`hierarchy`, `visibility`, `access`).
//!
//! The store is the only module that executes SQL. Everything above it is
//! pure or store-mediated, so the gates are safe to call on every render.

pub mod access;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod investment;
pub mod ledger;
pub mod sample;
pub mod schedule;
pub mod split;
pub mod store;
pub mod types;
pub mod visibility;
