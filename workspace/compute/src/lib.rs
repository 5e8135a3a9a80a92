//! Business rules of the university administration that touch more than one
//! table: balances, the semester rollover, admissions, the payment ledger and
//! the reporting aggregates.

pub mod admission;
pub mod balance;
pub mod error;
pub mod ledger;
pub mod reports;
pub mod rollover;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ComputeError, Result};
pub use rollover::{RolloverRequest, apply_semester_rollover, run_semester_rollover};
