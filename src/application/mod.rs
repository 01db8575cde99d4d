//! Batch orchestration.
//!
//! Intake stores the uploaded file and seeds the batch's variable bag, the
//! phase workers advance it one job at a time, and the callback dispatcher
//! reports the outcome back to the caller. [`runner::BatchRunner`] drives all
//! of them in process.

pub mod callback;
pub mod intake;
pub mod ledger;
pub mod runner;
pub mod workers;
