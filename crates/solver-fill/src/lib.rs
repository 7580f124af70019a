//! Plan filling.
//!
//! Executes a plan's steps strictly in declared order. Each step resolves
//! its witness arguments, waits for its scheduled timestamp, pre-simulates
//! for reverts, sends and awaits the receipt, extracts receipt-derived
//! variables, and interprets any revert under the step's revert policy.

pub mod filler;
pub mod schedule;
pub mod witness;

pub use filler::{fill, StepOutcome};
pub use schedule::unix_now;
