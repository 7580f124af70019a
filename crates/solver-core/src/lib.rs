//! Orchestration core of the intent solver.
//!
//! Runs the full pipeline over a resolved plan: preflight validation
//! (revert-policy ordering, deadline slack, assumption whitelisting,
//! witness support), then quote, then fill. Also provides a
//! configuration-backed [`SolverContext`] implementation.
//!
//! [`SolverContext`]: solver_types::SolverContext

pub mod context;
pub mod preflight;
pub mod process;

pub use context::ConfiguredContext;
pub use preflight::{preflight, MAX_FILL_TIME_SECONDS};
pub use process::{process, resolve_and_process};
