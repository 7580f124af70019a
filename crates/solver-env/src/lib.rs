//! The variable dependency environment.
//!
//! Plans parameterize chain calls by indexed variables whose values arrive
//! from the context, from on-chain queries, from receipts, or from witness
//! plugins. [`VariableEnv`] caches those values and lazily recomputes them,
//! tracking freshness with per-slot monotonic ticks over the dependency
//! graph induced by query arguments. The call builder and formula
//! evaluation live here too; they are the recursion seam through which
//! query computation reads other variables.

pub mod calldata;
pub mod env;
pub mod eval;

pub use calldata::{build_call_data, resolve_arguments};
pub use env::VariableEnv;
pub use eval::eval_formula;
