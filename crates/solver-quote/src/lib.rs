//! Plan quoting.
//!
//! Walks a plan for its asset flows (gas per step, token outflows from
//! spend attributes, token inflows from payments), evaluates their amounts
//! through a fresh variable environment (simulating steps whose gas has no
//! explicit formula), prices everything in USD through the context, and
//! gates on non-negative profit. The populated environment is handed to the
//! filler so query results are not recomputed.

pub mod flows;
pub mod quoter;

pub use flows::{collect_flows, EvaluatedFlow, Flow, FlowDirection};
pub use quoter::{quote, Quote};
