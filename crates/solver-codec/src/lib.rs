//! Resolution codec for the intent solver.
//!
//! The resolver contract returns a `ResolvedOrder` whose entities (steps,
//! variable roles, payments, formulas, attributes) are each transported as
//! opaque bytes in their own mini-ABI: an ABI-encoded function call whose
//! function name is the entity's kind tag. This crate defines those wire
//! shapes, decodes them into the typed plan model, and drives the on-chain
//! `resolve(bytes)` view call.

pub mod decode;
pub mod resolve;
pub mod wire;

pub use decode::{decode_argument, decode_plan};
pub use resolve::resolve;
