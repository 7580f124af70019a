//! Configuration for the intent solver.
//!
//! Declares the TOML-first configuration shape (chains, filler identity,
//! payment routing, whitelist, static price tables) and a loader with
//! environment-variable overrides.

pub mod loader;
pub mod serde_helpers;
pub mod types;

pub use loader::ConfigLoader;
pub use types::*;
