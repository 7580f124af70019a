//! Chain clients for the intent solver.
//!
//! This crate provides the [`ClientRegistry`] that maps chain ids to
//! public/wallet client pairs, and an Alloy-backed implementation of the
//! client traits speaking JSON-RPC over HTTP.

pub mod implementations;
pub mod registry;

pub use implementations::evm::AlloyChainClient;
pub use registry::ClientRegistry;
