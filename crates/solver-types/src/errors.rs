//! Error types for the solver system.

use alloy_primitives::I256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
	#[error("Codec error: {0}")]
	Codec(String),

	#[error("Preflight rejection: {0}")]
	Preflight(String),

	#[error("Quote rejection: {0}")]
	Quote(String),

	#[error("Fill error: {0}")]
	Fill(String),

	#[error("Variable error: {0}")]
	Variable(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Transport error: {0}")]
	Transport(String),

	#[error("Negative PnL: {pnl}")]
	NegativePnl { pnl: I256 },

	#[error("Deadline too close: earliest {earliest}, now {now}")]
	DeadlineTooClose { earliest: u64, now: u64 },

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}
