//! The interface surface the core requires from its host process.
//!
//! Everything outside the core (chain transports, witness plugins, price
//! sources, whitelists) arrives through [`SolverContext`]. The core never
//! talks to a chain except through the client traits below.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;

use crate::account::Account;
use crate::errors::Result;
use crate::value::AbiEncodedValue;

/// A read-only contract call.
#[derive(Debug, Clone)]
pub struct CallRequest {
	pub to: Address,
	pub data: Bytes,
	/// Pin the call to a block; `None` means latest.
	pub block_number: Option<u64>,
}

/// One call inside a simulation batch.
#[derive(Debug, Clone)]
pub struct SimulationCall {
	pub to: Address,
	pub data: Bytes,
}

/// Result of simulating one call.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
	pub success: bool,
	pub gas_used: U256,
	/// Return data on success, revert data on failure.
	pub return_data: Bytes,
}

/// The receipt fields the core consumes.
#[derive(Debug, Clone)]
pub struct TransactionReceipt {
	pub transaction_hash: B256,
	pub block_number: u64,
	pub success: bool,
	pub gas_used: U256,
	pub effective_gas_price: U256,
}

/// The block fields the core consumes.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
	pub number: u64,
	pub timestamp: u64,
}

/// Read-capable chain client.
#[async_trait]
pub trait PublicClient: Send + Sync {
	async fn call(&self, request: CallRequest) -> Result<Bytes>;

	/// Simulates the calls as the given account, optionally pinned to a
	/// block. One outcome per call, in order.
	async fn simulate_calls(
		&self,
		account: Address,
		calls: Vec<SimulationCall>,
		block_number: Option<u64>,
	) -> Result<Vec<SimulationOutcome>>;

	async fn wait_for_transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt>;

	async fn get_block(&self, number: u64) -> Result<BlockInfo>;
}

/// Send-capable chain client.
#[async_trait]
pub trait WalletClient: Send + Sync {
	async fn send_transaction(&self, account: Address, to: Address, data: Bytes) -> Result<B256>;
}

/// Maps chain ids to client pairs. Contexts usually delegate their client
/// lookups to an implementation of this trait.
pub trait ClientSource: Send + Sync {
	fn public(&self, chain_id: u64) -> Result<Arc<dyn PublicClient>>;
	fn wallet(&self, chain_id: u64) -> Result<Arc<dyn WalletClient>>;
}

/// Kind-specific plugin producing witness values at fill time.
#[async_trait]
pub trait WitnessResolver: Send + Sync {
	async fn resolve(&self, data: &Bytes, values: Vec<AbiEncodedValue>) -> Result<AbiEncodedValue>;
}

/// The complete surface the core requires from the host.
#[async_trait]
pub trait SolverContext: Send + Sync {
	fn public_client(&self, chain_id: u64) -> Result<Arc<dyn PublicClient>>;

	fn wallet_client(&self, chain_id: u64) -> Result<Arc<dyn WalletClient>>;

	/// Chain on which the solver prefers to be paid.
	fn payment_chain(&self) -> u64;

	/// The solver's payment recipient on the given chain.
	fn payment_recipient(&self, chain_id: u64) -> Result<Address>;

	/// The identity sending fill transactions.
	fn filler_address(&self) -> Address;

	fn is_whitelisted(&self, account: &Account, kind: &str) -> bool;

	fn witness_resolver(&self, kind: &str) -> Option<Arc<dyn WitnessResolver>>;

	/// Integer USD price per smallest token unit.
	async fn token_price_usd(&self, token: &Account) -> Result<U256>;

	/// Integer USD price per gas unit.
	async fn gas_price_usd(&self, chain_id: u64) -> Result<U256>;
}
