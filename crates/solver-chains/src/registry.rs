//! Registry for chain clients.
//!
//! Maintains the public and wallet clients per chain. The registry itself
//! is not thread-safe; wrap it in `Arc` once populated. The clients it
//! stores are already `Arc`-wrapped for sharing across plans.

use solver_types::{ClientSource, PublicClient, Result, SolverError, WalletClient};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Default)]
pub struct ClientRegistry {
	public: HashMap<u64, Arc<dyn PublicClient>>,
	wallet: HashMap<u64, Arc<dyn WalletClient>>,
}

impl ClientRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a public client for a chain. Errors on duplicates.
	pub fn register_public(&mut self, chain_id: u64, client: Arc<dyn PublicClient>) -> Result<()> {
		info!(chain_id, "registering public client");
		if self.public.insert(chain_id, client).is_some() {
			return Err(SolverError::Config(format!(
				"public client for chain {chain_id} already registered"
			)));
		}
		Ok(())
	}

	/// Registers a wallet client for a chain. Errors on duplicates.
	pub fn register_wallet(&mut self, chain_id: u64, client: Arc<dyn WalletClient>) -> Result<()> {
		info!(chain_id, "registering wallet client");
		if self.wallet.insert(chain_id, client).is_some() {
			return Err(SolverError::Config(format!(
				"wallet client for chain {chain_id} already registered"
			)));
		}
		Ok(())
	}

	pub fn public(&self, chain_id: u64) -> Result<Arc<dyn PublicClient>> {
		self.public.get(&chain_id).cloned().ok_or_else(|| {
			SolverError::Config(format!("no public client configured for chain {chain_id}"))
		})
	}

	pub fn wallet(&self, chain_id: u64) -> Result<Arc<dyn WalletClient>> {
		self.wallet.get(&chain_id).cloned().ok_or_else(|| {
			SolverError::Config(format!("no wallet client configured for chain {chain_id}"))
		})
	}

	pub fn supports(&self, chain_id: u64) -> bool {
		self.public.contains_key(&chain_id)
	}
}

impl ClientSource for ClientRegistry {
	fn public(&self, chain_id: u64) -> Result<Arc<dyn PublicClient>> {
		ClientRegistry::public(self, chain_id)
	}

	fn wallet(&self, chain_id: u64) -> Result<Arc<dyn WalletClient>> {
		ClientRegistry::wallet(self, chain_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{Address, Bytes, B256};
	use async_trait::async_trait;
	use solver_types::{
		BlockInfo, CallRequest, SimulationCall, SimulationOutcome, TransactionReceipt,
	};

	struct NullClient;

	#[async_trait]
	impl PublicClient for NullClient {
		async fn call(&self, _request: CallRequest) -> Result<Bytes> {
			Ok(Bytes::new())
		}

		async fn simulate_calls(
			&self,
			_account: Address,
			_calls: Vec<SimulationCall>,
			_block_number: Option<u64>,
		) -> Result<Vec<SimulationOutcome>> {
			Ok(vec![])
		}

		async fn wait_for_transaction_receipt(&self, _hash: B256) -> Result<TransactionReceipt> {
			Err(SolverError::Transport("null client".to_string()))
		}

		async fn get_block(&self, _number: u64) -> Result<BlockInfo> {
			Err(SolverError::Transport("null client".to_string()))
		}
	}

	#[test]
	fn test_register_and_lookup() {
		let mut registry = ClientRegistry::new();
		registry.register_public(1, Arc::new(NullClient)).unwrap();

		assert!(registry.supports(1));
		assert!(!registry.supports(2));
		assert!(registry.public(1).is_ok());
		assert!(registry.public(2).is_err());
		assert!(registry.wallet(1).is_err());
	}

	#[test]
	fn test_duplicate_registration_rejected() {
		let mut registry = ClientRegistry::new();
		registry.register_public(1, Arc::new(NullClient)).unwrap();
		assert!(registry.register_public(1, Arc::new(NullClient)).is_err());
	}
}
