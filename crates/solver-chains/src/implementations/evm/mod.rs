//! Alloy-backed EVM client.
//!
//! One [`AlloyChainClient`] serves both client traits for a chain: reads
//! go through `eth_call` with revert-data capture from JSON-RPC error
//! payloads, simulation combines a call with gas estimation, and sends go
//! through a wallet-filled provider that handles signing, nonces and fees.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use async_trait::async_trait;
use solver_types::{
	BlockInfo, CallRequest, PublicClient, Result, SimulationCall, SimulationOutcome,
	SolverError, TransactionReceipt, WalletClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long to poll for a receipt before giving up.
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(600);
/// Receipt poll interval.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct AlloyChainClient {
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	chain_id: u64,
}

impl AlloyChainClient {
	/// Connects to an HTTP RPC endpoint with a wallet for signing.
	pub fn connect(rpc_url: &str, chain_id: u64, mut signer: PrivateKeySigner) -> Result<Self> {
		let url = rpc_url
			.parse()
			.map_err(|e| SolverError::Config(format!("invalid RPC URL: {e}")))?;

		signer = signer.with_chain_id(Some(chain_id));
		let wallet = EthereumWallet::from(signer);

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(url);

		Ok(Self {
			provider: Arc::new(provider),
			chain_id,
		})
	}

	fn request(&self, from: Option<Address>, to: Address, data: Bytes) -> TransactionRequest {
		TransactionRequest {
			from,
			to: Some(TxKind::Call(to)),
			input: TransactionInput {
				input: Some(data),
				data: None,
			},
			chain_id: Some(self.chain_id),
			..Default::default()
		}
	}

	/// Extracts revert bytes from an `execution reverted` error payload.
	fn revert_bytes(error: &TransportError) -> Option<Bytes> {
		let payload = error.as_error_resp()?;
		let data = payload.data.as_ref()?;
		let text: String = serde_json::from_str(data.get()).ok()?;
		hex::decode(text.trim_start_matches("0x")).ok().map(Bytes::from)
	}

	fn transport(error: TransportError) -> SolverError {
		SolverError::Transport(error.to_string())
	}
}

#[async_trait]
impl PublicClient for AlloyChainClient {
	async fn call(&self, request: CallRequest) -> Result<Bytes> {
		let tx = self.request(None, request.to, request.data);
		let mut call = self.provider.call(&tx);
		if let Some(number) = request.block_number {
			call = call.block(number.into());
		}
		call.await.map_err(Self::transport)
	}

	async fn simulate_calls(
		&self,
		account: Address,
		calls: Vec<SimulationCall>,
		block_number: Option<u64>,
	) -> Result<Vec<SimulationOutcome>> {
		let mut outcomes = Vec::with_capacity(calls.len());
		for simulation in calls {
			let tx = self.request(Some(account), simulation.to, simulation.data);
			let mut call = self.provider.call(&tx);
			if let Some(number) = block_number {
				call = call.block(number.into());
			}

			match call.await {
				Ok(return_data) => {
					let gas = self
						.provider
						.estimate_gas(&tx)
						.await
						.map_err(Self::transport)?;
					outcomes.push(SimulationOutcome {
						success: true,
						gas_used: U256::from(gas),
						return_data,
					});
				}
				Err(error) if error.as_error_resp().is_some() => {
					let return_data = Self::revert_bytes(&error).unwrap_or_default();
					debug!(chain = self.chain_id, "simulated call reverted");
					outcomes.push(SimulationOutcome {
						success: false,
						gas_used: U256::ZERO,
						return_data,
					});
				}
				Err(error) => return Err(Self::transport(error)),
			}
		}
		Ok(outcomes)
	}

	async fn wait_for_transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
		let started = tokio::time::Instant::now();
		loop {
			if started.elapsed() > RECEIPT_TIMEOUT {
				return Err(SolverError::Transport(format!(
					"timed out waiting for receipt of {hash} after {}s",
					RECEIPT_TIMEOUT.as_secs()
				)));
			}

			match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => {
					let block_number = receipt.block_number.ok_or_else(|| {
						SolverError::Transport(format!("receipt for {hash} has no block number"))
					})?;
					return Ok(TransactionReceipt {
						transaction_hash: receipt.transaction_hash,
						block_number,
						success: receipt.status(),
						gas_used: U256::from(receipt.gas_used),
						effective_gas_price: U256::from(receipt.effective_gas_price),
					});
				}
				Ok(None) => {
					debug!(tx_hash = %hash, "transaction not yet mined");
					tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
				}
				Err(error) => return Err(Self::transport(error)),
			}
		}
	}

	async fn get_block(&self, number: u64) -> Result<BlockInfo> {
		let block: serde_json::Value = self
			.provider
			.client()
			.request("eth_getBlockByNumber", (format!("0x{number:x}"), false))
			.await
			.map_err(Self::transport)?;

		let timestamp = block
			.get("timestamp")
			.and_then(|value| value.as_str())
			.and_then(|value| u64::from_str_radix(value.trim_start_matches("0x"), 16).ok())
			.ok_or_else(|| {
				SolverError::Transport(format!("block {number} missing or malformed timestamp"))
			})?;

		Ok(BlockInfo { number, timestamp })
	}
}

#[async_trait]
impl WalletClient for AlloyChainClient {
	async fn send_transaction(&self, account: Address, to: Address, data: Bytes) -> Result<B256> {
		let tx = self.request(Some(account), to, data);
		let pending = self
			.provider
			.send_transaction(tx)
			.await
			.map_err(|e| SolverError::Transport(format!("failed to send transaction: {e}")))?;

		let hash = *pending.tx_hash();
		info!(tx_hash = %hash, chain = self.chain_id, "submitted transaction");
		Ok(hash)
	}
}
