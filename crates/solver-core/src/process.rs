//! The orchestration entrypoints.

use alloy_primitives::Bytes;
use solver_fill::{fill, unix_now};
use solver_quote::quote;
use solver_types::{Account, Plan, Result, SolverContext};
use tracing::info;

use crate::preflight::preflight;

/// Processes a resolved plan: preflight, quote, fill. Returns `true` when
/// the plan filled end-to-end, `false` when a revert policy dropped it.
pub async fn process(ctx: &dyn SolverContext, plan: &Plan) -> Result<bool> {
	preflight(ctx, plan, unix_now())?;

	let quote = quote(ctx, plan).await?;
	let mut env = quote.env;

	let filled = fill(ctx, plan, &mut env).await?;
	info!(filled, "plan processed");
	Ok(filled)
}

/// Resolves an opaque payload against the resolver contract on its chain,
/// then processes the plan.
pub async fn resolve_and_process(
	ctx: &dyn SolverContext,
	resolver: Account,
	payload: Bytes,
) -> Result<bool> {
	let client = ctx.public_client(resolver.chain_id)?;
	let plan = solver_codec::resolve(client.as_ref(), resolver.address, payload).await?;
	process(ctx, &plan).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{Address, B256, U256};
	use async_trait::async_trait;
	use solver_types::{
		BlockInfo, CallRequest, CallStep, Erc20Payment, Formula, Payment, PublicClient,
		Selector, SimulationCall, SimulationOutcome, SolverError, Step, StepAttributes,
		TransactionReceipt, VariableRole, WalletClient, WitnessResolver,
	};
	use std::sync::Arc;

	/// A healthy single-chain backend: simulations succeed, transactions
	/// confirm.
	struct HappyChain;

	#[async_trait]
	impl PublicClient for HappyChain {
		async fn call(&self, _request: CallRequest) -> Result<Bytes> {
			Ok(Bytes::new())
		}

		async fn simulate_calls(
			&self,
			_account: Address,
			calls: Vec<SimulationCall>,
			_block_number: Option<u64>,
		) -> Result<Vec<SimulationOutcome>> {
			Ok(calls
				.iter()
				.map(|_| SimulationOutcome {
					success: true,
					gas_used: U256::from(50_000),
					return_data: Bytes::new(),
				})
				.collect())
		}

		async fn wait_for_transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
			Ok(TransactionReceipt {
				transaction_hash: hash,
				block_number: 77,
				success: true,
				gas_used: U256::from(50_000),
				effective_gas_price: U256::from(3),
			})
		}

		async fn get_block(&self, number: u64) -> Result<BlockInfo> {
			Ok(BlockInfo {
				number,
				timestamp: 1_700_000_000,
			})
		}
	}

	#[async_trait]
	impl WalletClient for HappyChain {
		async fn send_transaction(
			&self,
			_account: Address,
			_to: Address,
			_data: Bytes,
		) -> Result<B256> {
			Ok(B256::from([0x11; 32]))
		}
	}

	struct HappyContext;

	#[async_trait]
	impl SolverContext for HappyContext {
		fn public_client(&self, _chain_id: u64) -> Result<Arc<dyn PublicClient>> {
			Ok(Arc::new(HappyChain))
		}

		fn wallet_client(&self, _chain_id: u64) -> Result<Arc<dyn WalletClient>> {
			Ok(Arc::new(HappyChain))
		}

		fn payment_chain(&self) -> u64 {
			1
		}

		fn payment_recipient(&self, _chain_id: u64) -> Result<Address> {
			Ok(Address::from([0x77; 20]))
		}

		fn filler_address(&self) -> Address {
			Address::from([0x55; 20])
		}

		fn is_whitelisted(&self, _account: &solver_types::Account, _kind: &str) -> bool {
			true
		}

		fn witness_resolver(&self, _kind: &str) -> Option<Arc<dyn WitnessResolver>> {
			None
		}

		async fn token_price_usd(&self, _token: &solver_types::Account) -> Result<U256> {
			Ok(U256::from(2))
		}

		async fn gas_price_usd(&self, _chain_id: u64) -> Result<U256> {
			Ok(U256::ZERO)
		}
	}

	fn profitable_plan() -> Plan {
		Plan {
			steps: vec![Step::Call(CallStep {
				target: Account::new(Address::from([0x10; 20]), 1),
				selector: Selector::from([1, 2, 3, 4]),
				arguments: vec![],
				attributes: StepAttributes::default(),
				payments: vec![],
			})],
			variables: vec![VariableRole::TxOutput],
			assumptions: vec![],
			payments: vec![Payment::Erc20(Erc20Payment {
				token: Account::new(Address::from([0x01; 20]), 1),
				sender: Account::new(Address::from([0x02; 20]), 1),
				amount: Formula::Constant(U256::from(1_000)),
				recipient_var: 0,
				estimated_delay_seconds: 0,
			})],
		}
	}

	#[tokio::test]
	async fn test_process_fills_profitable_plan() {
		let filled = process(&HappyContext, &profitable_plan()).await.unwrap();
		assert!(filled);
	}

	#[tokio::test]
	async fn test_process_rejects_stale_deadline() {
		let mut plan = profitable_plan();
		match &mut plan.steps[0] {
			Step::Call(call) => call.attributes.required_before = Some(10),
		}

		let err = process(&HappyContext, &plan).await.unwrap_err();
		assert!(matches!(err, SolverError::DeadlineTooClose { .. }));
	}
}
