//! Lazily computed, tick-validated variable store.

use alloy_primitives::U256;
use futures::future::{BoxFuture, FutureExt};
use solver_types::{
	AbiEncodedValue, Argument, CallRequest, Plan, Result, SolverContext, SolverError, VariableRole,
};
use tracing::debug;

use crate::calldata::{build_call_data, resolve_arguments};

#[derive(Debug, Default, Clone)]
struct Slot {
	value: Option<AbiEncodedValue>,
	tick: u64,
	computing: bool,
}

/// Per-plan cache of variable values.
///
/// Each slot records the tick at which it was last written. A slot is fresh
/// iff it holds a value and, recursively, every dependency slot is fresh
/// with a tick no greater than its own; a `set` therefore invalidates every
/// transitive dependent, because dependents were written at strictly lower
/// ticks.
#[derive(Debug)]
pub struct VariableEnv {
	roles: Vec<VariableRole>,
	slots: Vec<Slot>,
	counter: u64,
}

impl VariableEnv {
	pub fn new(plan: &Plan) -> Self {
		Self {
			roles: plan.variables.clone(),
			slots: vec![Slot::default(); plan.variables.len()],
			counter: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Returns the cached value if the slot is fresh, without computing.
	pub fn peek(&self, index: usize) -> Option<&AbiEncodedValue> {
		if index < self.slots.len() && self.is_fresh(index) {
			self.slots[index].value.as_ref()
		} else {
			None
		}
	}

	/// Writes a value into a set-driven slot. Only `Pricing`, `TxOutput`
	/// and `Witness` roles may be set; anything else is a contract
	/// violation by the caller.
	pub fn set(&mut self, index: usize, value: AbiEncodedValue) -> Result<()> {
		let role = self
			.roles
			.get(index)
			.ok_or_else(|| out_of_bounds(index, self.roles.len()))?;
		if !matches!(
			role,
			VariableRole::Pricing | VariableRole::TxOutput | VariableRole::Witness { .. }
		) {
			return Err(SolverError::Variable(format!(
				"variable {index} has role {} and cannot be set",
				role_name(role)
			)));
		}

		let tick = self.bump();
		let slot = &mut self.slots[index];
		slot.value = Some(value);
		slot.tick = tick;
		debug!(index, tick, "variable set");
		Ok(())
	}

	/// Returns the variable's value, computing it (and any stale
	/// dependencies) if the cached value is missing or stale.
	pub fn get<'a>(
		&'a mut self,
		ctx: &'a dyn SolverContext,
		index: usize,
	) -> BoxFuture<'a, Result<AbiEncodedValue>> {
		async move {
			if index >= self.slots.len() {
				return Err(out_of_bounds(index, self.slots.len()));
			}
			if self.is_fresh(index) {
				if let Some(value) = &self.slots[index].value {
					return Ok(value.clone());
				}
			}
			if self.slots[index].computing {
				return Err(SolverError::Variable(format!(
					"dependency cycle through variable {index}"
				)));
			}

			self.slots[index].computing = true;
			let computed = self.compute(ctx, index).await;
			self.slots[index].computing = false;

			let value = computed?;
			let tick = self.bump();
			let slot = &mut self.slots[index];
			slot.value = Some(value.clone());
			slot.tick = tick;
			debug!(index, tick, "variable computed");
			Ok(value)
		}
		.boxed()
	}

	async fn compute(
		&mut self,
		ctx: &dyn SolverContext,
		index: usize,
	) -> Result<AbiEncodedValue> {
		let role = self.roles[index].clone();
		match role {
			VariableRole::PaymentChain => {
				Ok(AbiEncodedValue::uint256(U256::from(ctx.payment_chain())))
			}
			VariableRole::PaymentRecipient { chain_id } => {
				Ok(AbiEncodedValue::address(ctx.payment_recipient(chain_id)?))
			}
			VariableRole::Query {
				target,
				selector,
				arguments,
				block_number,
			} => {
				let values = resolve_arguments(ctx, self, &arguments).await?;
				let data = build_call_data(selector, &values);
				let client = ctx.public_client(target.chain_id)?;
				let output = client
					.call(CallRequest {
						to: target.address,
						data,
						block_number,
					})
					.await?;
				Ok(AbiEncodedValue::Static(output))
			}
			VariableRole::Pricing | VariableRole::TxOutput | VariableRole::Witness { .. } => {
				Err(SolverError::Variable(format!("variable {index} not set")))
			}
		}
	}

	/// Direct variable dependencies: only queries depend on other
	/// variables, through their argument list.
	fn dependencies(&self, index: usize) -> Vec<usize> {
		match &self.roles[index] {
			VariableRole::Query { arguments, .. } => arguments
				.iter()
				.filter_map(|argument| match argument {
					Argument::Variable(dep) => Some(*dep),
					Argument::Value(_) => None,
				})
				.collect(),
			_ => Vec::new(),
		}
	}

	fn is_fresh(&self, index: usize) -> bool {
		let slot = &self.slots[index];
		if slot.value.is_none() {
			return false;
		}
		self.dependencies(index)
			.into_iter()
			.all(|dep| self.is_fresh(dep) && self.slots[dep].tick <= slot.tick)
	}

	fn bump(&mut self) -> u64 {
		let tick = self.counter;
		self.counter += 1;
		tick
	}
}

fn out_of_bounds(index: usize, len: usize) -> SolverError {
	SolverError::Variable(format!(
		"variable index {index} out of bounds ({len} variables)"
	))
}

fn role_name(role: &VariableRole) -> &'static str {
	match role {
		VariableRole::PaymentRecipient { .. } => "PaymentRecipient",
		VariableRole::PaymentChain => "PaymentChain",
		VariableRole::Pricing => "Pricing",
		VariableRole::TxOutput => "TxOutput",
		VariableRole::Witness { .. } => "Witness",
		VariableRole::Query { .. } => "Query",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{Address, Bytes, B256};
	use async_trait::async_trait;
	use solver_types::{
		Account, BlockInfo, PublicClient, Selector, SimulationCall, SimulationOutcome,
		TransactionReceipt, WalletClient, WitnessResolver,
	};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::{Arc, Mutex};

	struct CountingClient {
		calls: AtomicUsize,
		last_data: Mutex<Option<Bytes>>,
		response: Bytes,
	}

	impl CountingClient {
		fn new(response: Bytes) -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				last_data: Mutex::new(None),
				response,
			})
		}

		fn call_count(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl PublicClient for CountingClient {
		async fn call(&self, request: CallRequest) -> Result<Bytes> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last_data.lock().unwrap() = Some(request.data);
			Ok(self.response.clone())
		}

		async fn simulate_calls(
			&self,
			_account: Address,
			_calls: Vec<SimulationCall>,
			_block_number: Option<u64>,
		) -> Result<Vec<SimulationOutcome>> {
			unimplemented!("not used by the env")
		}

		async fn wait_for_transaction_receipt(&self, _hash: B256) -> Result<TransactionReceipt> {
			unimplemented!("not used by the env")
		}

		async fn get_block(&self, _number: u64) -> Result<BlockInfo> {
			unimplemented!("not used by the env")
		}
	}

	struct TestContext {
		client: Arc<CountingClient>,
	}

	#[async_trait]
	impl SolverContext for TestContext {
		fn public_client(&self, _chain_id: u64) -> Result<Arc<dyn PublicClient>> {
			Ok(self.client.clone())
		}

		fn wallet_client(&self, _chain_id: u64) -> Result<Arc<dyn WalletClient>> {
			unimplemented!("not used by the env")
		}

		fn payment_chain(&self) -> u64 {
			8453
		}

		fn payment_recipient(&self, _chain_id: u64) -> Result<Address> {
			Ok(Address::from([0x77; 20]))
		}

		fn filler_address(&self) -> Address {
			Address::from([0x55; 20])
		}

		fn is_whitelisted(&self, _account: &Account, _kind: &str) -> bool {
			true
		}

		fn witness_resolver(&self, _kind: &str) -> Option<Arc<dyn WitnessResolver>> {
			None
		}

		async fn token_price_usd(&self, _token: &Account) -> Result<U256> {
			unimplemented!("not used by the env")
		}

		async fn gas_price_usd(&self, _chain_id: u64) -> Result<U256> {
			unimplemented!("not used by the env")
		}
	}

	fn plan_with(variables: Vec<VariableRole>) -> Plan {
		Plan {
			steps: vec![],
			variables,
			assumptions: vec![],
			payments: vec![],
		}
	}

	fn query_role(arguments: Vec<Argument>) -> VariableRole {
		VariableRole::Query {
			target: Account::new(Address::from([0x10; 20]), 1),
			selector: Selector::from([0xab, 0xcd, 0xef, 0x01]),
			arguments,
			block_number: None,
		}
	}

	fn word_response() -> Bytes {
		Bytes::from(U256::from(99).to_be_bytes::<32>().to_vec())
	}

	#[tokio::test]
	async fn test_payment_chain_compute() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext { client };
		let mut env = VariableEnv::new(&plan_with(vec![VariableRole::PaymentChain]));

		let value = env.get(&ctx, 0).await.unwrap();
		assert_eq!(value, AbiEncodedValue::uint256(U256::from(8453)));
	}

	#[tokio::test]
	async fn test_payment_recipient_compute() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext { client };
		let mut env = VariableEnv::new(&plan_with(vec![VariableRole::PaymentRecipient {
			chain_id: 1,
		}]));

		let value = env.get(&ctx, 0).await.unwrap();
		assert_eq!(value, AbiEncodedValue::address(Address::from([0x77; 20])));
	}

	#[tokio::test]
	async fn test_get_computes_once() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext {
			client: client.clone(),
		};
		let mut env = VariableEnv::new(&plan_with(vec![query_role(vec![])]));

		let first = env.get(&ctx, 0).await.unwrap();
		let second = env.get(&ctx, 0).await.unwrap();
		assert_eq!(first, second);
		assert_eq!(client.call_count(), 1);
	}

	#[tokio::test]
	async fn test_set_invalidates_dependents() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext {
			client: client.clone(),
		};
		// Variable 1 queries the chain with variable 0 as an argument.
		let mut env = VariableEnv::new(&plan_with(vec![
			VariableRole::TxOutput,
			query_role(vec![Argument::Variable(0)]),
		]));

		env.set(0, AbiEncodedValue::uint256(U256::from(1))).unwrap();
		env.get(&ctx, 1).await.unwrap();
		assert_eq!(client.call_count(), 1);

		// Still fresh: no recompute.
		env.get(&ctx, 1).await.unwrap();
		assert_eq!(client.call_count(), 1);

		// A set on the dependency stales the dependent.
		env.set(0, AbiEncodedValue::uint256(U256::from(2))).unwrap();
		env.get(&ctx, 1).await.unwrap();
		assert_eq!(client.call_count(), 2);
	}

	#[tokio::test]
	async fn test_query_reads_arguments_through_env() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext {
			client: client.clone(),
		};
		let mut env = VariableEnv::new(&plan_with(vec![
			VariableRole::PaymentChain,
			query_role(vec![Argument::Variable(0)]),
		]));

		env.get(&ctx, 1).await.unwrap();

		let data = client.last_data.lock().unwrap().clone().unwrap();
		assert_eq!(&data[..4], &[0xab, 0xcd, 0xef, 0x01]);
		assert_eq!(&data[4..36], U256::from(8453).to_be_bytes::<32>().as_slice());
	}

	#[tokio::test]
	async fn test_set_rejects_computed_roles() {
		let client = CountingClient::new(word_response());
		let _ctx = TestContext { client };
		let mut env = VariableEnv::new(&plan_with(vec![VariableRole::PaymentChain]));

		let err = env
			.set(0, AbiEncodedValue::uint256(U256::ZERO))
			.unwrap_err();
		assert!(err.to_string().contains("cannot be set"));
	}

	#[tokio::test]
	async fn test_unset_witness_errors() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext { client };
		let mut env = VariableEnv::new(&plan_with(vec![VariableRole::Witness {
			kind: "proof".to_string(),
			data: Bytes::new(),
			variables: vec![],
		}]));

		let err = env.get(&ctx, 0).await.unwrap_err();
		assert!(err.to_string().contains("not set"));
	}

	#[tokio::test]
	async fn test_dependency_cycle_is_fatal() {
		let client = CountingClient::new(word_response());
		let ctx = TestContext { client };
		let mut env = VariableEnv::new(&plan_with(vec![
			query_role(vec![Argument::Variable(1)]),
			query_role(vec![Argument::Variable(0)]),
		]));

		let err = env.get(&ctx, 0).await.unwrap_err();
		assert!(err.to_string().contains("cycle"));
	}
}
