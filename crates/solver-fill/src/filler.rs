//! The per-step fill state machine.

use alloy_primitives::{Address, Bytes, U256};
use solver_env::{build_call_data, resolve_arguments, VariableEnv};
use solver_types::{
	AbiEncodedValue, CallRequest, CallStep, Plan, PublicClient, Result, RevertAction,
	RevertPolicy, SimulationCall, SolverContext, SolverError, StepAttributes,
	TransactionReceipt,
};
use tracing::{debug, info};

use crate::schedule::{scheduled_timestamp, sleep_until};
use crate::witness::resolve_step_witnesses;

/// Terminal state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
	/// Transaction confirmed; receipt variables extracted.
	Completed,
	/// Revert matched an `ignore` policy; receipt extraction skipped.
	Ignored,
	/// Revert matched a `drop` policy; the plan ends cleanly.
	Dropped,
}

/// Fills the plan step by step. Returns `true` on end-to-end completion,
/// `false` when a step's revert policy dropped the plan.
pub async fn fill(ctx: &dyn SolverContext, plan: &Plan, env: &mut VariableEnv) -> Result<bool> {
	for (index, step) in plan.steps.iter().enumerate() {
		let call = step.as_call();
		debug!(step = index, target = %call.target, "executing step");

		match run_step(ctx, plan, env, call).await? {
			StepOutcome::Completed => debug!(step = index, "step completed"),
			StepOutcome::Ignored => debug!(step = index, "step ignored"),
			StepOutcome::Dropped => {
				info!(step = index, "revert policy dropped the plan");
				return Ok(false);
			}
		}
	}
	Ok(true)
}

async fn run_step(
	ctx: &dyn SolverContext,
	plan: &Plan,
	env: &mut VariableEnv,
	call: &CallStep,
) -> Result<StepOutcome> {
	resolve_step_witnesses(ctx, plan, env, call).await?;

	if let Some(timestamp) = scheduled_timestamp(ctx, env, &call.attributes)? {
		sleep_until(timestamp).await;
	}

	check_required_call_result(ctx, env, &call.attributes).await?;

	let values = resolve_arguments(ctx, env, &call.arguments).await?;
	let data = build_call_data(call.selector, &values);
	let public = ctx.public_client(call.target.chain_id)?;
	let filler = ctx.filler_address();

	let outcomes = public
		.simulate_calls(
			filler,
			vec![SimulationCall {
				to: call.target.address,
				data: data.clone(),
			}],
			None,
		)
		.await?;
	let outcome = outcomes
		.first()
		.ok_or_else(|| SolverError::Fill("empty simulation result".to_string()))?;

	let revert_data = if !outcome.success {
		debug!(revert = %hex_prefixed(&outcome.return_data), "pre-simulation reverted");
		outcome.return_data.clone()
	} else {
		let wallet = ctx.wallet_client(call.target.chain_id)?;
		let hash = wallet
			.send_transaction(filler, call.target.address, data.clone())
			.await?;
		info!(tx_hash = %hash, target = %call.target, "submitted step transaction");

		let receipt = public.wait_for_transaction_receipt(hash).await?;
		if receipt.success {
			extract_receipt_variables(env, public.as_ref(), &call.attributes, &receipt).await?;
			return Ok(StepOutcome::Completed);
		}
		simulate_revert(
			public.as_ref(),
			filler,
			call.target.address,
			data,
			receipt.block_number,
		)
		.await?
	};

	match match_revert_policy(&call.attributes.revert_policies, &revert_data) {
		Some(RevertAction::Drop) => Ok(StepOutcome::Dropped),
		Some(RevertAction::Ignore) => Ok(StepOutcome::Ignored),
		Some(RevertAction::Retry) | None => Err(SolverError::Fill(format!(
			"unmatched revert: {}",
			hex_prefixed(&revert_data)
		))),
	}
}

/// Probes the `RequiredCallResult` target and requires an exact match.
async fn check_required_call_result(
	ctx: &dyn SolverContext,
	env: &mut VariableEnv,
	attributes: &StepAttributes,
) -> Result<()> {
	let Some(requirement) = &attributes.required_call_result else {
		return Ok(());
	};

	let values = resolve_arguments(ctx, env, &requirement.arguments).await?;
	let data = build_call_data(requirement.selector, &values);
	let client = ctx.public_client(requirement.target.chain_id)?;
	let output = client
		.call(CallRequest {
			to: requirement.target.address,
			data,
			block_number: None,
		})
		.await?;

	if output != requirement.result {
		return Err(SolverError::Fill(format!(
			"required call result mismatch on {}",
			requirement.target
		)));
	}
	Ok(())
}

/// Re-simulates a reverted transaction at its receipt block to recover the
/// revert data. A re-entrant success (or an empty revert) is an internal
/// error.
async fn simulate_revert(
	public: &dyn PublicClient,
	account: Address,
	to: Address,
	data: Bytes,
	block_number: u64,
) -> Result<Bytes> {
	let outcomes = public
		.simulate_calls(account, vec![SimulationCall { to, data }], Some(block_number))
		.await?;
	let outcome = outcomes
		.first()
		.ok_or_else(|| SolverError::Fill("empty simulation result".to_string()))?;

	if outcome.success || outcome.return_data.is_empty() {
		return Err(SolverError::Fill(
			"transaction reverted but revert data is unavailable".to_string(),
		));
	}
	Ok(outcome.return_data.clone())
}

/// Writes the receipt-derived variables declared by the step's attributes.
async fn extract_receipt_variables(
	env: &mut VariableEnv,
	public: &dyn PublicClient,
	attributes: &StepAttributes,
	receipt: &TransactionReceipt,
) -> Result<()> {
	if let Some(index) = attributes.block_number_var {
		env.set(
			index,
			AbiEncodedValue::uint256(U256::from(receipt.block_number)),
		)?;
	}
	if let Some(index) = attributes.timestamp_var {
		let block = public.get_block(receipt.block_number).await?;
		env.set(index, AbiEncodedValue::uint256(U256::from(block.timestamp)))?;
	}
	if let Some(index) = attributes.effective_gas_price_var {
		env.set(index, AbiEncodedValue::uint256(receipt.effective_gas_price))?;
	}
	Ok(())
}

/// Finds the first policy whose expected reason is a case-insensitive
/// prefix of the revert data.
fn match_revert_policy(policies: &[RevertPolicy], revert_data: &Bytes) -> Option<RevertAction> {
	let revert_hex = hex::encode(revert_data);
	policies
		.iter()
		.find(|policy| revert_hex.starts_with(&hex::encode(&policy.expected_reason)))
		.map(|policy| policy.action)
}

fn hex_prefixed(bytes: &Bytes) -> String {
	format!("0x{}", hex::encode(bytes))
}
