//! Evaluates and prices a plan's flows, gating on non-negative PnL.

use alloy_primitives::{I256, U256};
use solver_env::{build_call_data, eval_formula, resolve_arguments, VariableEnv};
use solver_types::{
	CallStep, Plan, Result, SimulationCall, SolverContext, SolverError, VariableRole,
};
use tracing::{debug, info};

use crate::flows::{collect_flows, EvaluatedFlow, Flow};

/// A successful quote: the populated environment (reused by the filler)
/// and the evaluated flows.
#[derive(Debug)]
pub struct Quote {
	pub env: VariableEnv,
	pub flows: Vec<EvaluatedFlow>,
}

/// Quotes the plan. Rejects plans with pricing variables or delayed
/// payments, evaluates every flow amount, prices them in USD through the
/// context, and fails on negative PnL.
pub async fn quote(ctx: &dyn SolverContext, plan: &Plan) -> Result<Quote> {
	let pricing: Vec<usize> = plan
		.variables
		.iter()
		.enumerate()
		.filter(|(_, role)| matches!(role, VariableRole::Pricing))
		.map(|(index, _)| index)
		.collect();
	if !pricing.is_empty() {
		return Err(SolverError::Quote(format!(
			"pricing variables are not supported: {pricing:?}"
		)));
	}

	let mut env = VariableEnv::new(plan);
	let flows = collect_flows(plan)?;

	let mut evaluated = Vec::with_capacity(flows.len());
	for flow in flows {
		let amount = match &flow {
			Flow::Token { amount, .. } => eval_formula(ctx, &mut env, amount).await?,
			Flow::Gas {
				amount: Some(formula),
				..
			} => eval_formula(ctx, &mut env, formula).await?,
			Flow::Gas {
				step_index,
				amount: None,
				..
			} => simulate_gas(ctx, &mut env, plan.steps[*step_index].as_call()).await?,
		};
		debug!(?flow, %amount, "evaluated flow");
		evaluated.push(EvaluatedFlow { flow, amount });
	}

	let pnl = price_flows(ctx, &evaluated).await?;
	if pnl < I256::ZERO {
		return Err(SolverError::NegativePnl { pnl });
	}

	info!(%pnl, flows = evaluated.len(), "quote accepted");
	Ok(Quote {
		env,
		flows: evaluated,
	})
}

/// Obtains a step's gas by simulation when no explicit formula is given.
async fn simulate_gas(
	ctx: &dyn SolverContext,
	env: &mut VariableEnv,
	step: &CallStep,
) -> Result<U256> {
	let values = resolve_arguments(ctx, env, &step.arguments).await?;
	let data = build_call_data(step.selector, &values);
	let client = ctx.public_client(step.target.chain_id)?;

	let outcomes = client
		.simulate_calls(
			ctx.filler_address(),
			vec![SimulationCall {
				to: step.target.address,
				data,
			}],
			None,
		)
		.await?;
	let outcome = outcomes
		.first()
		.ok_or_else(|| SolverError::Quote("empty simulation result".to_string()))?;
	if !outcome.success {
		return Err(SolverError::Quote(format!(
			"gas simulation reverted: 0x{}",
			hex::encode(&outcome.return_data)
		)));
	}
	Ok(outcome.gas_used)
}

async fn price_flows(ctx: &dyn SolverContext, flows: &[EvaluatedFlow]) -> Result<I256> {
	let mut pnl = I256::ZERO;
	for evaluated in flows {
		let (price, sign) = match &evaluated.flow {
			Flow::Gas { chain_id, .. } => (ctx.gas_price_usd(*chain_id).await?, -1i8),
			Flow::Token {
				token, direction, ..
			} => (ctx.token_price_usd(token).await?, direction.sign()),
		};

		let value = evaluated
			.amount
			.checked_mul(price)
			.ok_or_else(|| SolverError::Quote("flow value overflow".to_string()))?;
		let value = I256::try_from(value)
			.map_err(|_| SolverError::Quote("flow value overflow".to_string()))?;
		let signed = if sign < 0 { -value } else { value };
		pnl = pnl
			.checked_add(signed)
			.ok_or_else(|| SolverError::Quote("PnL overflow".to_string()))?;
	}
	Ok(pnl)
}
