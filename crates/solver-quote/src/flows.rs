//! Signed, chain-qualified asset flows collected from a plan.

use alloy_primitives::U256;
use solver_types::{Account, Formula, Payment, Plan, Result, SolverError};

/// Which way value moves from the filler's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
	Inflow,
	Outflow,
}

impl FlowDirection {
	pub fn sign(&self) -> i8 {
		match self {
			FlowDirection::Inflow => 1,
			FlowDirection::Outflow => -1,
		}
	}
}

/// One asset flow. Gas flows are always outflows; their amount is either an
/// explicit formula or obtained by simulating the owning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
	Gas {
		chain_id: u64,
		step_index: usize,
		amount: Option<Formula>,
	},
	Token {
		token: Account,
		amount: Formula,
		direction: FlowDirection,
	},
}

/// A flow with its amount evaluated.
#[derive(Debug, Clone)]
pub struct EvaluatedFlow {
	pub flow: Flow,
	pub amount: U256,
}

/// Collects every flow in plan order: one gas flow per step, one token
/// outflow per spend attribute, one token inflow per step-level and
/// plan-level payment. Rejects delayed payments.
pub fn collect_flows(plan: &Plan) -> Result<Vec<Flow>> {
	let mut flows = Vec::new();
	for (step_index, step) in plan.steps.iter().enumerate() {
		let call = step.as_call();
		flows.push(Flow::Gas {
			chain_id: call.target.chain_id,
			step_index,
			amount: call.attributes.estimated_gas.clone(),
		});
		for spend in &call.attributes.erc20_spends {
			flows.push(Flow::Token {
				token: spend.token,
				amount: spend.amount.clone(),
				direction: FlowDirection::Outflow,
			});
		}
		for payment in &call.payments {
			flows.push(payment_flow(payment)?);
		}
	}
	for payment in &plan.payments {
		flows.push(payment_flow(payment)?);
	}
	Ok(flows)
}

fn payment_flow(payment: &Payment) -> Result<Flow> {
	let Payment::Erc20(payment) = payment;
	if payment.estimated_delay_seconds != 0 {
		return Err(SolverError::Quote(format!(
			"delayed payments are not supported ({}s)",
			payment.estimated_delay_seconds
		)));
	}
	Ok(Flow::Token {
		token: payment.token,
		amount: payment.amount.clone(),
		direction: FlowDirection::Inflow,
	})
}
