//! Formula evaluation.

use alloy_primitives::U256;
use solver_types::{Formula, Result, SolverContext};

use crate::env::VariableEnv;

/// Evaluates a formula to `uint256`. A `Variable` formula requires the
/// referenced value to be static and exactly one word wide.
pub async fn eval_formula(
	ctx: &dyn SolverContext,
	env: &mut VariableEnv,
	formula: &Formula,
) -> Result<U256> {
	match formula {
		Formula::Constant(value) => Ok(*value),
		Formula::Variable(index) => env.get(ctx, *index).await?.as_uint256(),
	}
}
