//! Preflight validation of a resolved plan.

use solver_types::{Plan, Result, RevertAction, SolverContext, SolverError, VariableRole};

/// Worst-case wall-clock duration of a fill, in seconds. Every step
/// deadline must leave at least this much slack at preflight time.
pub const MAX_FILL_TIME_SECONDS: u64 = 600;

/// Runs every preflight check. Fatal on the first violation.
pub fn preflight(ctx: &dyn SolverContext, plan: &Plan, now: u64) -> Result<()> {
	check_revert_policy_order(plan)?;
	check_deadline_slack(plan, now)?;
	check_assumptions(ctx, plan)?;
	check_witnesses(ctx, plan)?;
	Ok(())
}

/// A step that may drop the plan must not come after a step that spends:
/// once tokens have moved, dropping cleanly is no longer possible.
fn check_revert_policy_order(plan: &Plan) -> Result<()> {
	let last_drop = plan.steps.iter().rposition(|step| {
		step.as_call()
			.attributes
			.revert_policies
			.iter()
			.any(|policy| policy.action == RevertAction::Drop)
	});
	let first_spend = plan
		.steps
		.iter()
		.position(|step| !step.as_call().attributes.erc20_spends.is_empty());

	if let (Some(last_drop), Some(first_spend)) = (last_drop, first_spend) {
		if last_drop > first_spend {
			return Err(SolverError::Preflight(format!(
				"step {last_drop} may drop after step {first_spend} spends"
			)));
		}
	}
	Ok(())
}

fn check_deadline_slack(plan: &Plan, now: u64) -> Result<()> {
	let earliest = plan
		.steps
		.iter()
		.filter_map(|step| step.as_call().attributes.required_before)
		.min();

	if let Some(earliest) = earliest {
		if now + MAX_FILL_TIME_SECONDS >= earliest {
			return Err(SolverError::DeadlineTooClose { earliest, now });
		}
	}
	Ok(())
}

fn check_assumptions(ctx: &dyn SolverContext, plan: &Plan) -> Result<()> {
	for assumption in &plan.assumptions {
		if !ctx.is_whitelisted(&assumption.trusted, &assumption.kind) {
			return Err(SolverError::Preflight(format!(
				"assumption not whitelisted: {} ({})",
				assumption.trusted, assumption.kind
			)));
		}
	}
	Ok(())
}

fn check_witnesses(ctx: &dyn SolverContext, plan: &Plan) -> Result<()> {
	for (index, role) in plan.variables.iter().enumerate() {
		if let VariableRole::Witness { kind, .. } = role {
			if ctx.witness_resolver(kind).is_none() {
				return Err(SolverError::Preflight(format!(
					"variable {index} needs unsupported witness kind {kind:?}"
				)));
			}
		}
	}
	Ok(())
}
