//! Witness resolution for a step's variable arguments.

use solver_env::VariableEnv;
use solver_types::{
	Argument, CallStep, Plan, Result, SolverContext, SolverError, VariableRole,
};
use std::collections::HashSet;
use tracing::debug;

/// Resolves every witness variable directly referenced by the step's
/// arguments: evaluates the witness's declared sub-variables through the
/// environment, invokes the kind's registered plugin, and writes the
/// result back. Witnesses referenced only transitively through other
/// variables' dependencies are not resolved here.
pub async fn resolve_step_witnesses(
	ctx: &dyn SolverContext,
	plan: &Plan,
	env: &mut VariableEnv,
	step: &CallStep,
) -> Result<()> {
	let mut seen = HashSet::new();
	for argument in &step.arguments {
		let Argument::Variable(index) = argument else {
			continue;
		};
		let VariableRole::Witness {
			kind,
			data,
			variables,
		} = &plan.variables[*index]
		else {
			continue;
		};
		if !seen.insert(*index) {
			continue;
		}

		let resolver = ctx.witness_resolver(kind).ok_or_else(|| {
			SolverError::Fill(format!("no witness resolver registered for kind {kind:?}"))
		})?;

		let mut values = Vec::with_capacity(variables.len());
		for dep in variables {
			values.push(env.get(ctx, *dep).await?);
		}

		let value = resolver.resolve(data, values).await?;
		debug!(index = *index, kind = %kind, "witness resolved");
		env.set(*index, value)?;
	}
	Ok(())
}
