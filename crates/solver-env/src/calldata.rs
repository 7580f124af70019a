//! Composes ABI calldata from a selector and resolved argument values.

use alloy_primitives::{Bytes, U256};
use solver_types::{
	AbiEncodedValue, Argument, Result, Selector, SolverContext, WORD,
};

use crate::env::VariableEnv;

/// Resolves mixed literal/variable arguments into concrete values, reading
/// variables through the environment.
pub async fn resolve_arguments(
	ctx: &dyn SolverContext,
	env: &mut VariableEnv,
	arguments: &[Argument],
) -> Result<Vec<AbiEncodedValue>> {
	let mut values = Vec::with_capacity(arguments.len());
	for argument in arguments {
		match argument {
			Argument::Variable(index) => values.push(env.get(ctx, *index).await?),
			Argument::Value(value) => values.push(value.clone()),
		}
	}
	Ok(values)
}

/// Builds calldata in the standard head/tail layout: static encodings are
/// inlined into the head, dynamic encodings are referenced by an offset
/// from the start of the argument area and appended to the tail.
pub fn build_call_data(selector: Selector, values: &[AbiEncodedValue]) -> Bytes {
	let heads_size: usize = values
		.iter()
		.map(|value| {
			if value.is_dynamic() {
				WORD
			} else {
				value.encoding().len()
			}
		})
		.sum();

	let mut heads = Vec::with_capacity(heads_size);
	let mut tails = Vec::new();
	for value in values {
		if value.is_dynamic() {
			let offset = heads_size + tails.len();
			heads.extend_from_slice(&U256::from(offset).to_be_bytes::<WORD>());
			tails.extend_from_slice(value.encoding());
		} else {
			heads.extend_from_slice(value.encoding());
		}
	}

	let mut out = Vec::with_capacity(4 + heads.len() + tails.len());
	out.extend_from_slice(selector.as_slice());
	out.extend_from_slice(&heads);
	out.extend_from_slice(&tails);
	Bytes::from(out)
}
