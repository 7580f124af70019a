//! Drives the resolver contract's `resolve(bytes)` view function and
//! decodes the response into a [`Plan`].

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use solver_types::{CallRequest, Plan, PublicClient, Result, SolverError};
use tracing::{debug, info};

use crate::decode::decode_plan;
use crate::wire;

/// Resolves an opaque order payload into a typed plan.
pub async fn resolve(
	client: &dyn PublicClient,
	resolver: Address,
	payload: Bytes,
) -> Result<Plan> {
	debug!(%resolver, payload_len = payload.len(), "resolving order payload");

	let data = wire::IIntentResolver::resolveCall { payload }.abi_encode();
	let output = client
		.call(CallRequest {
			to: resolver,
			data: Bytes::from(data),
			block_number: None,
		})
		.await?;

	let ret = wire::IIntentResolver::resolveCall::abi_decode_returns(&output, true)
		.map_err(|e| SolverError::Codec(format!("malformed resolver response: {e}")))?;

	let plan = decode_plan(ret.order)?;
	info!(
		steps = plan.steps.len(),
		variables = plan.variables.len(),
		assumptions = plan.assumptions.len(),
		"resolved plan"
	);
	Ok(plan)
}
