//! Step scheduling against wall-clock seconds.

use solver_env::VariableEnv;
use solver_types::{Result, SolverContext, StepAttributes};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

/// Computes the step's scheduled timestamp, if any: a known timestamp
/// variable sets a lower bound, and a foreign exclusivity window pushes the
/// step past its deadline.
pub fn scheduled_timestamp(
	ctx: &dyn SolverContext,
	env: &VariableEnv,
	attributes: &StepAttributes,
) -> Result<Option<u64>> {
	let mut scheduled: Option<u64> = None;

	if let Some(index) = attributes.timestamp_var {
		if let Some(value) = env.peek(index) {
			let timestamp = value.as_uint256()?;
			let timestamp = u64::try_from(timestamp).map_err(|_| {
				solver_types::SolverError::Fill(format!(
					"scheduled timestamp out of range: {timestamp}"
				))
			})?;
			scheduled = Some(timestamp);
		}
	}

	if let Some(exclusivity) = &attributes.filler_exclusivity {
		if ctx.filler_address() != exclusivity.exclusive_filler {
			scheduled = Some(match scheduled {
				Some(timestamp) => timestamp.max(exclusivity.deadline),
				None => exclusivity.deadline,
			});
		}
	}

	Ok(scheduled)
}

/// Sleeps until the wall clock passes the timestamp; no-op if it already
/// has.
pub async fn sleep_until(timestamp: u64) {
	let now = unix_now();
	if timestamp > now {
		info!(timestamp, delay = timestamp - now, "sleeping until scheduled timestamp");
		tokio::time::sleep(Duration::from_secs(timestamp - now)).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{Address, U256};
	use async_trait::async_trait;
	use solver_types::{
		AbiEncodedValue, Account, FillerExclusivity, Plan, PublicClient, VariableRole,
		WalletClient, WitnessResolver,
	};
	use std::sync::Arc;

	struct FillerOnlyContext {
		filler: Address,
	}

	#[async_trait]
	impl SolverContext for FillerOnlyContext {
		fn public_client(&self, _chain_id: u64) -> Result<Arc<dyn PublicClient>> {
			unimplemented!()
		}

		fn wallet_client(&self, _chain_id: u64) -> Result<Arc<dyn WalletClient>> {
			unimplemented!()
		}

		fn payment_chain(&self) -> u64 {
			1
		}

		fn payment_recipient(&self, _chain_id: u64) -> Result<Address> {
			unimplemented!()
		}

		fn filler_address(&self) -> Address {
			self.filler
		}

		fn is_whitelisted(&self, _account: &Account, _kind: &str) -> bool {
			true
		}

		fn witness_resolver(&self, _kind: &str) -> Option<Arc<dyn WitnessResolver>> {
			None
		}

		async fn token_price_usd(&self, _token: &Account) -> Result<U256> {
			unimplemented!()
		}

		async fn gas_price_usd(&self, _chain_id: u64) -> Result<U256> {
			unimplemented!()
		}
	}

	fn env_with_tx_output() -> VariableEnv {
		VariableEnv::new(&Plan {
			steps: vec![],
			variables: vec![VariableRole::TxOutput],
			assumptions: vec![],
			payments: vec![],
		})
	}

	#[test]
	fn test_no_attributes_means_no_schedule() {
		let ctx = FillerOnlyContext {
			filler: Address::ZERO,
		};
		let env = env_with_tx_output();
		let scheduled = scheduled_timestamp(&ctx, &env, &Default::default()).unwrap();
		assert_eq!(scheduled, None);
	}

	#[test]
	fn test_known_timestamp_variable_schedules() {
		let ctx = FillerOnlyContext {
			filler: Address::ZERO,
		};
		let mut env = env_with_tx_output();
		env.set(0, AbiEncodedValue::uint256(U256::from(12345)))
			.unwrap();

		let attributes = solver_types::StepAttributes {
			timestamp_var: Some(0),
			..Default::default()
		};
		let scheduled = scheduled_timestamp(&ctx, &env, &attributes).unwrap();
		assert_eq!(scheduled, Some(12345));
	}

	#[test]
	fn test_unknown_timestamp_variable_is_ignored() {
		let ctx = FillerOnlyContext {
			filler: Address::ZERO,
		};
		let env = env_with_tx_output();

		let attributes = solver_types::StepAttributes {
			timestamp_var: Some(0),
			..Default::default()
		};
		let scheduled = scheduled_timestamp(&ctx, &env, &attributes).unwrap();
		assert_eq!(scheduled, None);
	}

	#[test]
	fn test_foreign_exclusivity_pushes_past_deadline() {
		let ctx = FillerOnlyContext {
			filler: Address::from([0x01; 20]),
		};
		let mut env = env_with_tx_output();
		env.set(0, AbiEncodedValue::uint256(U256::from(100)))
			.unwrap();

		let attributes = solver_types::StepAttributes {
			timestamp_var: Some(0),
			filler_exclusivity: Some(FillerExclusivity {
				exclusive_filler: Address::from([0x02; 20]),
				deadline: 500,
			}),
			..Default::default()
		};
		let scheduled = scheduled_timestamp(&ctx, &env, &attributes).unwrap();
		assert_eq!(scheduled, Some(500));
	}

	#[test]
	fn test_exclusive_filler_is_not_delayed() {
		let exclusive = Address::from([0x02; 20]);
		let ctx = FillerOnlyContext { filler: exclusive };
		let env = env_with_tx_output();

		let attributes = solver_types::StepAttributes {
			filler_exclusivity: Some(FillerExclusivity {
				exclusive_filler: exclusive,
				deadline: 500,
			}),
			..Default::default()
		};
		let scheduled = scheduled_timestamp(&ctx, &env, &attributes).unwrap();
		assert_eq!(scheduled, None);
	}
}
