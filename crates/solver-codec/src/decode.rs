//! Entity decoders from wire bytes to the typed plan model.

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use solver_types::{
	safe_index, AbiEncodedValue, Account, Argument, Assumption, CallResultRequirement, CallStep,
	Erc20Payment, Erc20Spend, FillerExclusivity, Formula, Payment, Plan, Result, RevertAction,
	RevertPolicy, SolverError, Step, StepAttributes, VariableRole, WORD,
};

use crate::wire;

/// Decodes the resolver contract's raw output into a validated [`Plan`].
pub fn decode_plan(order: wire::RawResolvedOrder) -> Result<Plan> {
	let steps = order
		.steps
		.iter()
		.map(|bytes| decode_step(bytes))
		.collect::<Result<Vec<_>>>()?;
	let variables = order
		.variables
		.iter()
		.map(|bytes| decode_variable_role(bytes))
		.collect::<Result<Vec<_>>>()?;
	let assumptions = order
		.assumptions
		.into_iter()
		.map(decode_assumption)
		.collect::<Result<Vec<_>>>()?;
	let payments = order
		.payments
		.iter()
		.map(|bytes| decode_payment(bytes))
		.collect::<Result<Vec<_>>>()?;

	let plan = Plan {
		steps,
		variables,
		assumptions,
		payments,
	};
	plan.validate()?;
	Ok(plan)
}

/// Dispatches a call argument: a 32-byte encoding is a variable index,
/// anything else is a wrapped ABI value.
pub fn decode_argument(bytes: &[u8]) -> Result<Argument> {
	if bytes.len() == WORD {
		return Ok(Argument::Variable(safe_index(U256::from_be_slice(bytes))?));
	}
	Ok(Argument::Value(AbiEncodedValue::decode(bytes)?))
}

fn decode_step(bytes: &[u8]) -> Result<Step> {
	let (selector, rest) = split_selector(bytes)?;
	if selector != wire::CallCall::SELECTOR {
		return Err(SolverError::Codec(format!(
			"unknown step kind 0x{}",
			hex::encode(selector)
		)));
	}
	let call = wire::CallCall::abi_decode_raw(rest, true)
		.map_err(|e| SolverError::Codec(format!("malformed Call step: {e}")))?;

	Ok(Step::Call(CallStep {
		target: Account::from_erc7930(&call.target)?,
		selector: call.selector,
		arguments: decode_arguments(&call.arguments)?,
		attributes: decode_attributes(&call.attributes)?,
		payments: call
			.payments
			.iter()
			.map(|bytes| decode_payment(bytes))
			.collect::<Result<Vec<_>>>()?,
	}))
}

fn decode_arguments(list: &[alloy_primitives::Bytes]) -> Result<Vec<Argument>> {
	list.iter().map(|bytes| decode_argument(bytes)).collect()
}

fn decode_attributes(list: &[alloy_primitives::Bytes]) -> Result<StepAttributes> {
	let mut attributes = StepAttributes::default();
	for bytes in list {
		decode_attribute(&mut attributes, bytes)?;
	}
	Ok(attributes)
}

fn decode_attribute(attributes: &mut StepAttributes, bytes: &[u8]) -> Result<()> {
	let (selector, rest) = split_selector(bytes)?;
	match selector {
		s if s == wire::SpendsERC20Call::SELECTOR => {
			let spend = wire::SpendsERC20Call::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed SpendsERC20: {e}")))?;
			attributes.erc20_spends.push(Erc20Spend {
				token: Account::from_erc7930(&spend.token)?,
				amount: decode_formula(&spend.amountFormula)?,
				spender: Account::from_erc7930(&spend.spender)?,
				receiver: Account::from_erc7930(&spend.receiver)?,
			});
			Ok(())
		}
		s if s == wire::SpendsEstimatedGasCall::SELECTOR => {
			let gas = wire::SpendsEstimatedGasCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed SpendsEstimatedGas: {e}")))?;
			set_once(
				&mut attributes.estimated_gas,
				decode_formula(&gas.amountFormula)?,
				"SpendsEstimatedGas",
			)
		}
		s if s == wire::RevertPolicyCall::SELECTOR => {
			let policy = wire::RevertPolicyCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed RevertPolicy: {e}")))?;
			attributes.revert_policies.push(RevertPolicy {
				action: decode_revert_action(policy.action)?,
				expected_reason: policy.expectedReason,
			});
			Ok(())
		}
		s if s == wire::RequiredBeforeCall::SELECTOR => {
			let required = wire::RequiredBeforeCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed RequiredBefore: {e}")))?;
			set_once(
				&mut attributes.required_before,
				decode_u64(required.deadline, "RequiredBefore deadline")?,
				"RequiredBefore",
			)
		}
		s if s == wire::RequiredFillerUntilCall::SELECTOR => {
			let required = wire::RequiredFillerUntilCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed RequiredFillerUntil: {e}")))?;
			set_once(
				&mut attributes.filler_exclusivity,
				FillerExclusivity {
					exclusive_filler: required.exclusiveFiller,
					deadline: decode_u64(required.deadline, "RequiredFillerUntil deadline")?,
				},
				"RequiredFillerUntil",
			)
		}
		s if s == wire::RequiredCallResultCall::SELECTOR => {
			let required = wire::RequiredCallResultCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed RequiredCallResult: {e}")))?;
			set_once(
				&mut attributes.required_call_result,
				CallResultRequirement {
					target: Account::from_erc7930(&required.target)?,
					selector: required.selector,
					arguments: decode_arguments(&required.arguments)?,
					result: required.result,
				},
				"RequiredCallResult",
			)
		}
		s if s == wire::WithTimestampCall::SELECTOR => {
			let with = wire::WithTimestampCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed WithTimestamp: {e}")))?;
			set_once(
				&mut attributes.timestamp_var,
				safe_index(with.variable)?,
				"WithTimestamp",
			)
		}
		s if s == wire::WithBlockNumberCall::SELECTOR => {
			let with = wire::WithBlockNumberCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed WithBlockNumber: {e}")))?;
			set_once(
				&mut attributes.block_number_var,
				safe_index(with.variable)?,
				"WithBlockNumber",
			)
		}
		s if s == wire::WithEffectiveGasPriceCall::SELECTOR => {
			let with = wire::WithEffectiveGasPriceCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed WithEffectiveGasPrice: {e}")))?;
			set_once(
				&mut attributes.effective_gas_price_var,
				safe_index(with.variable)?,
				"WithEffectiveGasPrice",
			)
		}
		_ => Err(SolverError::Codec(format!(
			"unknown attribute kind 0x{}",
			hex::encode(selector)
		))),
	}
}

fn decode_revert_action(action: u8) -> Result<RevertAction> {
	match action {
		0 => Ok(RevertAction::Drop),
		1 => Ok(RevertAction::Ignore),
		2 => Ok(RevertAction::Retry),
		_ => Err(SolverError::Codec(format!(
			"unknown revert action {action}"
		))),
	}
}

fn decode_formula(bytes: &[u8]) -> Result<Formula> {
	let (selector, rest) = split_selector(bytes)?;
	match selector {
		s if s == wire::ConstantCall::SELECTOR => {
			let constant = wire::ConstantCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed Constant formula: {e}")))?;
			Ok(Formula::Constant(constant.value))
		}
		s if s == wire::VariableCall::SELECTOR => {
			let variable = wire::VariableCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed Variable formula: {e}")))?;
			Ok(Formula::Variable(safe_index(variable.index)?))
		}
		_ => Err(SolverError::Codec(format!(
			"unknown formula kind 0x{}",
			hex::encode(selector)
		))),
	}
}

fn decode_payment(bytes: &[u8]) -> Result<Payment> {
	let (selector, rest) = split_selector(bytes)?;
	if selector != wire::ERC20Call::SELECTOR {
		return Err(SolverError::Codec(format!(
			"unknown payment kind 0x{}",
			hex::encode(selector)
		)));
	}
	let payment = wire::ERC20Call::abi_decode_raw(rest, true)
		.map_err(|e| SolverError::Codec(format!("malformed ERC20 payment: {e}")))?;

	Ok(Payment::Erc20(Erc20Payment {
		token: Account::from_erc7930(&payment.token)?,
		sender: Account::from_erc7930(&payment.sender)?,
		amount: decode_formula(&payment.amountFormula)?,
		recipient_var: safe_index(payment.recipient)?,
		estimated_delay_seconds: decode_u64(payment.estimatedDelaySeconds, "payment delay")?,
	}))
}

fn decode_variable_role(bytes: &[u8]) -> Result<VariableRole> {
	let (selector, rest) = split_selector(bytes)?;
	match selector {
		s if s == wire::PaymentRecipientCall::SELECTOR => {
			let role = wire::PaymentRecipientCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed PaymentRecipient: {e}")))?;
			Ok(VariableRole::PaymentRecipient {
				chain_id: decode_u64(role.chainId, "PaymentRecipient chain id")?,
			})
		}
		s if s == wire::PaymentChainCall::SELECTOR => Ok(VariableRole::PaymentChain),
		s if s == wire::PricingCall::SELECTOR => Ok(VariableRole::Pricing),
		s if s == wire::TxOutputCall::SELECTOR => Ok(VariableRole::TxOutput),
		s if s == wire::WitnessCall::SELECTOR => {
			let witness = wire::WitnessCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed Witness: {e}")))?;
			Ok(VariableRole::Witness {
				kind: witness.kind,
				data: witness.data,
				variables: witness
					.variables
					.into_iter()
					.map(safe_index)
					.collect::<Result<Vec<_>>>()?,
			})
		}
		s if s == wire::QueryCall::SELECTOR => {
			let query = wire::QueryCall::abi_decode_raw(rest, true)
				.map_err(|e| SolverError::Codec(format!("malformed Query: {e}")))?;
			let block_number = if query.blockNumber.is_zero() {
				None
			} else {
				Some(decode_u64(query.blockNumber, "Query block number")?)
			};
			Ok(VariableRole::Query {
				target: Account::from_erc7930(&query.target)?,
				selector: query.selector,
				arguments: decode_arguments(&query.arguments)?,
				block_number,
			})
		}
		_ => Err(SolverError::Codec(format!(
			"unknown variable role 0x{}",
			hex::encode(selector)
		))),
	}
}

fn decode_assumption(raw: wire::RawAssumption) -> Result<Assumption> {
	Ok(Assumption {
		trusted: Account::from_erc7930(&raw.trusted)?,
		kind: raw.kind,
	})
}

fn split_selector(bytes: &[u8]) -> Result<([u8; 4], &[u8])> {
	if bytes.len() < 4 {
		return Err(SolverError::Codec(format!(
			"entity too short for a selector: {} bytes",
			bytes.len()
		)));
	}
	let mut selector = [0u8; 4];
	selector.copy_from_slice(&bytes[..4]);
	Ok((selector, &bytes[4..]))
}

fn set_once<T>(slot: &mut Option<T>, value: T, kind: &str) -> Result<()> {
	if slot.is_some() {
		return Err(SolverError::Codec(format!("duplicate {kind} attribute")));
	}
	*slot = Some(value);
	Ok(())
}

fn decode_u64(value: U256, what: &str) -> Result<u64> {
	u64::try_from(value).map_err(|_| SolverError::Codec(format!("{what} out of range: {value}")))
}
