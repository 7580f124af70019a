//! The typed execution plan produced by the resolution codec.
//!
//! A [`Plan`] is an ordered list of steps, a variable table, trust
//! assumptions and plan-level payments. Steps, arguments, formulas,
//! payments and variable roles are all sum types; the codec enforces the
//! wire discrimination rules, this module holds the decoded shapes and the
//! cross-reference validation over variable indices.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::errors::{Result, SolverError};
use crate::value::AbiEncodedValue;

/// A 4-byte function selector.
pub type Selector = FixedBytes<4>;

/// A call argument: either a reference into the plan's variable table or a
/// literal ABI-encoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
	Variable(usize),
	Value(AbiEncodedValue),
}

/// The trivial amount expression language. Formulas evaluate to `uint256`;
/// a `Variable` formula requires the referenced value to be static and
/// one word wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formula {
	Constant(U256),
	Variable(usize),
}

/// A planned ERC-20 outflow attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Spend {
	pub token: Account,
	pub amount: Formula,
	pub spender: Account,
	pub receiver: Account,
}

/// Outcome selected when a revert matches a policy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertAction {
	/// Terminate the fill cleanly; no plan-level failure.
	Drop,
	/// Skip the step and continue.
	Ignore,
	/// Reserved; rejected at fill time.
	Retry,
}

/// Maps a revert-data prefix to a control outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertPolicy {
	pub action: RevertAction,
	pub expected_reason: Bytes,
}

/// Restricts who may fill the step before a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerExclusivity {
	pub exclusive_filler: Address,
	pub deadline: u64,
}

/// A read-only probe whose result must match before the step executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResultRequirement {
	pub target: Account,
	pub selector: Selector,
	pub arguments: Vec<Argument>,
	pub result: Bytes,
}

/// Sparse per-step attributes. Singleton attributes appear at most once;
/// the codec errors on duplicates. List attributes accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAttributes {
	pub erc20_spends: Vec<Erc20Spend>,
	pub estimated_gas: Option<Formula>,
	pub revert_policies: Vec<RevertPolicy>,
	pub required_before: Option<u64>,
	pub filler_exclusivity: Option<FillerExclusivity>,
	pub required_call_result: Option<CallResultRequirement>,
	/// Variable receiving the block timestamp of the step's receipt.
	pub timestamp_var: Option<usize>,
	/// Variable receiving the block number of the step's receipt.
	pub block_number_var: Option<usize>,
	/// Variable receiving the effective gas price of the step's receipt.
	pub effective_gas_price_var: Option<usize>,
}

/// A single chain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStep {
	pub target: Account,
	pub selector: Selector,
	pub arguments: Vec<Argument>,
	pub attributes: StepAttributes,
	pub payments: Vec<Payment>,
}

/// A plan step. Currently the only variant is a direct chain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
	Call(CallStep),
}

impl Step {
	pub fn as_call(&self) -> &CallStep {
		match self {
			Step::Call(call) => call,
		}
	}
}

/// An expected ERC-20 payment to the filler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Payment {
	pub token: Account,
	pub sender: Account,
	pub amount: Formula,
	/// Variable holding the recipient address.
	pub recipient_var: usize,
	pub estimated_delay_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payment {
	Erc20(Erc20Payment),
}

/// How a variable's value is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableRole {
	/// The context's payment recipient for the given chain.
	PaymentRecipient { chain_id: u64 },
	/// The context's payment chain id.
	PaymentChain,
	/// Free variable for pricing search; rejected at quote time.
	Pricing,
	/// Set by the filler from a transaction receipt.
	TxOutput,
	/// Resolved at fill time by a kind-specific plugin.
	Witness {
		kind: String,
		data: Bytes,
		variables: Vec<usize>,
	},
	/// Computed by `eth_call` against the target.
	Query {
		target: Account,
		selector: Selector,
		arguments: Vec<Argument>,
		block_number: Option<u64>,
	},
}

/// An account whose honest behavior the plan depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
	pub trusted: Account,
	pub kind: String,
}

/// The resolved order: immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
	pub steps: Vec<Step>,
	pub variables: Vec<VariableRole>,
	pub assumptions: Vec<Assumption>,
	pub payments: Vec<Payment>,
}

impl Plan {
	/// Checks that every variable index referenced anywhere in the plan is
	/// in bounds, so downstream components may index without re-checking.
	pub fn validate(&self) -> Result<()> {
		for (index, step) in self.steps.iter().enumerate() {
			let call = step.as_call();
			self.check_arguments(&call.arguments, &format!("step {index} arguments"))?;
			self.check_attributes(&call.attributes, index)?;
			for payment in &call.payments {
				self.check_payment(payment, &format!("step {index} payment"))?;
			}
		}
		for payment in &self.payments {
			self.check_payment(payment, "plan payment")?;
		}
		for (index, role) in self.variables.iter().enumerate() {
			match role {
				VariableRole::Witness { variables, .. } => {
					for dep in variables {
						self.check_index(*dep, &format!("witness variable {index}"))?;
					}
				}
				VariableRole::Query { arguments, .. } => {
					self.check_arguments(arguments, &format!("query variable {index}"))?;
				}
				_ => {}
			}
		}
		Ok(())
	}

	fn check_attributes(&self, attributes: &StepAttributes, step: usize) -> Result<()> {
		for spend in &attributes.erc20_spends {
			self.check_formula(&spend.amount, &format!("step {step} spend"))?;
		}
		if let Some(formula) = &attributes.estimated_gas {
			self.check_formula(formula, &format!("step {step} estimated gas"))?;
		}
		if let Some(requirement) = &attributes.required_call_result {
			self.check_arguments(&requirement.arguments, &format!("step {step} call result"))?;
		}
		for var in [
			attributes.timestamp_var,
			attributes.block_number_var,
			attributes.effective_gas_price_var,
		]
		.into_iter()
		.flatten()
		{
			self.check_index(var, &format!("step {step} receipt output"))?;
		}
		Ok(())
	}

	fn check_payment(&self, payment: &Payment, what: &str) -> Result<()> {
		let Payment::Erc20(payment) = payment;
		self.check_formula(&payment.amount, what)?;
		self.check_index(payment.recipient_var, what)
	}

	fn check_arguments(&self, arguments: &[Argument], what: &str) -> Result<()> {
		for argument in arguments {
			if let Argument::Variable(index) = argument {
				self.check_index(*index, what)?;
			}
		}
		Ok(())
	}

	fn check_formula(&self, formula: &Formula, what: &str) -> Result<()> {
		if let Formula::Variable(index) = formula {
			self.check_index(*index, what)?;
		}
		Ok(())
	}

	fn check_index(&self, index: usize, what: &str) -> Result<()> {
		if index >= self.variables.len() {
			return Err(SolverError::Codec(format!(
				"variable index {index} out of bounds in {what} ({} variables)",
				self.variables.len()
			)));
		}
		Ok(())
	}
}
