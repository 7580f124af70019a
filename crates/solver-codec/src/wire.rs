//! On-wire entity definitions.
//!
//! Entity bytes are ABI function calls; the 4-byte selector is the kind
//! tag, the arguments carry the payload. Chain-qualified addresses travel
//! as ERC-7930 `bytes`, formulas and nested attributes as recursively
//! encoded entity bytes, indices as `uint256`.

use alloy_sol_types::sol;

sol! {
	/// An account whose behavior the plan depends on.
	struct RawAssumption {
		bytes trusted;
		string kind;
	}

	/// The resolver contract's output before entity decoding.
	struct RawResolvedOrder {
		bytes[] steps;
		bytes[] variables;
		RawAssumption[] assumptions;
		bytes[] payments;
	}

	interface IIntentResolver {
		function resolve(bytes payload) external view returns (RawResolvedOrder order);
	}

	// Steps.
	function Call(bytes target, bytes4 selector, bytes[] arguments, bytes[] attributes, bytes[] payments);

	// Step attributes.
	function SpendsERC20(bytes token, bytes amountFormula, bytes spender, bytes receiver);
	function SpendsEstimatedGas(bytes amountFormula);
	function RevertPolicy(uint8 action, bytes expectedReason);
	function RequiredBefore(uint256 deadline);
	function RequiredFillerUntil(address exclusiveFiller, uint256 deadline);
	function RequiredCallResult(bytes target, bytes4 selector, bytes[] arguments, bytes result);
	function WithTimestamp(uint256 variable);
	function WithBlockNumber(uint256 variable);
	function WithEffectiveGasPrice(uint256 variable);

	// Formulas.
	function Constant(uint256 value);
	function Variable(uint256 index);

	// Payments.
	function ERC20(bytes token, bytes sender, bytes amountFormula, uint256 recipient, uint256 estimatedDelaySeconds);

	// Variable roles.
	function PaymentRecipient(uint256 chainId);
	function PaymentChain();
	function Pricing();
	function TxOutput();
	function Witness(string kind, bytes data, uint256[] variables);
	function Query(bytes target, bytes4 selector, bytes[] arguments, uint256 blockNumber);
}
