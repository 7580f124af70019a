//! Configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::serde_helpers::{deserialize_chain_map, serialize_chain_map};

/// Top-level solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
	pub solver: SolverSettings,
	#[serde(
		default,
		deserialize_with = "deserialize_chain_map",
		serialize_with = "serialize_chain_map"
	)]
	pub chains: HashMap<u64, ChainConfig>,
	pub payment: PaymentConfig,
	#[serde(default)]
	pub whitelist: Vec<WhitelistEntry>,
	#[serde(default)]
	pub prices: PriceConfig,
}

/// Identity and limits of this solver instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
	/// Address sending fill transactions.
	pub filler_address: String,
	/// Hex private key for the filler; usually injected via environment.
	#[serde(default)]
	pub private_key: String,
	/// Preflight slack required before the tightest step deadline.
	#[serde(default = "default_max_fill_time")]
	pub max_fill_time_seconds: u64,
}

fn default_max_fill_time() -> u64 {
	600
}

/// Per-chain connectivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
	pub rpc_url: String,
}

/// Where the solver wants to be paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
	pub chain_id: u64,
	/// Payment recipient address per chain.
	#[serde(
		default,
		deserialize_with = "deserialize_chain_map",
		serialize_with = "serialize_chain_map"
	)]
	pub recipients: HashMap<u64, String>,
}

/// A trusted account for one assumption kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistEntry {
	pub address: String,
	pub chain_id: u64,
	pub kind: String,
}

/// Static USD price tables. Real price oracles replace these by
/// implementing the context directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceConfig {
	#[serde(default)]
	pub tokens: Vec<TokenPrice>,
	/// USD price per gas unit, per chain.
	#[serde(
		default,
		deserialize_with = "deserialize_chain_map",
		serialize_with = "serialize_chain_map"
	)]
	pub gas: HashMap<u64, u64>,
}

/// USD price per smallest unit of one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPrice {
	pub address: String,
	pub chain_id: u64,
	pub usd: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_full_config() {
		let toml = r#"
			[solver]
			filler_address = "0x5555555555555555555555555555555555555555"
			max_fill_time_seconds = 300

			[chains.1]
			rpc_url = "https://eth.example.com"

			[chains.42161]
			rpc_url = "https://arb.example.com"

			[payment]
			chain_id = 1

			[payment.recipients]
			1 = "0x7777777777777777777777777777777777777777"

			[[whitelist]]
			address = "0x4444444444444444444444444444444444444444"
			chain_id = 1
			kind = "settler"

			[[prices.tokens]]
			address = "0x1111111111111111111111111111111111111111"
			chain_id = 1
			usd = 2

			[prices.gas]
			1 = 30
		"#;

		let config: SolverConfig = toml::from_str(toml).unwrap();
		assert_eq!(config.solver.max_fill_time_seconds, 300);
		assert_eq!(config.chains.len(), 2);
		assert_eq!(config.payment.chain_id, 1);
		assert_eq!(config.whitelist.len(), 1);
		assert_eq!(config.prices.tokens[0].usd, 2);
		assert_eq!(config.prices.gas.get(&1), Some(&30));
	}

	#[test]
	fn test_defaults() {
		let toml = r#"
			[solver]
			filler_address = "0x5555555555555555555555555555555555555555"

			[payment]
			chain_id = 8453
		"#;

		let config: SolverConfig = toml::from_str(toml).unwrap();
		assert_eq!(config.solver.max_fill_time_seconds, 600);
		assert!(config.chains.is_empty());
		assert!(config.whitelist.is_empty());
		assert!(config.prices.tokens.is_empty());
	}
}
