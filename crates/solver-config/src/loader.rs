//! Configuration loading from files and environment.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::SolverConfig;

/// Configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
	/// Loads configuration from a TOML or JSON file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SolverConfig> {
		let path = path.as_ref();
		info!("Loading configuration from {:?}", path);

		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {path:?}"))?;

		let config = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents)?,
			Some("json") => Self::from_json(&contents)?,
			_ => anyhow::bail!("Unsupported config format: {path:?}"),
		};

		Self::validate(&config)?;
		Ok(config)
	}

	pub fn from_toml(contents: &str) -> Result<SolverConfig> {
		toml::from_str(contents).context("Failed to parse TOML")
	}

	pub fn from_json(contents: &str) -> Result<SolverConfig> {
		serde_json::from_str(contents).context("Failed to parse JSON")
	}

	/// Loads from a file and applies environment overrides.
	pub fn from_env_and_file<P: AsRef<Path>>(path: P) -> Result<SolverConfig> {
		let mut config = Self::from_file(path)?;
		Self::apply_env_overrides(&mut config);
		Self::validate(&config)?;
		Ok(config)
	}

	/// Applies `SOLVER_PRIVATE_KEY` and `RPC_URL_<chain>` overrides.
	fn apply_env_overrides(config: &mut SolverConfig) {
		if let Ok(key) = std::env::var("SOLVER_PRIVATE_KEY") {
			debug!("Overriding private key from environment");
			config.solver.private_key = key;
		}

		for (name, url) in std::env::vars() {
			if let Some(chain_id) = name.strip_prefix("RPC_URL_") {
				if let Ok(id) = chain_id.parse::<u64>() {
					if let Some(chain) = config.chains.get_mut(&id) {
						debug!("Overriding RPC URL for chain {} from environment", id);
						chain.rpc_url = url;
					}
				}
			}
		}
	}

	fn validate(config: &SolverConfig) -> Result<()> {
		if !is_address(&config.solver.filler_address) {
			anyhow::bail!(
				"filler_address must be a 0x-prefixed 20-byte hex address: {}",
				config.solver.filler_address
			);
		}
		for (chain_id, chain) in &config.chains {
			if !chain.rpc_url.starts_with("http://") && !chain.rpc_url.starts_with("https://") {
				anyhow::bail!("RPC URL for chain {chain_id} must be http(s)");
			}
		}
		for (chain_id, recipient) in &config.payment.recipients {
			if !is_address(recipient) {
				anyhow::bail!("payment recipient for chain {chain_id} is not an address");
			}
		}
		for entry in &config.whitelist {
			if !is_address(&entry.address) {
				anyhow::bail!("whitelist entry {} is not an address", entry.address);
			}
		}
		for token in &config.prices.tokens {
			if !is_address(&token.address) {
				anyhow::bail!("priced token {} is not an address", token.address);
			}
		}
		Ok(())
	}
}

fn is_address(value: &str) -> bool {
	value.len() == 42
		&& value.starts_with("0x")
		&& value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
		[solver]
		filler_address = "0x5555555555555555555555555555555555555555"

		[chains.1]
		rpc_url = "https://eth.example.com"

		[payment]
		chain_id = 1
	"#;

	#[test]
	fn test_minimal_toml_loads() {
		let config = ConfigLoader::from_toml(MINIMAL).unwrap();
		assert_eq!(config.payment.chain_id, 1);
	}

	#[test]
	fn test_validation_rejects_bad_filler_address() {
		let config = ConfigLoader::from_toml(
			r#"
			[solver]
			filler_address = "not-an-address"

			[payment]
			chain_id = 1
		"#,
		)
		.unwrap();
		assert!(ConfigLoader::validate(&config).is_err());
	}

	#[test]
	fn test_validation_rejects_bad_rpc_url() {
		let config = ConfigLoader::from_toml(
			r#"
			[solver]
			filler_address = "0x5555555555555555555555555555555555555555"

			[chains.1]
			rpc_url = "ws://eth.example.com"

			[payment]
			chain_id = 1
		"#,
		)
		.unwrap();
		assert!(ConfigLoader::validate(&config).is_err());
	}
}
