//! Configuration-backed [`SolverContext`] implementation.
//!
//! Serves clients from a [`ClientRegistry`]-compatible provider map, the
//! whitelist and payment routing from [`SolverConfig`], and prices from the
//! config's static tables. Witness resolvers are registered at runtime.
//!
//! [`ClientRegistry`]: solver_chains::ClientRegistry
//! [`SolverConfig`]: solver_config::SolverConfig

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use solver_config::SolverConfig;
use solver_types::{
	Account, ClientSource, PublicClient, Result, SolverContext, SolverError, WalletClient,
	WitnessResolver,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct ConfiguredContext {
	clients: Arc<dyn ClientSource>,
	filler_address: Address,
	payment_chain: u64,
	payment_recipients: HashMap<u64, Address>,
	whitelist: HashSet<(Address, u64, String)>,
	token_prices: HashMap<(Address, u64), U256>,
	gas_prices: HashMap<u64, U256>,
	witness_resolvers: HashMap<String, Arc<dyn WitnessResolver>>,
}

impl ConfiguredContext {
	pub fn from_config(config: &SolverConfig, clients: Arc<dyn ClientSource>) -> Result<Self> {
		let filler_address = parse_address(&config.solver.filler_address)?;

		let mut payment_recipients = HashMap::new();
		for (chain_id, recipient) in &config.payment.recipients {
			payment_recipients.insert(*chain_id, parse_address(recipient)?);
		}

		let mut whitelist = HashSet::new();
		for entry in &config.whitelist {
			whitelist.insert((
				parse_address(&entry.address)?,
				entry.chain_id,
				entry.kind.clone(),
			));
		}

		let mut token_prices = HashMap::new();
		for token in &config.prices.tokens {
			token_prices.insert(
				(parse_address(&token.address)?, token.chain_id),
				U256::from(token.usd),
			);
		}
		let gas_prices = config
			.prices
			.gas
			.iter()
			.map(|(chain_id, usd)| (*chain_id, U256::from(*usd)))
			.collect();

		Ok(Self {
			clients,
			filler_address,
			payment_chain: config.payment.chain_id,
			payment_recipients,
			whitelist,
			token_prices,
			gas_prices,
			witness_resolvers: HashMap::new(),
		})
	}

	/// Registers a witness plugin for a kind, replacing any previous one.
	pub fn register_witness_resolver(
		&mut self,
		kind: impl Into<String>,
		resolver: Arc<dyn WitnessResolver>,
	) {
		self.witness_resolvers.insert(kind.into(), resolver);
	}
}

#[async_trait]
impl SolverContext for ConfiguredContext {
	fn public_client(&self, chain_id: u64) -> Result<Arc<dyn PublicClient>> {
		self.clients.public(chain_id)
	}

	fn wallet_client(&self, chain_id: u64) -> Result<Arc<dyn WalletClient>> {
		self.clients.wallet(chain_id)
	}

	fn payment_chain(&self) -> u64 {
		self.payment_chain
	}

	fn payment_recipient(&self, chain_id: u64) -> Result<Address> {
		self.payment_recipients.get(&chain_id).copied().ok_or_else(|| {
			SolverError::Config(format!("no payment recipient configured for chain {chain_id}"))
		})
	}

	fn filler_address(&self) -> Address {
		self.filler_address
	}

	fn is_whitelisted(&self, account: &Account, kind: &str) -> bool {
		self.whitelist
			.contains(&(account.address, account.chain_id, kind.to_string()))
	}

	fn witness_resolver(&self, kind: &str) -> Option<Arc<dyn WitnessResolver>> {
		self.witness_resolvers.get(kind).cloned()
	}

	async fn token_price_usd(&self, token: &Account) -> Result<U256> {
		self.token_prices
			.get(&(token.address, token.chain_id))
			.copied()
			.ok_or_else(|| SolverError::Quote(format!("no USD price for token {token}")))
	}

	async fn gas_price_usd(&self, chain_id: u64) -> Result<U256> {
		self.gas_prices.get(&chain_id).copied().ok_or_else(|| {
			SolverError::Quote(format!("no USD gas price for chain {chain_id}"))
		})
	}
}

fn parse_address(value: &str) -> Result<Address> {
	value
		.parse()
		.map_err(|_| SolverError::Config(format!("invalid address: {value}")))
}
