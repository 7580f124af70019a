//! Chain-qualified addresses in ERC-7930 interoperable form.
//!
//! An [`Account`] pairs an EVM address with the chain it lives on. The
//! canonical wire form is the ERC-7930 binary layout
//! `version(2) || chainType(2) || len(1) || chainRef || len(1) || address`;
//! this codec accepts only version `0x0001` and chain type `0x0000` (EVM),
//! with a big-endian unsigned chain reference and a 20-byte address.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Result, SolverError};

/// The only ERC-7930 version this codec understands.
pub const ERC7930_VERSION: u16 = 0x0001;

/// The only ERC-7930 chain type this codec understands (EVM chains).
pub const ERC7930_CHAIN_TYPE: u16 = 0x0000;

/// A chain-qualified address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
	pub address: Address,
	pub chain_id: u64,
}

impl Account {
	pub fn new(address: Address, chain_id: u64) -> Self {
		Self { address, chain_id }
	}

	/// Decodes the ERC-7930 binary form.
	pub fn from_erc7930(bytes: &[u8]) -> Result<Self> {
		if bytes.len() < 6 {
			return Err(SolverError::Codec(format!(
				"ERC-7930 address too short: {} bytes",
				bytes.len()
			)));
		}

		let version = u16::from_be_bytes([bytes[0], bytes[1]]);
		if version != ERC7930_VERSION {
			return Err(SolverError::Codec(format!(
				"unsupported ERC-7930 version 0x{version:04x}"
			)));
		}

		let chain_type = u16::from_be_bytes([bytes[2], bytes[3]]);
		if chain_type != ERC7930_CHAIN_TYPE {
			return Err(SolverError::Codec(format!(
				"unsupported ERC-7930 chain type 0x{chain_type:04x}"
			)));
		}

		let chain_ref_len = bytes[4] as usize;
		if chain_ref_len > 8 {
			return Err(SolverError::Codec(format!(
				"ERC-7930 chain reference too long: {chain_ref_len} bytes"
			)));
		}
		let rest = &bytes[5..];
		if rest.len() < chain_ref_len + 1 {
			return Err(SolverError::Codec(
				"ERC-7930 address truncated in chain reference".to_string(),
			));
		}

		let mut chain_id = 0u64;
		for byte in &rest[..chain_ref_len] {
			chain_id = chain_id << 8 | u64::from(*byte);
		}

		let rest = &rest[chain_ref_len..];
		let address_len = rest[0] as usize;
		if address_len != 20 {
			return Err(SolverError::Codec(format!(
				"ERC-7930 address length must be 20, got {address_len}"
			)));
		}
		let rest = &rest[1..];
		if rest.len() != 20 {
			return Err(SolverError::Codec(format!(
				"ERC-7930 address body has {} bytes, expected 20",
				rest.len()
			)));
		}

		Ok(Self {
			address: Address::from_slice(rest),
			chain_id,
		})
	}

	/// Encodes to ERC-7930 binary with a minimal-length big-endian chain
	/// reference.
	pub fn to_erc7930(&self) -> Vec<u8> {
		let chain_ref = self.chain_id.to_be_bytes();
		let skip = chain_ref
			.iter()
			.position(|b| *b != 0)
			.unwrap_or(chain_ref.len() - 1);
		let chain_ref = &chain_ref[skip..];

		let mut out = Vec::with_capacity(6 + chain_ref.len() + 20);
		out.extend_from_slice(&ERC7930_VERSION.to_be_bytes());
		out.extend_from_slice(&ERC7930_CHAIN_TYPE.to_be_bytes());
		out.push(chain_ref.len() as u8);
		out.extend_from_slice(chain_ref);
		out.push(20);
		out.extend_from_slice(self.address.as_slice());
		out
	}
}

impl fmt::Display for Account {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.address.to_checksum(None), self.chain_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_decode_erc7930() {
		let mut bytes = vec![0x00, 0x01, 0x00, 0x00, 0x01, 0x2a, 0x14];
		bytes.extend_from_slice(&[0xaa; 20]);

		let account = Account::from_erc7930(&bytes).unwrap();
		assert_eq!(account.chain_id, 42);
		assert_eq!(account.address, Address::from([0xaa; 20]));
	}

	#[test]
	fn test_decode_rejects_wrong_version() {
		let mut bytes = vec![0x00, 0x02, 0x00, 0x00, 0x01, 0x2a, 0x14];
		bytes.extend_from_slice(&[0xaa; 20]);

		let err = Account::from_erc7930(&bytes).unwrap_err();
		assert!(err.to_string().contains("version"));
	}

	#[test]
	fn test_decode_rejects_wrong_chain_type() {
		let mut bytes = vec![0x00, 0x01, 0x00, 0x01, 0x01, 0x2a, 0x14];
		bytes.extend_from_slice(&[0xaa; 20]);

		let err = Account::from_erc7930(&bytes).unwrap_err();
		assert!(err.to_string().contains("chain type"));
	}

	#[test]
	fn test_decode_rejects_short_address() {
		let bytes = vec![0x00, 0x01, 0x00, 0x00, 0x01, 0x2a, 0x13, 0xaa];
		assert!(Account::from_erc7930(&bytes).is_err());
	}

	#[test]
	fn test_round_trip() {
		let account = Account::new(
			address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
			42161,
		);
		let recovered = Account::from_erc7930(&account.to_erc7930()).unwrap();
		assert_eq!(recovered, account);
	}

	#[test]
	fn test_round_trip_zero_chain() {
		let account = Account::new(Address::ZERO, 0);
		let encoded = account.to_erc7930();
		// Minimal chain reference still carries one byte.
		assert_eq!(encoded[4], 1);
		assert_eq!(Account::from_erc7930(&encoded).unwrap(), account);
	}

	#[test]
	fn test_display_is_checksummed() {
		let account = Account::new(
			address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
			1,
		);
		assert_eq!(
			account.to_string(),
			"0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045@1"
		);
	}
}
