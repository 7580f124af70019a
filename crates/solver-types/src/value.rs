//! ABI-encoded values and their wire form.
//!
//! An [`AbiEncodedValue`] wraps a byte string that is already ABI-encoded,
//! remembering whether it is the head-inlined static form or the
//! offset-referenced dynamic form. The wire form wraps the value in an outer
//! two-parameter tuple `(string "", T)`: dynamic values carry the canonical
//! 96-byte prefix (offset words `0x40`, `0x60` and the empty-string length
//! word), static values carry a leading length word and a trailing 32-byte
//! zero pad.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SolverError};

/// Size of one ABI word.
pub const WORD: usize = 32;

/// Largest integer the codec accepts where an index or count is transported
/// as `uint256`, chosen to stay interoperable with 53-bit hosts.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Canonical prefix of the wire form of a dynamic value: the two offset
/// words of the outer `(string, T)` tuple followed by the empty-string
/// length word.
pub fn dynamic_prefix() -> [u8; 3 * WORD] {
	let mut prefix = [0u8; 3 * WORD];
	prefix[31] = 0x40;
	prefix[63] = 0x60;
	prefix
}

/// A byte string in ABI encoding, tagged static or dynamic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiEncodedValue {
	Static(Bytes),
	Dynamic(Bytes),
}

impl AbiEncodedValue {
	/// The inner encoding, without wire framing.
	pub fn encoding(&self) -> &Bytes {
		match self {
			AbiEncodedValue::Static(bytes) | AbiEncodedValue::Dynamic(bytes) => bytes,
		}
	}

	pub fn is_dynamic(&self) -> bool {
		matches!(self, AbiEncodedValue::Dynamic(_))
	}

	/// Wraps a `uint256` as a static value.
	pub fn uint256(value: U256) -> Self {
		AbiEncodedValue::Static(Bytes::from(value.to_be_bytes::<WORD>().to_vec()))
	}

	/// Wraps an address as a static value (left-padded to one word).
	pub fn address(address: Address) -> Self {
		let mut word = vec![0u8; WORD];
		word[12..].copy_from_slice(address.as_slice());
		AbiEncodedValue::Static(Bytes::from(word))
	}

	/// Reads the value back as a `uint256`. Only a single-word static
	/// encoding qualifies.
	pub fn as_uint256(&self) -> Result<U256> {
		match self {
			AbiEncodedValue::Dynamic(_) => Err(SolverError::Variable(
				"dynamic value cannot be read as uint256".to_string(),
			)),
			AbiEncodedValue::Static(bytes) if bytes.len() != WORD => Err(SolverError::Variable(
				format!("expected 32-byte uint256 encoding, got {} bytes", bytes.len()),
			)),
			AbiEncodedValue::Static(bytes) => Ok(U256::from_be_slice(bytes)),
		}
	}

	/// Decodes the wire form described in the module docs.
	pub fn decode(blob: &[u8]) -> Result<Self> {
		let prefix = dynamic_prefix();
		if blob.len() >= prefix.len() && blob[..prefix.len()] == prefix {
			return Ok(AbiEncodedValue::Dynamic(Bytes::copy_from_slice(
				&blob[prefix.len()..],
			)));
		}

		if blob.len() < 2 * WORD {
			return Err(SolverError::Codec(format!(
				"ABI value blob too short: {} bytes",
				blob.len()
			)));
		}
		let pad = &blob[blob.len() - WORD..];
		if pad.iter().any(|b| *b != 0) {
			return Err(SolverError::Codec(
				"malformed static padding in ABI value".to_string(),
			));
		}
		let header = U256::from_be_slice(&blob[..WORD]);
		let expected = blob.len() - 2 * WORD;
		if header != U256::from(expected) {
			return Err(SolverError::Codec(format!(
				"ABI value length header {header} does not match payload of {expected} bytes"
			)));
		}

		Ok(AbiEncodedValue::Static(Bytes::copy_from_slice(
			&blob[WORD..blob.len() - WORD],
		)))
	}

	/// Produces the wire form; inverse of [`AbiEncodedValue::decode`].
	pub fn encode(&self) -> Bytes {
		match self {
			AbiEncodedValue::Dynamic(bytes) => {
				let mut out = Vec::with_capacity(3 * WORD + bytes.len());
				out.extend_from_slice(&dynamic_prefix());
				out.extend_from_slice(bytes);
				Bytes::from(out)
			}
			AbiEncodedValue::Static(bytes) => {
				let mut out = Vec::with_capacity(2 * WORD + bytes.len());
				out.extend_from_slice(&U256::from(bytes.len()).to_be_bytes::<WORD>());
				out.extend_from_slice(bytes);
				out.extend_from_slice(&[0u8; WORD]);
				Bytes::from(out)
			}
		}
	}
}

/// Converts a `uint256`-transported index into `usize`, rejecting anything
/// above [`MAX_SAFE_INTEGER`].
pub fn safe_index(value: U256) -> Result<usize> {
	if value > U256::from(MAX_SAFE_INTEGER) {
		return Err(SolverError::Codec(format!(
			"integer {value} exceeds the safe range"
		)));
	}
	Ok(value.to::<u64>() as usize)
}
