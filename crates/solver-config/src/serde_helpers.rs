//! Serde helpers for configuration deserialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Deserializes a `HashMap<u64, T>` whose keys arrive as strings, as TOML
/// table keys do.
pub fn deserialize_chain_map<'de, D, T>(deserializer: D) -> Result<HashMap<u64, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = HashMap::<String, T>::deserialize(deserializer)?;
	map.into_iter()
		.map(|(key, value)| {
			key.parse::<u64>()
				.map(|id| (id, value))
				.map_err(|_| serde::de::Error::custom(format!("invalid chain id: {key}")))
		})
		.collect()
}

/// Serializes a `HashMap<u64, T>` with string keys.
pub fn serialize_chain_map<S, T>(map: &HashMap<u64, T>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let string_map: HashMap<String, &T> =
		map.iter().map(|(key, value)| (key.to_string(), value)).collect();
	string_map.serialize(serializer)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Deserialize, Serialize)]
	struct TestStruct {
		#[serde(
			deserialize_with = "deserialize_chain_map",
			serialize_with = "serialize_chain_map"
		)]
		endpoints: HashMap<u64, String>,
	}

	#[test]
	fn test_chain_map_round_trip() {
		let toml = r#"
			[endpoints]
			1 = "endpoint1"
			42161 = "endpoint2"
		"#;

		let parsed: TestStruct = toml::from_str(toml).unwrap();
		assert_eq!(parsed.endpoints.get(&1).unwrap(), "endpoint1");
		assert_eq!(parsed.endpoints.get(&42161).unwrap(), "endpoint2");

		let serialized = toml::to_string(&parsed).unwrap();
		let reparsed: TestStruct = toml::from_str(&serialized).unwrap();
		assert_eq!(reparsed.endpoints.len(), 2);
	}

	#[test]
	fn test_invalid_chain_id_rejected() {
		let toml = r#"
			[endpoints]
			mainnet = "endpoint1"
		"#;
		assert!(toml::from_str::<TestStruct>(toml).is_err());
	}
}
