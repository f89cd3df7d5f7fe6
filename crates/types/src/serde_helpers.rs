//! Serde adapters for transaction-service wire encodings.

use alloy::primitives::U256;

/// Parse a quantity that may arrive as a decimal string or a 0x-prefixed
/// hex string, as different service deployments encode amounts both ways.
pub fn parse_u256(raw: &str) -> Result<U256, String> {
    if let Some(hex_part) = raw.strip_prefix("0x") {
        U256::from_str_radix(hex_part, 16)
            .map_err(|e| format!("invalid hex quantity {:?}: {}", raw, e))
    } else {
        U256::from_str_radix(raw, 10)
            .map_err(|e| format!("invalid decimal quantity {:?}: {}", raw, e))
    }
}

/// Serde adapter for `U256` fields carried as strings on the wire.
pub mod u256_string {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_u256(&raw).map_err(serde::de::Error::custom)
    }
}
