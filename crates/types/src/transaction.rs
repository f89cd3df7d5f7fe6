//! Wire model of the Safe transaction service.

use alloy::primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers;

/// A proposed multisig transaction awaiting owner confirmations.
///
/// Snapshot of one entry in the Safe's pending queue. The analysis layer
/// only ever reads it; confirmations are appended by the service as other
/// owners approve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub safe_tx_hash: B256,
    pub to: Address,
    #[serde(with = "serde_helpers::u256_string")]
    pub value: U256,
    #[serde(default)]
    pub data: Option<Bytes>,
    /// Best-effort ABI decoding attached by the service at proposal time;
    /// absent when the payload matched no known ABI.
    #[serde(default)]
    pub data_decoded: Option<DecodedCall>,
    pub proposer: Address,
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub confirmations: Vec<Confirmation>,
    /// Confirmation threshold copied from the Safe's configuration at
    /// proposal time.
    pub confirmations_required: u32,
}

impl PendingTransaction {
    /// True when the call payload is empty (a plain native transfer or a
    /// no-op call).
    pub fn has_empty_data(&self) -> bool {
        self.data.as_ref().map_or(true, |d| d.is_empty())
    }
}

/// One owner approval recorded against a pending transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    pub submission_date: DateTime<Utc>,
}

/// Decoded method call attached by the transaction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedCall {
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<DecodedParameter>,
}

impl DecodedCall {
    /// Look up a parameter by its declared name, falling back to position
    /// when the decoder did not preserve names.
    pub fn parameter(&self, name: &str, position: usize) -> Option<&DecodedParameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.parameters.get(position))
    }
}

/// One decoded call parameter. Values are carried as strings on the wire
/// regardless of their ABI type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_service_payload() {
        let json = r#"{
            "safeTxHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "to": "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
            "value": "1000000000000000000",
            "data": null,
            "dataDecoded": {
                "method": "transfer",
                "parameters": [
                    {"name": "to", "type": "address", "value": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"},
                    {"name": "value", "type": "uint256", "value": "500"}
                ]
            },
            "proposer": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "submissionDate": "2024-03-01T12:00:00Z",
            "confirmations": [
                {"owner": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", "submissionDate": "2024-03-01T12:00:00Z"}
            ],
            "confirmationsRequired": 2
        }"#;

        let tx: PendingTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.value, U256::from(10u64).pow(U256::from(18u64)));
        assert!(tx.has_empty_data());
        assert_eq!(tx.confirmations.len(), 1);
        assert_eq!(tx.confirmations_required, 2);

        let decoded = tx.data_decoded.unwrap();
        assert_eq!(decoded.method, "transfer");
        assert_eq!(decoded.parameter("value", 1).unwrap().value, "500");
    }

    #[test]
    fn parameter_lookup_falls_back_to_position() {
        let call = DecodedCall {
            method: "changeThreshold".to_string(),
            parameters: vec![DecodedParameter {
                name: "arg0".to_string(),
                param_type: "uint256".to_string(),
                value: "3".to_string(),
            }],
        };
        assert_eq!(call.parameter("_threshold", 0).unwrap().value, "3");
        assert!(call.parameter("_threshold", 5).is_none());
    }
}
