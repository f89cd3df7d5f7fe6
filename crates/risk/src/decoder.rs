//! Classification of pending transactions into semantic actions.

use alloy::primitives::{Address, U256};

use safewatch_types::serde_helpers::parse_u256;
use safewatch_types::{ActionClassification, DecodedCall, PendingTransaction};

/// Owner-management and token methods the classifier understands, with the
/// decoded positions of their interesting parameters. Resolution is by
/// parameter name first and falls back to position, so a decoder that
/// renames bookkeeping parameters still classifies correctly.
struct MethodSpec {
    method: &'static str,
    kind: MethodKind,
}

#[derive(Clone, Copy)]
enum MethodKind {
    AddOwner,
    RemoveOwner,
    ChangeThreshold,
    EnableModule,
    Erc20Transfer,
}

const KNOWN_METHODS: &[MethodSpec] = &[
    MethodSpec {
        method: "addOwnerWithThreshold",
        kind: MethodKind::AddOwner,
    },
    MethodSpec {
        method: "removeOwner",
        kind: MethodKind::RemoveOwner,
    },
    MethodSpec {
        method: "changeThreshold",
        kind: MethodKind::ChangeThreshold,
    },
    MethodSpec {
        method: "enableModule",
        kind: MethodKind::EnableModule,
    },
    MethodSpec {
        method: "transfer",
        kind: MethodKind::Erc20Transfer,
    },
];

/// Classify a pending transaction into exactly one semantic action.
///
/// Total: unrecognized or partially decodable payloads fall back to
/// `GenericCall`, and a nonzero value with no payload is a native transfer.
pub fn classify(tx: &PendingTransaction) -> ActionClassification {
    if let Some(decoded) = &tx.data_decoded {
        let known = KNOWN_METHODS
            .iter()
            .find(|spec| spec.method == decoded.method);
        if let Some(spec) = known {
            if let Some(classification) = classify_known(spec.kind, decoded) {
                return classification;
            }
        }
        return ActionClassification::GenericCall {
            method: Some(decoded.method.clone()),
            destination: tx.to,
            parameter_count: decoded.parameters.len(),
        };
    }

    if tx.value > U256::ZERO && tx.has_empty_data() {
        return ActionClassification::TokenTransfer {
            destination: tx.to,
            amount: tx.value,
        };
    }

    ActionClassification::GenericCall {
        method: None,
        destination: tx.to,
        parameter_count: 0,
    }
}

fn classify_known(kind: MethodKind, decoded: &DecodedCall) -> Option<ActionClassification> {
    match kind {
        MethodKind::AddOwner => Some(ActionClassification::AddOwner {
            address: address_param(decoded, "owner", 0)?,
            new_threshold: integer_param(decoded, "_threshold", 1)?,
        }),
        MethodKind::RemoveOwner => Some(ActionClassification::RemoveOwner {
            // removeOwner(prevOwner, owner, _threshold): the owner being
            // removed sits after the linked-list pointer.
            address: address_param(decoded, "owner", 1)?,
            new_threshold: integer_param(decoded, "_threshold", 2)?,
        }),
        MethodKind::ChangeThreshold => Some(ActionClassification::ChangeThreshold {
            new_threshold: integer_param(decoded, "_threshold", 0)?,
        }),
        MethodKind::EnableModule => Some(ActionClassification::EnableModule {
            module: address_param(decoded, "module", 0)?,
        }),
        MethodKind::Erc20Transfer => Some(ActionClassification::TokenTransfer {
            destination: address_param(decoded, "to", 0)?,
            amount: amount_param(decoded, "value", 1)?,
        }),
    }
}

fn address_param(decoded: &DecodedCall, name: &str, position: usize) -> Option<Address> {
    decoded.parameter(name, position)?.value.parse().ok()
}

fn integer_param(decoded: &DecodedCall, name: &str, position: usize) -> Option<u32> {
    decoded.parameter(name, position)?.value.parse().ok()
}

fn amount_param(decoded: &DecodedCall, name: &str, position: usize) -> Option<U256> {
    parse_u256(&decoded.parameter(name, position)?.value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use safewatch_types::DecodedParameter;

    fn create_test_tx(
        value: U256,
        data: Option<&str>,
        decoded: Option<DecodedCall>,
    ) -> PendingTransaction {
        PendingTransaction {
            safe_tx_hash: Default::default(),
            to: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                .parse()
                .unwrap(),
            value,
            data: data.map(|d| d.parse().unwrap()),
            data_decoded: decoded,
            proposer: Address::ZERO,
            submission_date: "2024-03-01T12:00:00Z".parse().unwrap(),
            confirmations: vec![],
            confirmations_required: 2,
        }
    }

    fn param(name: &str, param_type: &str, value: &str) -> DecodedParameter {
        DecodedParameter {
            name: name.to_string(),
            param_type: param_type.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn empty_payload_is_never_a_transfer() {
        let tx = create_test_tx(U256::ZERO, None, None);
        let classification = classify(&tx);
        assert_eq!(
            classification,
            ActionClassification::GenericCall {
                method: None,
                destination: tx.to,
                parameter_count: 0,
            }
        );
    }

    #[test]
    fn native_send_with_no_payload_is_a_transfer() {
        let tx = create_test_tx(U256::from(1_000u64), Some("0x"), None);
        assert_eq!(
            classify(&tx),
            ActionClassification::TokenTransfer {
                destination: tx.to,
                amount: U256::from(1_000u64),
            }
        );
    }

    #[test]
    fn classifies_add_owner() {
        let decoded = DecodedCall {
            method: "addOwnerWithThreshold".to_string(),
            parameters: vec![
                param(
                    "owner",
                    "address",
                    "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
                ),
                param("_threshold", "uint256", "2"),
            ],
        };
        let tx = create_test_tx(U256::ZERO, Some("0xdeadbeef"), Some(decoded));
        assert_eq!(
            classify(&tx),
            ActionClassification::AddOwner {
                address: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
                    .parse()
                    .unwrap(),
                new_threshold: 2,
            }
        );
    }

    #[test]
    fn remove_owner_resolves_by_name_past_the_list_pointer() {
        let decoded = DecodedCall {
            method: "removeOwner".to_string(),
            parameters: vec![
                param(
                    "prevOwner",
                    "address",
                    "0x0000000000000000000000000000000000000001",
                ),
                param(
                    "owner",
                    "address",
                    "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
                ),
                param("_threshold", "uint256", "1"),
            ],
        };
        let tx = create_test_tx(U256::ZERO, Some("0xdeadbeef"), Some(decoded));
        assert_eq!(
            classify(&tx),
            ActionClassification::RemoveOwner {
                address: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
                    .parse()
                    .unwrap(),
                new_threshold: 1,
            }
        );
    }

    #[test]
    fn classifies_erc20_transfer_with_decoded_destination() {
        let decoded = DecodedCall {
            method: "transfer".to_string(),
            parameters: vec![
                param(
                    "to",
                    "address",
                    "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
                ),
                param("value", "uint256", "500"),
            ],
        };
        let tx = create_test_tx(U256::ZERO, Some("0xa9059cbb"), Some(decoded));
        assert_eq!(
            classify(&tx),
            ActionClassification::TokenTransfer {
                destination: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
                    .parse()
                    .unwrap(),
                amount: U256::from(500u64),
            }
        );
    }

    #[test]
    fn unknown_method_preserves_name_and_arity() {
        let decoded = DecodedCall {
            method: "execTransactionFromModule".to_string(),
            parameters: vec![
                param("to", "address", "0x0000000000000000000000000000000000000001"),
                param("value", "uint256", "0"),
                param("data", "bytes", "0x"),
                param("operation", "uint8", "0"),
            ],
        };
        let tx = create_test_tx(U256::ZERO, Some("0xdeadbeef"), Some(decoded));
        assert_eq!(
            classify(&tx),
            ActionClassification::GenericCall {
                method: Some("execTransactionFromModule".to_string()),
                destination: tx.to,
                parameter_count: 4,
            }
        );
    }

    #[test]
    fn malformed_parameters_fall_back_to_generic_call() {
        let decoded = DecodedCall {
            method: "addOwnerWithThreshold".to_string(),
            parameters: vec![
                param("owner", "address", "not-an-address"),
                param("_threshold", "uint256", "2"),
            ],
        };
        let tx = create_test_tx(U256::ZERO, Some("0xdeadbeef"), Some(decoded));
        assert_eq!(
            classify(&tx),
            ActionClassification::GenericCall {
                method: Some("addOwnerWithThreshold".to_string()),
                destination: tx.to,
                parameter_count: 2,
            }
        );
    }
}
