//! Risk analysis output model.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::transaction::PendingTransaction;

/// Semantic action kind derived from a pending transaction.
///
/// Classification is total: exactly one variant is produced per transaction,
/// with `GenericCall` as the guaranteed fallback for unrecognized payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionClassification {
    AddOwner {
        address: Address,
        new_threshold: u32,
    },
    RemoveOwner {
        address: Address,
        new_threshold: u32,
    },
    ChangeThreshold {
        new_threshold: u32,
    },
    EnableModule {
        module: Address,
    },
    TokenTransfer {
        destination: Address,
        amount: U256,
    },
    GenericCall {
        method: Option<String>,
        destination: Address,
        parameter_count: usize,
    },
}

impl ActionClassification {
    /// One-line description of the action.
    pub fn describe(&self) -> String {
        match self {
            ActionClassification::AddOwner {
                address,
                new_threshold,
            } => format!(
                "Add {} as an owner and set the confirmation threshold to {}",
                address, new_threshold
            ),
            ActionClassification::RemoveOwner {
                address,
                new_threshold,
            } => format!(
                "Remove owner {} and set the confirmation threshold to {}",
                address, new_threshold
            ),
            ActionClassification::ChangeThreshold { new_threshold } => {
                format!("Change the confirmation threshold to {}", new_threshold)
            }
            ActionClassification::EnableModule { module } => {
                format!("Enable module {}", module)
            }
            ActionClassification::TokenTransfer {
                destination,
                amount,
            } => format!("Transfer {} to {}", amount, destination),
            ActionClassification::GenericCall {
                method: Some(method),
                destination,
                parameter_count,
            } => format!(
                "Call {}() on {} with {} parameter(s)",
                method, destination, parameter_count
            ),
            ActionClassification::GenericCall {
                method: None,
                destination,
                ..
            } => format!("Undecoded call to {}", destination),
        }
    }
}

/// Severity of one flagged concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// One flagged concern about a pending transaction.
///
/// Findings accumulate in check-evaluation order and are never deduplicated;
/// two checks may flag related but distinct concerns about the same field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub severity: Severity,
    pub message: String,
}

impl RiskFinding {
    pub fn info(message: String) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }

    pub fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    pub fn critical(message: String) -> Self {
        Self {
            severity: Severity::Critical,
            message,
        }
    }
}

/// Complete analysis of one pending transaction.
///
/// Produced fresh on every request; nothing here is cached, since the
/// underlying confirmation state and external answers drift between calls.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub safe: Address,
    pub transaction: PendingTransaction,
    pub classification: ActionClassification,
    /// Favorable context gathered during checks (reputation scores,
    /// verification names, local labels). Not risk.
    pub annotations: Vec<String>,
    pub findings: Vec<RiskFinding>,
}
