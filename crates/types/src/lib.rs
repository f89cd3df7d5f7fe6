//! Shared data model for the safewatch workspace.

pub mod report;
pub mod serde_helpers;
pub mod transaction;

pub use report::{ActionClassification, AnalysisReport, RiskFinding, Severity};
pub use transaction::{Confirmation, DecodedCall, DecodedParameter, PendingTransaction};
