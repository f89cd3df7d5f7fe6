//! Analysis error taxonomy.

use alloy::primitives::{Address, B256};

use safewatch_services::ServiceError;

/// Errors that abort an analysis outright.
///
/// Lookup failures inside individual checks never surface here; each check
/// degrades to "skipped" on its own.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("no pending transaction {0} found for Safe {1}")]
    TransactionNotFound(B256, Address),
    #[error("transaction directory error: {0}")]
    Directory(#[from] ServiceError),
}

/// Result type for analysis calls.
pub type AnalyzeResult<T> = Result<T, AnalyzeError>;
