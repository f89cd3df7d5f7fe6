//! External collaborators of the risk engine.
//!
//! Every remote service sits behind a narrow trait so the engine can be
//! exercised with deterministic fakes. The HTTP implementations make a
//! single attempt per call; callers wanting resilience add their own retry
//! wrapper.

pub mod address_book;
pub mod reputation;
pub mod tx_directory;
pub mod verification;

pub use address_book::AddressBook;
pub use reputation::{HttpReputationService, ReputationSource};
pub use tx_directory::{
    HttpTransactionService, PendingTransactionDirectory, PendingTransactionPage, SafeStateSource,
};
pub use verification::{EtherscanVerificationService, VerificationInfo, VerificationSource};

/// Error type for external service calls.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type for external service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
