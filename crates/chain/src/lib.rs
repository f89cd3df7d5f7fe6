//! Read-only blockchain access.
//!
//! The risk engine only reads chain state: native balances, deployed code,
//! and the chain id. Implementations sit behind the `ChainReader` trait so
//! the engine can run against deterministic fakes in tests.

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;

pub mod rpc_client;

pub use rpc_client::HttpChainReader;

/// Error type for chain reads.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("chain endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("malformed RPC response: {0}")]
    InvalidResponse(String),
}

/// Result type for chain reads.
pub type ChainResult<T> = Result<T, ChainError>;

/// Trait for read-only chain accessors.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current native-token balance in wei. A zero balance is a valid
    /// answer, not an error.
    async fn get_balance(&self, address: Address) -> ChainResult<U256>;

    /// Deployed bytecode at the address. An empty result means the address
    /// is an externally-owned account.
    async fn get_code(&self, address: Address) -> ChainResult<Bytes>;

    /// Chain id of the connected endpoint.
    async fn get_chain_id(&self) -> ChainResult<u64>;
}
