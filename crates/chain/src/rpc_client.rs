//! Ethereum JSON-RPC client for chain reads.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, info};

use safewatch_telemetry::Metrics;

use crate::{ChainError, ChainReader, ChainResult};

const RPC_TIMEOUT_SECS: u64 = 10;

/// Ethereum JSON-RPC client wrapper.
pub struct HttpChainReader {
    client: Client,
    rpc_url: String,
    metrics: Metrics,
}

impl HttpChainReader {
    /// Create a new RPC client.
    ///
    /// # Arguments
    /// * `rpc_url` - HTTP/HTTPS JSON-RPC endpoint URL
    /// * `metrics` - Metrics collector
    pub fn new(rpc_url: &str, metrics: Metrics) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(RPC_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;

        info!("Initialized chain reader for {}", rpc_url);

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
            metrics,
        })
    }

    async fn call_rpc(&self, method: &str, params: Value) -> ChainResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let start = Instant::now();
        let outcome = self.send_rpc(&payload).await;
        self.metrics
            .observe_lookup_latency(method, start.elapsed().as_secs_f64());

        if outcome.is_err() {
            self.metrics.inc_lookup_errors("chain");
        }
        outcome
    }

    async fn send_rpc(&self, payload: &Value) -> ChainResult<Value> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChainError::Unavailable(format!(
                "RPC request failed with status: {}",
                response.status()
            )));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        if let Some(error) = result.get("error") {
            return Err(ChainError::Unavailable(format!("RPC error: {}", error)));
        }

        Ok(result["result"].clone())
    }

    fn expect_str<'a>(result: &'a Value, what: &str) -> ChainResult<&'a str> {
        result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse(format!("{} is not a string", what)))
    }
}

#[async_trait]
impl ChainReader for HttpChainReader {
    async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        let result = self
            .call_rpc("eth_getBalance", json!([address, "latest"]))
            .await?;
        let hex_str = Self::expect_str(&result, "balance")?;
        let balance = U256::from_str_radix(hex_str.strip_prefix("0x").unwrap_or(hex_str), 16)
            .map_err(|e| ChainError::InvalidResponse(format!("invalid balance {}: {}", hex_str, e)))?;
        debug!("Balance of {}: {} wei", address, balance);
        Ok(balance)
    }

    async fn get_code(&self, address: Address) -> ChainResult<Bytes> {
        let result = self
            .call_rpc("eth_getCode", json!([address, "latest"]))
            .await?;
        let hex_str = Self::expect_str(&result, "code")?;
        let code = Bytes::from_str(hex_str)
            .map_err(|e| ChainError::InvalidResponse(format!("invalid code: {}", e)))?;
        debug!("Code at {}: {} bytes", address, code.len());
        Ok(code)
    }

    async fn get_chain_id(&self) -> ChainResult<u64> {
        let result = self.call_rpc("eth_chainId", json!([])).await?;
        let hex_str = Self::expect_str(&result, "chain id")?;
        u64::from_str_radix(hex_str.strip_prefix("0x").unwrap_or(hex_str), 16)
            .map_err(|e| ChainError::InvalidResponse(format!("invalid chain id {}: {}", hex_str, e)))
    }
}
