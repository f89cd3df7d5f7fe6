//! Contract source-verification lookups.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};

use safewatch_telemetry::Metrics;

use crate::{ServiceError, ServiceResult};

const EXPLORER_TIMEOUT_SECS: u64 = 10;
const UNVERIFIED_ABI_MARKER: &str = "Contract source code not verified";

/// Verification status reported by a block explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationInfo {
    pub verified: bool,
    pub name: Option<String>,
    pub abi: Option<String>,
}

/// Source of contract verification status.
#[async_trait]
pub trait VerificationSource: Send + Sync {
    /// Verification status for a contract address. Only meaningful for
    /// addresses with deployed code; callers establish that first.
    async fn verification_info(&self, address: Address) -> ServiceResult<VerificationInfo>;
}

/// Etherscan-compatible explorer client.
pub struct EtherscanVerificationService {
    client: Client,
    base_url: String,
    api_key: String,
    metrics: Metrics,
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    result: Vec<SourceCodeEntry>,
}

#[derive(Debug, Deserialize)]
struct SourceCodeEntry {
    #[serde(rename = "SourceCode", default)]
    source_code: String,
    #[serde(rename = "ContractName", default)]
    contract_name: String,
    #[serde(rename = "ABI", default)]
    abi: String,
}

impl EtherscanVerificationService {
    /// Create a new explorer client.
    ///
    /// # Arguments
    /// * `base_url` - Explorer API base URL
    /// * `api_key` - Explorer API key
    /// * `metrics` - Metrics collector
    pub fn new(base_url: &str, api_key: &str, metrics: Metrics) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(EXPLORER_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        info!("Initialized explorer client for {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            metrics,
        })
    }

    async fn fetch_source(&self, address: Address) -> ServiceResult<VerificationInfo> {
        let url = format!(
            "{}/api?module=contract&action=getsourcecode&address={}&apikey={}",
            self.base_url, address, self.api_key
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let body: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        if body.status != "1" {
            return Err(ServiceError::Malformed(format!(
                "explorer returned status {}",
                body.status
            )));
        }

        let entry = body
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Malformed("empty result".to_string()))?;

        let verified = !entry.source_code.is_empty() && entry.abi != UNVERIFIED_ABI_MARKER;
        Ok(VerificationInfo {
            verified,
            name: (!entry.contract_name.is_empty()).then(|| entry.contract_name),
            abi: (verified && !entry.abi.is_empty()).then(|| entry.abi),
        })
    }
}

#[async_trait]
impl VerificationSource for EtherscanVerificationService {
    async fn verification_info(&self, address: Address) -> ServiceResult<VerificationInfo> {
        let start = Instant::now();
        let outcome = self.fetch_source(address).await;
        self.metrics
            .observe_lookup_latency("verification", start.elapsed().as_secs_f64());

        match &outcome {
            Ok(info) => debug!("Verification of {}: verified={}", address, info.verified),
            Err(_) => self.metrics.inc_lookup_errors("verification"),
        }
        outcome
    }
}
