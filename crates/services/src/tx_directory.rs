//! Safe transaction-service client.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};

use safewatch_telemetry::Metrics;
use safewatch_types::PendingTransaction;

use crate::{ServiceError, ServiceResult};

const SERVICE_TIMEOUT_SECS: u64 = 10;

/// One page of queued transactions for a Safe.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransactionPage {
    pub results: Vec<PendingTransaction>,
    pub count: usize,
}

/// Directory of proposed, not-yet-executed transactions for a Safe.
#[async_trait]
pub trait PendingTransactionDirectory: Send + Sync {
    /// All currently queued transactions for the Safe. The service offers
    /// no by-hash endpoint; callers filter the page themselves.
    async fn pending_transactions(&self, safe: Address) -> ServiceResult<PendingTransactionPage>;
}

/// Ownership configuration of a Safe, read from its on-chain state through
/// the transaction service. Authoritative and current at call time.
#[async_trait]
pub trait SafeStateSource: Send + Sync {
    async fn owners(&self, safe: Address) -> ServiceResult<Vec<Address>>;
    async fn threshold(&self, safe: Address) -> ServiceResult<u32>;
}

/// HTTP client for a Safe transaction-service deployment.
pub struct HttpTransactionService {
    client: Client,
    base_url: String,
    metrics: Metrics,
}

#[derive(Debug, Deserialize)]
struct SafeInfo {
    owners: Vec<Address>,
    threshold: u32,
}

impl HttpTransactionService {
    /// Create a new transaction-service client.
    ///
    /// # Arguments
    /// * `base_url` - Service base URL, e.g. the mainnet deployment
    /// * `metrics` - Metrics collector
    pub fn new(base_url: &str, metrics: Metrics) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SERVICE_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        info!("Initialized transaction service client for {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            metrics,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: String) -> ServiceResult<T> {
        let start = Instant::now();
        let outcome = self.fetch(&url).await;
        self.metrics
            .observe_lookup_latency(operation, start.elapsed().as_secs_f64());

        if outcome.is_err() {
            self.metrics.inc_lookup_errors(operation);
        }
        outcome
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> ServiceResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    async fn safe_info(&self, safe: Address) -> ServiceResult<SafeInfo> {
        let url = format!("{}/api/v1/safes/{}/", self.base_url, safe);
        self.get_json("safe_info", url).await
    }
}

#[async_trait]
impl PendingTransactionDirectory for HttpTransactionService {
    async fn pending_transactions(&self, safe: Address) -> ServiceResult<PendingTransactionPage> {
        let url = format!(
            "{}/api/v1/safes/{}/multisig-transactions/?executed=false",
            self.base_url, safe
        );
        let page: PendingTransactionPage = self.get_json("pending_transactions", url).await?;
        debug!("Fetched {} pending transactions for {}", page.count, safe);
        Ok(page)
    }
}

#[async_trait]
impl SafeStateSource for HttpTransactionService {
    async fn owners(&self, safe: Address) -> ServiceResult<Vec<Address>> {
        Ok(self.safe_info(safe).await?.owners)
    }

    async fn threshold(&self, safe: Address) -> ServiceResult<u32> {
        Ok(self.safe_info(safe).await?.threshold)
    }
}
