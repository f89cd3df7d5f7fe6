//! Address reputation lookups.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};

use safewatch_telemetry::Metrics;

use crate::{ServiceError, ServiceResult};

const REPUTATION_TIMEOUT_SECS: u64 = 10;

/// Source of address trust scores.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Trust score for the address, on a provider-defined ordinal scale
    /// where higher means more trustworthy. Callers compare against their
    /// own floor and attach no further meaning to the number.
    async fn reputation(&self, address: Address) -> ServiceResult<u32>;
}

/// HTTP client for an address-reputation provider.
pub struct HttpReputationService {
    client: Client,
    base_url: String,
    api_key: String,
    metrics: Metrics,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: u32,
}

impl HttpReputationService {
    /// Create a new reputation client.
    ///
    /// # Arguments
    /// * `base_url` - Provider base URL
    /// * `api_key` - Provider API key, sent as a request header
    /// * `metrics` - Metrics collector
    pub fn new(base_url: &str, api_key: &str, metrics: Metrics) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REPUTATION_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        info!("Initialized reputation client for {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            metrics,
        })
    }

    async fn fetch_score(&self, address: Address) -> ServiceResult<u32> {
        let url = format!("{}/v1/addresses/{}/score", self.base_url, address);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        Ok(body.score)
    }
}

#[async_trait]
impl ReputationSource for HttpReputationService {
    async fn reputation(&self, address: Address) -> ServiceResult<u32> {
        let start = Instant::now();
        let outcome = self.fetch_score(address).await;
        self.metrics
            .observe_lookup_latency("reputation", start.elapsed().as_secs_f64());

        match &outcome {
            Ok(score) => debug!("Reputation of {}: {}", address, score),
            Err(_) => self.metrics.inc_lookup_errors("reputation"),
        }
        outcome
    }
}
