//! Prometheus metrics for the safewatch analysis service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Metrics collector for the safewatch service.
///
/// Each instance owns its own registry, so independent components (and
/// tests) can create collectors without colliding on metric names.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    analyses_performed: IntCounter,
    findings_emitted: IntCounter,
    pending_seen: IntCounter,
    lookup_errors: IntCounterVec,
    lookup_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance with a fresh registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let analyses_performed = IntCounter::new(
            "safewatch_analyses_total",
            "Total number of risk analyses performed",
        )?;
        registry.register(Box::new(analyses_performed.clone()))?;

        let findings_emitted = IntCounter::new(
            "safewatch_findings_total",
            "Total number of risk findings emitted",
        )?;
        registry.register(Box::new(findings_emitted.clone()))?;

        let pending_seen = IntCounter::new(
            "safewatch_pending_transactions_seen_total",
            "Total number of pending transactions observed by the watch loop",
        )?;
        registry.register(Box::new(pending_seen.clone()))?;

        let lookup_errors = IntCounterVec::new(
            Opts::new(
                "safewatch_lookup_errors_total",
                "Total number of failed external lookups",
            ),
            &["source"],
        )?;
        registry.register(Box::new(lookup_errors.clone()))?;

        let lookup_latency = HistogramVec::new(
            HistogramOpts::new(
                "safewatch_lookup_latency_seconds",
                "External lookup latency in seconds",
            ),
            &["source"],
        )?;
        registry.register(Box::new(lookup_latency.clone()))?;

        Ok(Self {
            registry,
            analyses_performed,
            findings_emitted,
            pending_seen,
            lookup_errors,
            lookup_latency,
        })
    }

    /// Increment the analyses counter.
    pub fn inc_analyses(&self) {
        self.analyses_performed.inc();
    }

    /// Increment the findings counter.
    pub fn inc_findings(&self, count: u64) {
        self.findings_emitted.inc_by(count);
    }

    /// Increment the pending-transactions-seen counter.
    pub fn inc_pending_seen(&self, count: u64) {
        self.pending_seen.inc_by(count);
    }

    /// Increment the error counter for one lookup source.
    pub fn inc_lookup_errors(&self, source: &str) {
        self.lookup_errors.with_label_values(&[source]).inc();
    }

    /// Record the latency of one external lookup.
    pub fn observe_lookup_latency(&self, source: &str, duration_secs: f64) {
        self.lookup_latency
            .with_label_values(&[source])
            .observe(duration_secs);
    }

    /// Get Prometheus metrics as a string.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
