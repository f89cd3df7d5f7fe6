//! The risk rule engine: fetch, classify, gather, check, report.

use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use tracing::{debug, info, warn};

use safewatch_chain::ChainReader;
use safewatch_services::{
    AddressBook, PendingTransactionDirectory, ReputationSource, SafeStateSource, VerificationInfo,
    VerificationSource,
};
use safewatch_telemetry::Metrics;
use safewatch_types::{ActionClassification, AnalysisReport, PendingTransaction};

use crate::checks::{self, DestinationKind, Lookup, RiskContext, RiskThresholds};
use crate::decoder::classify;
use crate::error::{AnalyzeError, AnalyzeResult};
use crate::report;

/// Stateless analysis service over a set of external sources.
///
/// Every call fetches fresh data; nothing is cached between calls, since
/// confirmations, balances and external answers all drift. The engine is
/// safe to share across concurrent analyses.
pub struct RiskEngine {
    directory: Arc<dyn PendingTransactionDirectory>,
    safe_state: Arc<dyn SafeStateSource>,
    chain: Arc<dyn ChainReader>,
    reputation: Option<Arc<dyn ReputationSource>>,
    verification: Option<Arc<dyn VerificationSource>>,
    address_book: AddressBook,
    thresholds: RiskThresholds,
    metrics: Metrics,
}

impl RiskEngine {
    /// Create an engine over the mandatory sources. Reputation and
    /// verification stay disabled until attached.
    pub fn new(
        directory: Arc<dyn PendingTransactionDirectory>,
        safe_state: Arc<dyn SafeStateSource>,
        chain: Arc<dyn ChainReader>,
        metrics: Metrics,
    ) -> Self {
        Self {
            directory,
            safe_state,
            chain,
            reputation: None,
            verification: None,
            address_book: AddressBook::default(),
            thresholds: RiskThresholds::default(),
            metrics,
        }
    }

    /// Attach a reputation provider. Without one, reputation checks are
    /// disabled rather than failed.
    pub fn with_reputation(mut self, source: Arc<dyn ReputationSource>) -> Self {
        self.reputation = Some(source);
        self
    }

    /// Attach a contract-verification provider. Without one, verification
    /// checks are disabled rather than failed.
    pub fn with_verification(mut self, source: Arc<dyn VerificationSource>) -> Self {
        self.verification = Some(source);
        self
    }

    /// Attach a local address book used for favorable annotations.
    pub fn with_address_book(mut self, book: AddressBook) -> Self {
        self.address_book = book;
        self
    }

    /// Override the decision thresholds.
    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Analyze one pending transaction and render the report text.
    ///
    /// This is the single entry point used by the dispatch layer.
    pub async fn analyze(&self, safe: Address, safe_tx_hash: B256) -> AnalyzeResult<String> {
        let report = self.build_report(safe, safe_tx_hash).await?;
        Ok(report::format(&report))
    }

    /// Analyze one pending transaction, returning the structured report.
    pub async fn build_report(
        &self,
        safe: Address,
        safe_tx_hash: B256,
    ) -> AnalyzeResult<AnalysisReport> {
        let page = self.directory.pending_transactions(safe).await?;
        let tx = page
            .results
            .into_iter()
            .find(|t| t.safe_tx_hash == safe_tx_hash)
            .ok_or(AnalyzeError::TransactionNotFound(safe_tx_hash, safe))?;

        Ok(self.analyze_transaction(safe, &tx).await)
    }

    /// Build a report for an already-fetched transaction. Used by the watch
    /// loop so one directory page serves every new transaction on it.
    pub async fn analyze_transaction(
        &self,
        safe: Address,
        tx: &PendingTransaction,
    ) -> AnalysisReport {
        let classification = classify(tx);
        debug!("Classified {} as {:?}", tx.safe_tx_hash, classification);

        // First gather phase: owners, balance and destination code are
        // independent of each other.
        let (owners_res, balance_res, code_res) = tokio::join!(
            self.safe_state.owners(safe),
            self.chain.get_balance(safe),
            self.chain.get_code(tx.to),
        );

        let owners = match owners_res {
            Ok(owners) => Lookup::Value(owners),
            Err(e) => {
                warn!("Owner lookup failed for {}: {}", safe, e);
                Lookup::Failed
            }
        };
        let safe_balance = match balance_res {
            Ok(balance) => Lookup::Value(balance),
            Err(e) => {
                warn!("Balance lookup failed for {}: {}", safe, e);
                Lookup::Failed
            }
        };
        let destination = match code_res {
            Ok(code) if code.is_empty() => DestinationKind::ExternallyOwned,
            Ok(_) => DestinationKind::Contract,
            Err(e) => {
                warn!("Code lookup failed for {}: {}", tx.to, e);
                DestinationKind::Unknown
            }
        };

        // Second gather phase, gated on what the first found. All lookups
        // complete before any check runs.
        let new_owner = match &classification {
            ActionClassification::AddOwner { address, .. } => Some(*address),
            _ => None,
        };
        let reputation_target = (destination == DestinationKind::ExternallyOwned
            && tx.value > U256::ZERO)
            .then_some(tx.to);
        let verification_target = (destination == DestinationKind::Contract).then_some(tx.to);

        let (new_owner_reputation, destination_reputation, destination_verification) = tokio::join!(
            self.lookup_reputation(new_owner),
            self.lookup_reputation(reputation_target),
            self.lookup_verification(verification_target),
        );

        let context = RiskContext {
            tx,
            classification: &classification,
            owners,
            safe_balance,
            destination,
            new_owner_reputation,
            destination_reputation,
            destination_verification,
            destination_label: self.address_book.label(&tx.to).map(str::to_string),
        };

        let outcome = checks::run_checks(&context, &self.thresholds);

        self.metrics.inc_analyses();
        self.metrics.inc_findings(outcome.findings.len() as u64);

        info!(
            "Analyzed {}: {} findings, {} annotations",
            tx.safe_tx_hash,
            outcome.findings.len(),
            outcome.annotations.len()
        );

        AnalysisReport {
            safe,
            transaction: tx.clone(),
            classification,
            annotations: outcome.annotations,
            findings: outcome.findings,
        }
    }

    async fn lookup_reputation(&self, address: Option<Address>) -> Lookup<u32> {
        let address = match address {
            Some(address) => address,
            None => return Lookup::Disabled,
        };
        let source = match &self.reputation {
            Some(source) => source,
            None => return Lookup::Disabled,
        };
        match source.reputation(address).await {
            Ok(score) => Lookup::Value(score),
            Err(e) => {
                warn!("Reputation lookup failed for {}: {}", address, e);
                Lookup::Failed
            }
        }
    }

    async fn lookup_verification(&self, address: Option<Address>) -> Lookup<VerificationInfo> {
        let address = match address {
            Some(address) => address,
            None => return Lookup::Disabled,
        };
        let source = match &self.verification {
            Some(source) => source,
            None => return Lookup::Disabled,
        };
        match source.verification_info(address).await {
            Ok(info) => Lookup::Value(info),
            Err(e) => {
                warn!("Verification lookup failed for {}: {}", address, e);
                Lookup::Failed
            }
        }
    }
}
