//! Operator CLI for the Safe pending-transaction risk analysis service.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use clap::{Args, Parser, Subcommand};
use tokio::time::sleep;
use tracing::{error, info, warn};

use safewatch_chain::{ChainReader, HttpChainReader};
use safewatch_risk::{decoder, report, RiskEngine};
use safewatch_services::{
    AddressBook, EtherscanVerificationService, HttpReputationService, HttpTransactionService,
    PendingTransactionDirectory, SafeStateSource,
};
use safewatch_telemetry::{audit, init_logging, Metrics};

#[derive(Parser)]
#[command(name = "safewatch")]
#[command(about = "Risk analysis for pending Safe multisig transactions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServiceArgs {
    /// Ethereum execution RPC URL
    #[arg(long, default_value = "https://eth.llamarpc.com")]
    rpc_url: String,

    /// Safe transaction service base URL
    #[arg(long, default_value = "https://safe-transaction-mainnet.safe.global")]
    tx_service_url: String,

    /// Reputation service base URL; reputation checks are disabled when unset
    #[arg(long)]
    reputation_url: Option<String>,

    /// Reputation service API key
    #[arg(long)]
    reputation_api_key: Option<String>,

    /// Block explorer API base URL
    #[arg(long, default_value = "https://api.etherscan.io")]
    explorer_url: String,

    /// Block explorer API key; verification checks are disabled when unset
    #[arg(long)]
    explorer_api_key: Option<String>,

    /// Known-address CSV file with address,label records
    #[arg(long)]
    address_book: Option<String>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one pending transaction
    Analyze {
        #[command(flatten)]
        services: ServiceArgs,

        /// Safe address
        #[arg(long)]
        safe: String,

        /// Safe transaction hash to analyze
        #[arg(long)]
        tx_hash: String,
    },
    /// List a Safe's pending queue
    Pending {
        #[command(flatten)]
        services: ServiceArgs,

        /// Safe address
        #[arg(long)]
        safe: String,
    },
    /// Continuously analyze new pending transactions
    Watch {
        #[command(flatten)]
        services: ServiceArgs,

        /// Safe address
        #[arg(long)]
        safe: String,

        /// Poll interval in seconds
        #[arg(long, default_value = "30")]
        poll_interval_seconds: u64,

        /// Metrics bind address
        #[arg(long, default_value = "0.0.0.0:9090")]
        metrics_bind_address: String,

        /// Audit sample output path (JSONL)
        #[arg(long)]
        sample_output_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            services,
            safe,
            tx_hash,
        } => {
            init_logging(services.log_level.as_deref())?;
            run_analyze(&services, &safe, &tx_hash).await?;
        }
        Commands::Pending { services, safe } => {
            init_logging(services.log_level.as_deref())?;
            run_pending(&services, &safe).await?;
        }
        Commands::Watch {
            services,
            safe,
            poll_interval_seconds,
            metrics_bind_address,
            sample_output_path,
        } => {
            init_logging(services.log_level.as_deref())?;
            run_watch(
                &services,
                &safe,
                poll_interval_seconds,
                &metrics_bind_address,
                sample_output_path,
            )
            .await?;
        }
    }

    Ok(())
}

async fn build_engine(args: &ServiceArgs, metrics: &Metrics) -> anyhow::Result<RiskEngine> {
    let tx_service = Arc::new(HttpTransactionService::new(
        &args.tx_service_url,
        metrics.clone(),
    )?);
    let chain = Arc::new(HttpChainReader::new(&args.rpc_url, metrics.clone())?);

    match chain.get_chain_id().await {
        Ok(chain_id) => info!("Connected to chain id {}", chain_id),
        Err(e) => warn!("Could not read chain id: {}", e),
    }

    let mut engine = RiskEngine::new(tx_service.clone(), tx_service, chain, metrics.clone());

    if let Some(url) = &args.reputation_url {
        let api_key = args.reputation_api_key.clone().unwrap_or_default();
        engine = engine.with_reputation(Arc::new(HttpReputationService::new(
            url,
            &api_key,
            metrics.clone(),
        )?));
    } else {
        info!("No reputation service configured; reputation checks disabled");
    }

    if let Some(api_key) = &args.explorer_api_key {
        engine = engine.with_verification(Arc::new(EtherscanVerificationService::new(
            &args.explorer_url,
            api_key,
            metrics.clone(),
        )?));
    } else {
        info!("No explorer API key configured; verification checks disabled");
    }

    if let Some(path) = &args.address_book {
        engine = engine.with_address_book(AddressBook::from_csv(path)?);
    }

    Ok(engine)
}

async fn run_analyze(services: &ServiceArgs, safe: &str, tx_hash: &str) -> anyhow::Result<()> {
    let safe: Address = safe.parse()?;
    let tx_hash: B256 = tx_hash.parse()?;

    let metrics = Metrics::new()?;
    let engine = build_engine(services, &metrics).await?;

    match engine.analyze(safe, tx_hash).await {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            // Single-line operator-facing message, never a raw error chain.
            println!("Analyze transaction: Error analyzing transaction: {}", e);
        }
    }

    Ok(())
}

async fn run_pending(services: &ServiceArgs, safe: &str) -> anyhow::Result<()> {
    let safe: Address = safe.parse()?;

    let metrics = Metrics::new()?;
    let tx_service = HttpTransactionService::new(&services.tx_service_url, metrics.clone())?;

    let owners = tx_service.owners(safe).await?;
    let threshold = tx_service.threshold(safe).await?;
    let page = tx_service.pending_transactions(safe).await?;

    println!(
        "Safe {} ({} owners, threshold {})",
        safe,
        owners.len(),
        threshold
    );
    println!("{} pending transaction(s)", page.count);
    for tx in &page.results {
        let action = decoder::classify(tx);
        println!(
            "  {}  {}/{}  {}",
            tx.safe_tx_hash,
            tx.confirmations.len(),
            tx.confirmations_required,
            action.describe()
        );
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct AuditSample {
    safe_tx_hash: String,
    action: String,
    finding_count: usize,
    severities: Vec<String>,
}

async fn run_watch(
    services: &ServiceArgs,
    safe: &str,
    poll_interval_seconds: u64,
    metrics_bind_address: &str,
    sample_output_path: Option<String>,
) -> anyhow::Result<()> {
    let safe: Address = safe.parse()?;

    info!("Starting safewatch watch loop for {}", safe);

    let metrics = Metrics::new()?;
    let directory = Arc::new(HttpTransactionService::new(
        &services.tx_service_url,
        metrics.clone(),
    )?);
    let engine = build_engine(services, &metrics).await?;

    start_metrics_server(metrics_bind_address, metrics.clone()).await?;

    let poll_duration = Duration::from_secs(poll_interval_seconds);
    let mut seen: HashSet<B256> = HashSet::new();

    loop {
        match directory.pending_transactions(safe).await {
            Ok(page) => {
                for tx in page.results {
                    if !seen.insert(tx.safe_tx_hash) {
                        continue;
                    }
                    metrics.inc_pending_seen(1);

                    let analysis = engine.analyze_transaction(safe, &tx).await;
                    println!("{}", report::format(&analysis));

                    let sample = AuditSample {
                        safe_tx_hash: analysis.transaction.safe_tx_hash.to_string(),
                        action: analysis.classification.describe(),
                        finding_count: analysis.findings.len(),
                        severities: analysis
                            .findings
                            .iter()
                            .map(|f| f.severity.as_str().to_string())
                            .collect(),
                    };
                    if let Err(e) =
                        audit::write_audit_sample(sample_output_path.as_deref(), &sample)
                    {
                        warn!("Failed to write audit sample: {}", e);
                    }
                }
            }
            Err(e) => {
                error!("Failed to fetch pending transactions for {}: {}", safe, e);
            }
        }

        sleep(poll_duration).await;
    }
}

async fn start_metrics_server(addr: &str, metrics: Metrics) -> anyhow::Result<()> {
    use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};

    let metrics = Arc::new(metrics);

    async fn metrics_handler(
        State(metrics): State<Arc<Metrics>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match metrics.gather() {
            Ok(body) => Ok((StatusCode::OK, body)),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics server listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}
