//! Ordered risk checks evaluated against a fully gathered context.
//!
//! Check order is fixed and part of the contract: for the same transaction
//! and the same external answers, the finding list (and therefore the
//! report text) is identical across runs.

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;

use safewatch_services::VerificationInfo;
use safewatch_types::{ActionClassification, PendingTransaction, RiskFinding};

/// Outcome of one external lookup.
///
/// A failed or disabled lookup silently skips its check instead of guessing;
/// the variants stay distinct so a future report format can surface the
/// difference between "passed" and "could not be performed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Value(T),
    Failed,
    Disabled,
}

impl<T> Lookup<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Lookup::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// What kind of account the destination address is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    Contract,
    ExternallyOwned,
    /// Code lookup failed; both the contract-only and the EOA-only check
    /// families are skipped rather than guessed.
    Unknown,
}

/// Tunable decision boundaries, carried as named fields rather than
/// scattered literals. The defaults are the reference values.
#[derive(Debug, Clone)]
pub struct RiskThresholds {
    /// A transfer above this share of the Safe balance, in basis points,
    /// is flagged. Strictly greater than: exactly 50.00% does not fire.
    pub high_value_bps: u64,
    /// Reputation scores strictly below this floor are flagged.
    pub low_reputation_score: u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_value_bps: 5_000,
            low_reputation_score: 20,
        }
    }
}

/// Everything the checks may consult, gathered before evaluation starts.
/// No check issues I/O of its own.
pub struct RiskContext<'a> {
    pub tx: &'a PendingTransaction,
    pub classification: &'a ActionClassification,
    pub owners: Lookup<Vec<Address>>,
    pub safe_balance: Lookup<U256>,
    pub destination: DestinationKind,
    pub new_owner_reputation: Lookup<u32>,
    pub destination_reputation: Lookup<u32>,
    pub destination_verification: Lookup<VerificationInfo>,
    pub destination_label: Option<String>,
}

/// Findings plus favorable annotations accumulated by the checks.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    pub findings: Vec<RiskFinding>,
    pub annotations: Vec<String>,
}

/// Run every check in its fixed order.
pub fn run_checks(ctx: &RiskContext<'_>, thresholds: &RiskThresholds) -> CheckOutcome {
    let mut outcome = CheckOutcome::default();

    check_configuration_change(ctx, &mut outcome);
    check_new_owner_reputation(ctx, thresholds, &mut outcome);
    check_high_value_transfer(ctx, thresholds, &mut outcome);
    check_contract_destination(ctx, &mut outcome);
    check_eoa_destination(ctx, thresholds, &mut outcome);
    check_verification(ctx, &mut outcome);
    check_known_destination(ctx, &mut outcome);

    outcome
}

/// Ownership and threshold changes are always flagged, whatever else the
/// transaction does.
fn check_configuration_change(ctx: &RiskContext<'_>, outcome: &mut CheckOutcome) {
    match ctx.classification {
        ActionClassification::AddOwner { .. }
        | ActionClassification::RemoveOwner { .. }
        | ActionClassification::ChangeThreshold { .. } => {
            outcome.findings.push(RiskFinding::warning(
                "Transaction modifies the Safe's owner set or confirmation threshold".to_string(),
            ));
        }
        ActionClassification::EnableModule { module } => {
            outcome.findings.push(RiskFinding::warning(format!(
                "Transaction enables module {} which can spend without the confirmation threshold",
                module
            )));
        }
        _ => {}
    }
}

fn check_new_owner_reputation(
    ctx: &RiskContext<'_>,
    thresholds: &RiskThresholds,
    outcome: &mut CheckOutcome,
) {
    let address = match ctx.classification {
        ActionClassification::AddOwner { address, .. } => address,
        _ => return,
    };

    match &ctx.new_owner_reputation {
        Lookup::Value(score) if *score < thresholds.low_reputation_score => {
            outcome.findings.push(RiskFinding::warning(format!(
                "Proposed owner {} has a low reputation score of {}",
                address, score
            )));
        }
        Lookup::Value(score) => {
            outcome.annotations.push(format!(
                "proposed owner {} has a reputation score of {}",
                address, score
            ));
        }
        Lookup::Failed | Lookup::Disabled => {}
    }
}

fn check_high_value_transfer(
    ctx: &RiskContext<'_>,
    thresholds: &RiskThresholds,
    outcome: &mut CheckOutcome,
) {
    if ctx.tx.value.is_zero() {
        return;
    }
    let balance = match ctx.safe_balance.value() {
        Some(balance) => *balance,
        None => return,
    };

    let scale = U256::from(10_000u64);
    let scaled_value = ctx.tx.value.saturating_mul(scale);
    let threshold = balance.saturating_mul(U256::from(thresholds.high_value_bps));
    if scaled_value <= threshold {
        return;
    }

    if balance.is_zero() {
        outcome.findings.push(RiskFinding::warning(format!(
            "Transfer of {} wei exceeds the Safe's entire balance",
            ctx.tx.value
        )));
        return;
    }

    let bps = u64::try_from(scaled_value / balance).unwrap_or(u64::MAX);
    let percent = (Decimal::from(bps) / Decimal::from(100u64)).normalize();
    outcome.findings.push(RiskFinding::warning(format!(
        "Transfer of {} wei is {}% of the Safe's current balance",
        ctx.tx.value, percent
    )));
}

fn check_contract_destination(ctx: &RiskContext<'_>, outcome: &mut CheckOutcome) {
    if ctx.destination != DestinationKind::Contract {
        return;
    }

    // An ERC20 transfer whose destination is the token contract itself:
    // tokens sent to their own contract are unrecoverable.
    if let ActionClassification::TokenTransfer { destination, .. } = ctx.classification {
        if ctx.tx.data_decoded.is_some() && *destination == ctx.tx.to {
            outcome.findings.push(RiskFinding::critical(format!(
                "ERC20 transfer sends tokens to the token contract itself ({}); funds will likely be lost",
                ctx.tx.to
            )));
        }
    }

    // Plain value send to a contract with no selector at all.
    if ctx.tx.value > U256::ZERO && ctx.tx.has_empty_data() {
        outcome.findings.push(RiskFinding::critical(format!(
            "Direct transfer of {} wei to contract {} without a function call; funds may be lost",
            ctx.tx.value, ctx.tx.to
        )));
    }
}

fn check_eoa_destination(
    ctx: &RiskContext<'_>,
    thresholds: &RiskThresholds,
    outcome: &mut CheckOutcome,
) {
    if ctx.destination != DestinationKind::ExternallyOwned {
        return;
    }
    // Only transfers warrant scrutiny of the recipient; a zero-value call
    // to an EOA moves nothing.
    if ctx.tx.value.is_zero() {
        return;
    }

    match &ctx.owners {
        Lookup::Value(owners) if owners.contains(&ctx.tx.to) => {
            outcome
                .annotations
                .push(format!("{} is an owner of this Safe", ctx.tx.to));
        }
        Lookup::Value(_) => {
            outcome.findings.push(RiskFinding::warning(format!(
                "Transfer address {} is not an owner of this Safe",
                ctx.tx.to
            )));
        }
        Lookup::Failed | Lookup::Disabled => {}
    }

    // Reputation runs independently of the owner check.
    match &ctx.destination_reputation {
        Lookup::Value(score) if *score < thresholds.low_reputation_score => {
            outcome.findings.push(RiskFinding::warning(format!(
                "Destination {} has a low reputation score of {}",
                ctx.tx.to, score
            )));
        }
        Lookup::Value(score) => {
            outcome.annotations.push(format!(
                "destination {} has a reputation score of {}",
                ctx.tx.to, score
            ));
        }
        Lookup::Failed | Lookup::Disabled => {}
    }
}

fn check_verification(ctx: &RiskContext<'_>, outcome: &mut CheckOutcome) {
    if ctx.destination != DestinationKind::Contract {
        return;
    }

    match &ctx.destination_verification {
        Lookup::Value(info) if !info.verified => {
            outcome.findings.push(RiskFinding::warning(format!(
                "Destination contract {} has no verified source code",
                ctx.tx.to
            )));
        }
        Lookup::Value(info) => match &info.name {
            Some(name) => outcome.annotations.push(format!(
                "destination contract {} is verified as \"{}\"",
                ctx.tx.to, name
            )),
            None => outcome.annotations.push(format!(
                "destination contract {} has verified source code",
                ctx.tx.to
            )),
        },
        // Absence of information is not itself risk.
        Lookup::Failed | Lookup::Disabled => {}
    }
}

fn check_known_destination(ctx: &RiskContext<'_>, outcome: &mut CheckOutcome) {
    if let Some(label) = &ctx.destination_label {
        outcome.annotations.push(format!(
            "destination {} is known locally as \"{}\"",
            ctx.tx.to, label
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use safewatch_types::Severity;

    fn create_test_tx(value: U256, data: Option<&str>) -> PendingTransaction {
        PendingTransaction {
            safe_tx_hash: Default::default(),
            to: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                .parse()
                .unwrap(),
            value,
            data: data.map(|d| d.parse().unwrap()),
            data_decoded: None,
            proposer: Address::ZERO,
            submission_date: "2024-03-01T12:00:00Z".parse().unwrap(),
            confirmations: vec![],
            confirmations_required: 2,
        }
    }

    fn base_context<'a>(
        tx: &'a PendingTransaction,
        classification: &'a ActionClassification,
    ) -> RiskContext<'a> {
        RiskContext {
            tx,
            classification,
            owners: Lookup::Disabled,
            safe_balance: Lookup::Disabled,
            destination: DestinationKind::Unknown,
            new_owner_reputation: Lookup::Disabled,
            destination_reputation: Lookup::Disabled,
            destination_verification: Lookup::Disabled,
            destination_label: None,
        }
    }

    #[test]
    fn configuration_change_fires_exactly_once() {
        let tx = create_test_tx(U256::ZERO, Some("0xdeadbeef"));
        let classification = ActionClassification::ChangeThreshold { new_threshold: 3 };
        let ctx = base_context(&tx, &classification);

        let outcome = run_checks(&ctx, &RiskThresholds::default());
        let config_findings = outcome
            .findings
            .iter()
            .filter(|f| f.message.contains("owner set or confirmation threshold"))
            .count();
        assert_eq!(config_findings, 1);
    }

    #[test]
    fn half_of_balance_does_not_fire_but_just_over_does() {
        let thresholds = RiskThresholds::default();
        let classification = ActionClassification::TokenTransfer {
            destination: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                .parse()
                .unwrap(),
            amount: U256::from(5_000u64),
        };

        // Exactly 50.00% of balance: no finding.
        let tx = create_test_tx(U256::from(5_000u64), Some("0x"));
        let mut ctx = base_context(&tx, &classification);
        ctx.safe_balance = Lookup::Value(U256::from(10_000u64));
        let outcome = run_checks(&ctx, &thresholds);
        assert!(outcome.findings.is_empty());

        // 50.01%: fires.
        let tx = create_test_tx(U256::from(5_001u64), Some("0x"));
        let mut ctx = base_context(&tx, &classification);
        ctx.safe_balance = Lookup::Value(U256::from(10_000u64));
        let outcome = run_checks(&ctx, &thresholds);
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.findings[0].message.contains("50.01%"));
    }

    #[test]
    fn balance_lookup_failure_skips_the_value_check() {
        let classification = ActionClassification::TokenTransfer {
            destination: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                .parse()
                .unwrap(),
            amount: U256::from(9_999u64),
        };
        let tx = create_test_tx(U256::from(9_999u64), Some("0x"));
        let mut ctx = base_context(&tx, &classification);
        ctx.safe_balance = Lookup::Failed;

        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn erc20_self_transfer_is_critical() {
        let mut tx = create_test_tx(U256::ZERO, Some("0xa9059cbb"));
        tx.data_decoded = Some(safewatch_types::DecodedCall {
            method: "transfer".to_string(),
            parameters: vec![],
        });
        let classification = ActionClassification::TokenTransfer {
            destination: tx.to,
            amount: U256::from(500u64),
        };
        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::Contract;

        let outcome = run_checks(&ctx, &RiskThresholds::default());
        let criticals: Vec<_> = outcome
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .collect();
        assert_eq!(criticals.len(), 1);
        assert!(criticals[0].message.contains("token contract itself"));
    }

    #[test]
    fn plain_value_send_to_contract_is_critical() {
        let tx = create_test_tx(U256::from(1_000u64), Some("0x"));
        let classification = ActionClassification::TokenTransfer {
            destination: tx.to,
            amount: tx.value,
        };
        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::Contract;

        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome
            .findings
            .iter()
            .any(|f| f.severity == Severity::Critical && f.message.contains("without a function call")));
    }

    #[test]
    fn transfer_to_non_owner_eoa_warns_and_owner_is_favorable() {
        let owner: Address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
            .parse()
            .unwrap();
        let classification = ActionClassification::TokenTransfer {
            destination: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                .parse()
                .unwrap(),
            amount: U256::from(1u64),
        };

        let tx = create_test_tx(U256::from(1u64), Some("0x"));
        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::ExternallyOwned;
        ctx.owners = Lookup::Value(vec![owner]);
        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome
            .findings
            .iter()
            .any(|f| f.message.contains("not an owner")));

        let mut tx = create_test_tx(U256::from(1u64), Some("0x"));
        tx.to = owner;
        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::ExternallyOwned;
        ctx.owners = Lookup::Value(vec![owner]);
        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome.findings.is_empty());
        assert!(outcome
            .annotations
            .iter()
            .any(|a| a.contains("is an owner of this Safe")));
    }

    #[test]
    fn zero_value_call_to_eoa_yields_nothing() {
        let tx = create_test_tx(U256::ZERO, None);
        let classification = ActionClassification::GenericCall {
            method: None,
            destination: tx.to,
            parameter_count: 0,
        };
        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::ExternallyOwned;
        ctx.owners = Lookup::Value(vec![]);
        ctx.destination_reputation = Lookup::Value(80);

        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn unknown_destination_skips_both_families() {
        let tx = create_test_tx(U256::from(1_000u64), Some("0x"));
        let classification = ActionClassification::TokenTransfer {
            destination: tx.to,
            amount: tx.value,
        };
        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::Unknown;
        ctx.owners = Lookup::Value(vec![]);
        ctx.destination_verification = Lookup::Value(VerificationInfo {
            verified: false,
            name: None,
            abi: None,
        });

        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn unverified_contract_warns_and_verified_name_is_favorable() {
        let tx = create_test_tx(U256::ZERO, Some("0xdeadbeef"));
        let classification = ActionClassification::GenericCall {
            method: Some("deposit".to_string()),
            destination: tx.to,
            parameter_count: 0,
        };

        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::Contract;
        ctx.destination_verification = Lookup::Value(VerificationInfo {
            verified: false,
            name: None,
            abi: None,
        });
        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome
            .findings
            .iter()
            .any(|f| f.message.contains("no verified source code")));

        let mut ctx = base_context(&tx, &classification);
        ctx.destination = DestinationKind::Contract;
        ctx.destination_verification = Lookup::Value(VerificationInfo {
            verified: true,
            name: Some("WETH9".to_string()),
            abi: None,
        });
        let outcome = run_checks(&ctx, &RiskThresholds::default());
        assert!(outcome.findings.is_empty());
        assert!(outcome.annotations.iter().any(|a| a.contains("WETH9")));
    }
}
