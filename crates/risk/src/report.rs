//! Rendering of analysis reports.

use safewatch_types::AnalysisReport;

/// Render a report into its fixed-section text form.
///
/// Sections always appear in the same order, and the risk section is never
/// omitted: an empty finding list renders the explicit no-risk sentence, so
/// "no risk found" stays distinguishable from "analysis failed silently".
pub fn format(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let tx = &report.transaction;

    out.push_str(&format!(
        "Analysis of pending transaction {} for Safe {}\n\n",
        tx.safe_tx_hash, report.safe
    ));

    out.push_str(&format!(
        "Proposed by {} on {}\n",
        tx.proposer,
        tx.submission_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Confirmations: {}/{}",
        tx.confirmations.len(),
        tx.confirmations_required
    ));
    if tx.confirmations.is_empty() {
        out.push_str(" (none yet)\n\n");
    } else {
        let confirmed: Vec<String> = tx
            .confirmations
            .iter()
            .map(|c| c.owner.to_string())
            .collect();
        out.push_str(&format!(" (confirmed by {})\n\n", confirmed.join(", ")));
    }

    out.push_str(&format!("Action: {}\n", report.classification.describe()));
    for note in &report.annotations {
        out.push_str(&format!("  note: {}\n", note));
    }
    out.push('\n');

    if report.findings.is_empty() {
        out.push_str("No significant risk factors were identified.\n");
    } else {
        out.push_str("Risk factors:\n");
        for finding in &report.findings {
            out.push_str(&format!(
                "  - [{}] {}\n",
                finding.severity.as_str(),
                finding.message
            ));
        }
    }

    out
}
