//! Audit trail for analysis samples.

use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct AuditEnvelope<'a, T: Serialize> {
    recorded_at: String,
    sample: &'a T,
}

/// Append one sample to a JSONL audit file, stamped with the wall-clock
/// time of recording.
///
/// # Arguments
/// * `path` - Path to the audit file; `None` disables audit output
/// * `sample` - Serializable payload to append
pub fn write_audit_sample<P: AsRef<Path>, T: Serialize>(
    path: Option<P>,
    sample: &T,
) -> anyhow::Result<()> {
    if let Some(audit_path) = path {
        let envelope = AuditEnvelope {
            recorded_at: Utc::now().to_rfc3339(),
            sample,
        };
        let json = serde_json::to_string(&envelope)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&audit_path)?;
        writeln!(file, "{}", json)?;
        debug!("Appended audit sample to {:?}", audit_path.as_ref());
    }
    Ok(())
}
