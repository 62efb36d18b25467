use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One line in the append-only audit trail. Every verification leaves a
/// trace regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event_type: String,
    pub request_id: String,
    pub bank: String,
    pub transaction_id: String,
    pub status: String,
    pub attempts: Option<usize>,
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: &str, request_id: &str, bank: &str, transaction_id: &str, status: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event_type: event_type.to_string(),
            request_id: request_id.to_string(),
            bank: bank.to_string(),
            transaction_id: transaction_id.to_string(),
            status: status.to_string(),
            attempts: None,
            error: None,
        }
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

pub fn default_audit_log_path() -> PathBuf {
    PathBuf::from("audit.jsonl")
}

pub fn write_audit_event(path: &Path, event: &AuditEvent) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{}", json)?;
    tracing::debug!(event_type = %event.event_type, request_id = %event.request_id, "audit event written");
    Ok(())
}
