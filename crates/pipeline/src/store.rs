//! Sled-backed history of finished verifications plus the JSONL audit
//! trail. Write-only from the engine's point of view: nothing downstream
//! reads it back into a verification decision.

use crate::audit::{write_audit_event, AuditEvent};
use crate::retry::RetryOutcome;
use anyhow::Result;
use chrono::{DateTime, Utc};
use payverify_core::gate::BankKind;
use payverify_core::TransactionRecord;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::{Path, PathBuf};

/// How the transaction id reached the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Reference,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVerification {
    pub request_id: String,
    pub bank: BankKind,
    pub evidence: EvidenceKind,
    pub outcome: RetryOutcome,
    pub attempts: usize,
    pub created_at: DateTime<Utc>,
    pub record: TransactionRecord,
}

pub struct VerificationStore {
    db: Db,
    audit_path: PathBuf,
}

impl VerificationStore {
    pub fn open(db_path: impl AsRef<Path>, audit_path: impl Into<PathBuf>) -> Result<Self> {
        let db = sled::open(db_path)?;
        Ok(Self {
            db,
            audit_path: audit_path.into(),
        })
    }

    fn verifications_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree("verifications")?)
    }

    fn generate_request_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect()
    }

    /// Persist one finished verification and write its audit line. Returns
    /// the request id assigned to it.
    pub fn save(
        &self,
        bank: BankKind,
        evidence: EvidenceKind,
        outcome: RetryOutcome,
        attempts: usize,
        record: &TransactionRecord,
    ) -> Result<String> {
        let request_id = Self::generate_request_id();
        let stored = StoredVerification {
            request_id: request_id.clone(),
            bank,
            evidence,
            outcome,
            attempts,
            created_at: Utc::now(),
            record: record.clone(),
        };

        let tree = self.verifications_tree()?;
        tree.insert(request_id.as_bytes(), serde_json::to_vec(&stored)?)?;

        let mut event = AuditEvent::new(
            "verification_recorded",
            &request_id,
            bank.name(),
            &record.transaction_id,
            record.status.as_str(),
        )
        .with_attempts(attempts);
        if !record.status.is_success() && !record.debug_info.is_empty() {
            event = event.with_error(record.debug_info.clone());
        }
        if let Err(err) = write_audit_event(&self.audit_path, &event) {
            tracing::warn!(error = %err, "failed to write audit event");
        }

        Ok(request_id)
    }

    /// All stored verifications, newest first.
    pub fn list(&self) -> Result<Vec<StoredVerification>> {
        let tree = self.verifications_tree()?;
        let mut out = Vec::new();
        for item in tree.iter() {
            let (_k, v) = item?;
            let stored: StoredVerification = serde_json::from_slice(&v)?;
            out.push(stored);
        }
        out.sort_by_key(|s| s.created_at);
        out.reverse();
        Ok(out)
    }
}
