use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Terminal classification of a verification attempt. This reflects what the
/// source document (or the failure mode) said, not an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Unknown,
    /// The bank reports the payment as settled ("SUCCESS" / "Completed").
    Completed,
    Failed,
    InvalidTransactionId,
    ManualEntryRequired,
    ServiceUnavailable,
    /// Verbatim status text from a source document that maps to none of the
    /// known outcomes.
    Other(String),
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::InvalidTransactionId => "Invalid Transaction ID",
            Self::ManualEntryRequired => "Manual Entry Required",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::Other(s) => s,
        }
    }

    /// Map a status string as found in a receipt or API reply. Unrecognized
    /// text is carried verbatim rather than discarded.
    pub fn from_source(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "" | "UNKNOWN" => Self::Unknown,
            "SUCCESS" | "SUCCESSFUL" | "COMPLETED" => Self::Completed,
            "FAILED" | "FAIL" => Self::Failed,
            "INVALID TRANSACTION ID" => Self::InvalidTransactionId,
            "MANUAL ENTRY REQUIRED" => Self::ManualEntryRequired,
            "SERVICE UNAVAILABLE" => Self::ServiceUnavailable,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("empty status"));
        }
        Ok(Self::from_source(&raw))
    }
}

/// Canonical transaction record produced by every bank pipeline.
///
/// Every pipeline returns a fully populated record no matter which extraction
/// strategy succeeded or whether all of them failed; absent fields default to
/// `None` / `0.0` / `Unknown` instead of being omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub sender_name: Option<String>,
    pub sender_bank_name: Option<String>,
    pub sender_account: Option<String>,
    pub sender_phone: Option<String>,
    pub sender_address: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_bank_name: Option<String>,
    pub receiver_account: Option<String>,
    pub status: TransactionStatus,
    pub date: Option<String>,
    pub amount: f64,
    pub amount_in_words: Option<String>,
    pub transaction_type: Option<String>,
    pub narrative: Option<String>,
    pub vat_amount: f64,
    pub service_charge: f64,
    pub total_amount: f64,
    /// Free-text diagnostic trail, appended to as extraction proceeds.
    /// Always populated on failure.
    pub debug_info: String,
}

impl TransactionRecord {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sender_name: None,
            sender_bank_name: None,
            sender_account: None,
            sender_phone: None,
            sender_address: None,
            receiver_name: None,
            receiver_bank_name: None,
            receiver_account: None,
            status: TransactionStatus::Unknown,
            date: None,
            amount: 0.0,
            amount_in_words: None,
            transaction_type: None,
            narrative: None,
            vat_amount: 0.0,
            service_charge: 0.0,
            total_amount: 0.0,
            debug_info: String::new(),
        }
    }

    /// Append a diagnostic note to the record's trail.
    pub fn push_debug(&mut self, note: impl AsRef<str>) {
        if !self.debug_info.is_empty() {
            self.debug_info.push_str("; ");
        }
        self.debug_info.push_str(note.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_success_and_completed_to_one_variant() {
        assert_eq!(
            TransactionStatus::from_source("SUCCESS"),
            TransactionStatus::Completed
        );
        assert_eq!(
            TransactionStatus::from_source("Completed"),
            TransactionStatus::Completed
        );
        assert!(TransactionStatus::from_source("success").is_success());
    }

    #[test]
    fn status_carries_unmapped_text_verbatim() {
        let status = TransactionStatus::from_source("Reversed by branch");
        assert_eq!(status, TransactionStatus::Other("Reversed by branch".into()));
        assert!(!status.is_success());
    }

    #[test]
    fn fresh_record_has_defaults_not_holes() {
        let rec = TransactionRecord::new("FT25188TN19J");
        let json = serde_json::to_value(&rec).expect("serialize record");
        assert_eq!(json["sender_name"], serde_json::Value::Null);
        assert_eq!(json["amount"], 0.0);
        assert_eq!(json["status"], "UNKNOWN");
    }

    #[test]
    fn push_debug_joins_notes() {
        let mut rec = TransactionRecord::new("T1");
        rec.push_debug("first");
        rec.push_debug("second");
        assert_eq!(rec.debug_info, "first; second");
    }

    #[test]
    fn status_round_trips_through_serde() {
        let rec = TransactionRecord::new("T1");
        let json = serde_json::to_string(&rec).expect("serialize");
        let back: TransactionRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.status, TransactionStatus::Unknown);
    }
}
