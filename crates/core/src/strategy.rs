use crate::record::{TransactionRecord, TransactionStatus};
use serde::{Deserialize, Serialize};

/// One extraction strategy in the cascade. Strategies are tried in this
/// order; each only runs after the previous one has definitively failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Structural,
    AiAssisted,
    RegexFallback,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Structural => "structural",
            Self::AiAssisted => "ai-assisted",
            Self::RegexFallback => "regex-fallback",
        })
    }
}

/// Fields one strategy managed to extract. Merged onto the draft record
/// last-write-wins; `None` leaves the existing value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialRecord {
    pub transaction_id: Option<String>,
    pub sender_name: Option<String>,
    pub sender_bank_name: Option<String>,
    pub sender_account: Option<String>,
    pub sender_phone: Option<String>,
    pub sender_address: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_bank_name: Option<String>,
    pub receiver_account: Option<String>,
    pub status: Option<TransactionStatus>,
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub amount_in_words: Option<String>,
    pub transaction_type: Option<String>,
    pub narrative: Option<String>,
    pub vat_amount: Option<f64>,
    pub service_charge: Option<f64>,
    pub total_amount: Option<f64>,
}

impl PartialRecord {
    /// True when the strategy found nothing worth keeping, i.e. the cascade
    /// should move on to the next strategy.
    pub fn is_empty(&self) -> bool {
        self.sender_name.is_none()
            && self.receiver_name.is_none()
            && self.date.is_none()
            && self.amount.is_none()
            && self.status.is_none()
            && self.sender_account.is_none()
            && self.receiver_account.is_none()
            && self.amount_in_words.is_none()
    }

    /// Merge this partial onto `record`. The transaction id is immutable once
    /// set on the record and is never overwritten.
    pub fn apply_to(&self, record: &mut TransactionRecord) {
        let p = self.clone();
        if record.transaction_id.is_empty() {
            if let Some(id) = p.transaction_id {
                record.transaction_id = id;
            }
        }
        if let Some(v) = p.sender_name {
            record.sender_name = Some(v);
        }
        if let Some(v) = p.sender_bank_name {
            record.sender_bank_name = Some(v);
        }
        if let Some(v) = p.sender_account {
            record.sender_account = Some(v);
        }
        if let Some(v) = p.sender_phone {
            record.sender_phone = Some(v);
        }
        if let Some(v) = p.sender_address {
            record.sender_address = Some(v);
        }
        if let Some(v) = p.receiver_name {
            record.receiver_name = Some(v);
        }
        if let Some(v) = p.receiver_bank_name {
            record.receiver_bank_name = Some(v);
        }
        if let Some(v) = p.receiver_account {
            record.receiver_account = Some(v);
        }
        if let Some(v) = p.status {
            record.status = v;
        }
        if let Some(v) = p.date {
            record.date = Some(v);
        }
        if let Some(v) = p.amount {
            record.amount = v;
        }
        if let Some(v) = p.amount_in_words {
            record.amount_in_words = Some(v);
        }
        if let Some(v) = p.transaction_type {
            record.transaction_type = Some(v);
        }
        if let Some(v) = p.narrative {
            record.narrative = Some(v);
        }
        if let Some(v) = p.vat_amount {
            record.vat_amount = v;
        }
        if let Some(v) = p.service_charge {
            record.service_charge = v;
        }
        if let Some(v) = p.total_amount {
            record.total_amount = v;
        }
    }
}

/// Outcome of one strategy invocation, kept around only long enough to decide
/// whether to cascade and to note what happened in the debug trail.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: Strategy,
    pub result: Result<PartialRecord, String>,
}

impl ExtractionAttempt {
    pub fn succeeded(strategy: Strategy, partial: PartialRecord) -> Self {
        Self {
            strategy,
            result: Ok(partial),
        }
    }

    pub fn missed(strategy: Strategy, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            result: Err(reason.into()),
        }
    }

    /// The partial this attempt produced, unless it missed or came back empty.
    pub fn usable(&self) -> Option<&PartialRecord> {
        match &self.result {
            Ok(partial) if !partial.is_empty() => Some(partial),
            _ => None,
        }
    }

    pub fn debug_note(&self) -> String {
        match &self.result {
            Ok(partial) if !partial.is_empty() => format!("{} extraction succeeded", self.strategy),
            Ok(_) => format!("{} extraction found nothing", self.strategy),
            Err(reason) => format!("{} extraction missed: {}", self.strategy, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_last_write_wins() {
        let mut rec = TransactionRecord::new("T1");
        PartialRecord {
            sender_name: Some("Abebe".into()),
            amount: Some(10.0),
            ..Default::default()
        }
        .apply_to(&mut rec);
        PartialRecord {
            amount: Some(25.5),
            ..Default::default()
        }
        .apply_to(&mut rec);
        assert_eq!(rec.sender_name.as_deref(), Some("Abebe"));
        assert_eq!(rec.amount, 25.5);
    }

    #[test]
    fn transaction_id_is_immutable_once_set() {
        let mut rec = TransactionRecord::new("ORIGINAL");
        PartialRecord {
            transaction_id: Some("REPLACED".into()),
            ..Default::default()
        }
        .apply_to(&mut rec);
        assert_eq!(rec.transaction_id, "ORIGINAL");
    }

    #[test]
    fn empty_partial_cascades() {
        let attempt = ExtractionAttempt::succeeded(Strategy::Structural, PartialRecord::default());
        assert!(attempt.usable().is_none());
        let attempt = ExtractionAttempt::missed(Strategy::AiAssisted, "no JSON in reply");
        assert!(attempt.usable().is_none());
        assert!(attempt.debug_note().contains("no JSON in reply"));
    }
}
