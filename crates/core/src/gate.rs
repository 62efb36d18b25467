//! Validity gates applied to OCR/QR-derived ids before any bank pipeline is
//! invoked. A gate miss short-circuits to "manual entry required" without
//! spending a network round trip on an id that cannot possibly verify.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder words an OCR model emits when it fails to find an id.
const PLACEHOLDER_WORDS: &[&str] = &["NOT", "NO", "NONE", "NULL", "ERROR", "FAIL", "FAILED"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankKind {
    Cbe,
    Boa,
    Telebirr,
}

impl BankKind {
    pub fn expected_id_len(&self) -> usize {
        match self {
            Self::Cbe | Self::Boa => 12,
            Self::Telebirr => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cbe => "CBE",
            Self::Boa => "BOA",
            Self::Telebirr => "Telebirr",
        }
    }
}

impl std::fmt::Display for BankKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("expected {expected} characters for {bank}, got {actual}")]
    WrongLength {
        bank: BankKind,
        expected: usize,
        actual: usize,
    },
    #[error("id contains non-alphanumeric characters")]
    NonAlphanumeric,
    #[error("id is a placeholder word, not a transaction id")]
    PlaceholderWord,
}

/// Check an extracted id against the bank's known id shape.
pub fn validate_extracted_id(id: &str, bank: BankKind) -> Result<(), GateRejection> {
    let id = id.trim();
    if PLACEHOLDER_WORDS
        .iter()
        .any(|w| id.eq_ignore_ascii_case(w))
    {
        return Err(GateRejection::PlaceholderWord);
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) || id.is_empty() {
        return Err(GateRejection::NonAlphanumeric);
    }
    let expected = bank.expected_id_len();
    if id.len() != expected {
        return Err(GateRejection::WrongLength {
            bank,
            expected,
            actual: id.len(),
        });
    }
    Ok(())
}
