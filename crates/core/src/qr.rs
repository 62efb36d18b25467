//! Tiered pattern matching over a decoded QR payload. The most specific
//! pattern wins; later tiers are not attempted once one matches. No match
//! signals the caller to fall back to OCR.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub transaction_id: String,
    pub account_number: Option<String>,
}

// Tier 1: id=<ALNUM><8 digits> carries both the transaction id and the
// trailing account digits in one parameter.
static ID_WITH_ACCOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)id=([A-Z0-9]+)(\d{8})").expect("qr id+account regex"));
// Tier 2: id=<ALNUM> alone.
static ID_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)id=([A-Z0-9]+)").expect("qr id regex"));
// Tier 3: the whole payload is a bare transaction id.
static BARE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9]{10,15})$").expect("qr bare id regex"));

pub fn parse_qr_payload(qr_text: &str) -> Option<QrPayload> {
    if let Some(caps) = ID_WITH_ACCOUNT_RE.captures(qr_text) {
        return Some(QrPayload {
            transaction_id: caps[1].to_uppercase(),
            account_number: Some(caps[2].to_string()),
        });
    }
    if let Some(caps) = ID_ONLY_RE.captures(qr_text) {
        return Some(QrPayload {
            transaction_id: caps[1].to_uppercase(),
            account_number: None,
        });
    }
    if let Some(caps) = BARE_ID_RE.captures(qr_text.trim()) {
        return Some(QrPayload {
            transaction_id: caps[1].to_uppercase(),
            account_number: None,
        });
    }
    tracing::warn!(payload = %qr_text, "no known pattern in QR payload");
    None
}
