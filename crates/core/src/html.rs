//! Structural extraction over rendered receipt HTML: every table, every row,
//! a two-cell (label, value) schema. The label normalizer decides which
//! canonical field a row feeds; the value canonicalizers clean what it holds.
//! Last write wins when two rows populate the same field.

use crate::canon::{amount_from_words, parse_amount, parse_date, TELEBIRR_DATE_FORMATS};
use crate::labels::{normalize, CanonicalField};
use crate::record::TransactionStatus;
use crate::strategy::PartialRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static TR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static TD_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector"));
static LABEL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("label").expect("label selector"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

// Bilingual receipts sometimes run several label/value pairs together in one
// cell; the Amharic label that follows each English value bounds the capture.
static COMBINED_SENDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Payer Name\s+([^የ]+)").expect("combined sender regex"));
static COMBINED_RECEIVER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Credited Party name\s+([^የ]+)").expect("combined receiver regex"));
static COMBINED_STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"transaction status\s+([^የ]+)").expect("combined status regex"));

static TXID_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").expect("txid date regex"));

fn cell_text(cell: ElementRef) -> String {
    let joined = cell.text().collect::<Vec<_>>().join(" ");
    WS_RE.replace_all(joined.trim(), " ").trim().to_string()
}

/// Feed one (label, value) pair into the draft. Empty values are skipped so a
/// label-only cell never blanks out a field a previous row populated. Also
/// used on API JSON keys, which share the same label vocabulary as the pages.
pub fn apply_labeled_value(label: &str, value: &str, date_formats: &[&str], partial: &mut PartialRecord) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    // Amount spelled in words is recognized by content, not only by label.
    if label.to_lowercase().contains("word") && value.to_lowercase().contains("birr") {
        partial.amount = Some(amount_from_words(value));
        partial.amount_in_words = Some(value.to_string());
        return;
    }
    let Some(field) = normalize(label) else {
        return;
    };
    match field {
        CanonicalField::TransactionId => partial.transaction_id = Some(value.to_string()),
        CanonicalField::SenderName => partial.sender_name = Some(value.to_string()),
        CanonicalField::SenderAccount => partial.sender_account = Some(value.to_string()),
        CanonicalField::SenderPhone => partial.sender_phone = Some(value.to_string()),
        CanonicalField::SenderAddress => partial.sender_address = Some(value.to_string()),
        CanonicalField::ReceiverName => partial.receiver_name = Some(value.to_string()),
        CanonicalField::ReceiverAccount => partial.receiver_account = Some(value.to_string()),
        CanonicalField::Amount => partial.amount = Some(parse_amount(value)),
        CanonicalField::AmountInWords => partial.amount_in_words = Some(value.to_string()),
        CanonicalField::TotalAmount => partial.total_amount = Some(parse_amount(value)),
        CanonicalField::VatAmount => partial.vat_amount = Some(parse_amount(value)),
        CanonicalField::ServiceCharge => partial.service_charge = Some(parse_amount(value)),
        CanonicalField::Date => partial.date = Some(parse_date(value, date_formats)),
        CanonicalField::Status => partial.status = Some(TransactionStatus::from_source(value)),
        CanonicalField::TransactionType => partial.transaction_type = Some(value.to_string()),
        CanonicalField::Narrative => partial.narrative = Some(value.to_string()),
    }
}

fn walk_rows<'a>(
    rows: impl Iterator<Item = ElementRef<'a>>,
    date_formats: &[&str],
    partial: &mut PartialRecord,
) {
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&TD_SEL).collect();
        if cells.len() < 2 {
            continue;
        }
        let label = cell_text(cells[0]);
        let value = cell_text(cells[1]);

        if label.contains("Payer Name") && label.contains("Credited Party") {
            extract_from_combined(&label, partial);
        }
        apply_labeled_value(&label, &value, date_formats, partial);
    }
}

/// Walk every table in the document through the two-cell schema.
pub fn walk_tables(doc: &Html, date_formats: &[&str]) -> PartialRecord {
    let mut partial = PartialRecord::default();
    for table in doc.select(&TABLE_SEL) {
        walk_rows(table.select(&TR_SEL), date_formats, &mut partial);
    }
    partial
}

/// Pull sender/receiver/status out of a single run-on cell that concatenates
/// several labelled sub-phrases.
fn extract_from_combined(combined: &str, partial: &mut PartialRecord) {
    if let Some(caps) = COMBINED_SENDER_RE.captures(combined) {
        partial.sender_name = Some(caps[1].trim().to_string());
    }
    if let Some(caps) = COMBINED_RECEIVER_RE.captures(combined) {
        partial.receiver_name = Some(caps[1].trim().to_string());
    }
    if let Some(caps) = COMBINED_STATUS_RE.captures(combined) {
        partial.status = Some(TransactionStatus::from_source(caps[1].trim()));
    }
}

fn next_td(cell: ElementRef) -> Option<ElementRef> {
    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name().eq_ignore_ascii_case("td"))
}

/// Account-holder names hide inside `<label>` elements whose id carries the
/// reference-number marker; the text is "<number> <holder name>". Every td
/// matching the label fragment is tried because the payer and receiver rows
/// share most of their wording.
fn holder_after_label(doc: &Html, label_fragment: &str, id_fragments: &[&str]) -> Option<String> {
    let needle = label_fragment.to_lowercase();
    for label_td in doc
        .select(&TD_SEL)
        .filter(|td| cell_text(*td).to_lowercase().contains(&needle))
    {
        let Some(value_td) = next_td(label_td) else {
            continue;
        };
        let Some(reference) = value_td.select(&LABEL_SEL).find(|l| {
            l.value()
                .attr("id")
                .map(|id| id_fragments.iter().any(|frag| id.contains(frag)))
                .unwrap_or(false)
        }) else {
            continue;
        };
        let full = cell_text(reference);
        if let Some((_number, holder)) = full.split_once(' ') {
            let holder = holder.trim();
            if !holder.is_empty() {
                return Some(holder.to_string());
            }
        }
    }
    None
}

/// A date sometimes hides in the transaction id itself (`...YYYYMMDD...`).
/// Pure fallback, used only when no date row was found.
pub fn date_from_transaction_id(transaction_id: &str) -> Option<String> {
    let caps = TXID_DATE_RE.captures(transaction_id)?;
    Some(format!("{}-{}-{} 00:00:00", &caps[1], &caps[2], &caps[3]))
}

/// Structural walk of a Telebirr receipt page.
///
/// The "This request is not correct" error document short-circuits into an
/// invalid-id partial: the id itself is wrong, so cascading to another
/// strategy would be pointless.
pub fn telebirr_extract(html: &str, transaction_id: &str) -> PartialRecord {
    let doc = Html::parse_document(html);

    let page_text: String = doc.root_element().text().collect();
    if page_text.contains("This request is not correct") {
        tracing::info!(%transaction_id, "receipt page reports an invalid transaction id");
        return PartialRecord {
            status: Some(TransactionStatus::InvalidTransactionId),
            amount: Some(0.0),
            ..Default::default()
        };
    }

    let mut partial = walk_tables(&doc, TELEBIRR_DATE_FORMATS);

    // An organization payer hides the human sender behind the payer bank
    // reference; the receipt shows "Organization" where the name would be.
    let org_sender = partial
        .sender_name
        .as_deref()
        .map(|s| s.contains("Organization"))
        .unwrap_or(false);
    if org_sender {
        if let Some(holder) = holder_after_label(
            &doc,
            "Payer bank account number",
            &["payer_reference_number", "reference_number"],
        ) {
            partial.sender_name = Some(holder);
        }
    }

    // A receiver-side bank account means the credited party row names the
    // bank, and the account reference names the actual receiver.
    if let Some(holder) = holder_after_label(&doc, "Bank account number", &["paid_reference_number"]) {
        partial.receiver_bank_name = partial.receiver_name.take();
        partial.receiver_name = Some(holder);
    }

    if partial.date.is_none() {
        partial.date = date_from_transaction_id(transaction_id);
    }

    // Telebirr only issues a receipt page for a settled payment, so a parsed
    // receipt with no status row is a completed transaction.
    if !partial.is_empty() && partial.status.is_none() {
        partial.status = Some(TransactionStatus::Completed);
    }

    partial
}

const BOA_HEADER_SELECTORS: &[&str] = &["h1.text-center", "h1", ".receipt-header", ".page-title"];
const BOA_TABLE_SELECTORS: &[&str] = &["table.my-5", "table", ".receipt-table", ".transaction-details"];

/// Structural walk of a BOA slip page. The receipt heading missing is logged
/// and tolerated — partial structural success still yields a record — but a
/// page without a single candidate table has nothing to walk, so the caller
/// must cascade.
pub fn boa_slip_extract(html: &str, date_formats: &[&str]) -> Option<PartialRecord> {
    let doc = Html::parse_document(html);

    let header = BOA_HEADER_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| doc.select(&sel).next().map(cell_text));
    match header {
        Some(text) if text.to_lowercase().contains("receipt") => {}
        other => {
            tracing::warn!(header = ?other, "slip heading missing or unexpected, walking anyway");
        }
    }

    let table = BOA_TABLE_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| doc.select(&sel).next())?;

    let mut partial = PartialRecord::default();
    walk_rows(table.select(&TR_SEL), date_formats, &mut partial);
    Some(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::BOA_DATE_FORMATS;

    const TELEBIRR_RECEIPT: &str = r#"
        <html><body><table>
          <tr><td>የከፋይ ስም/Payer Name</td><td>Abebe Kebede</td></tr>
          <tr><td>የክፍያው ሁኔታ/transaction status</td><td>Completed</td></tr>
          <tr><td>ጠቅላላ የተከፈለ/Total Paid Amount</td><td>500.00 Birr</td></tr>
          <tr><td>የክፍያ ቀን/Payment date</td><td>16-04-2025 12:24:00</td></tr>
          <tr><td>ገንዘብ ተቀባይ/Credited Party name</td><td>Hana Store</td></tr>
        </table></body></html>"#;

    #[test]
    fn telebirr_table_walk_populates_canonical_fields() {
        let partial = telebirr_extract(TELEBIRR_RECEIPT, "CAD1EFGHIJ");
        assert_eq!(partial.sender_name.as_deref(), Some("Abebe Kebede"));
        assert_eq!(partial.receiver_name.as_deref(), Some("Hana Store"));
        assert_eq!(partial.amount, Some(500.0));
        assert_eq!(partial.date.as_deref(), Some("2025-04-16 12:24:00"));
        assert_eq!(partial.status, Some(TransactionStatus::Completed));
    }

    #[test]
    fn parsed_receipt_without_status_row_defaults_to_completed() {
        let html = r#"<html><body><table>
          <tr><td>የከፋይ ስም/Payer Name</td><td>Abebe Kebede</td></tr>
          <tr><td>ጠቅላላ የተከፈለ/Total Paid Amount</td><td>500.00 Birr</td></tr>
        </table></body></html>"#;
        let partial = telebirr_extract(html, "CAD1EFGHIJ");
        assert_eq!(partial.status, Some(TransactionStatus::Completed));

        let empty = telebirr_extract("<html><body></body></html>", "CAD1EFGHIJ");
        assert!(empty.status.is_none());
    }

    #[test]
    fn invalid_request_page_short_circuits() {
        let html = "<html><body><div>This request is not correct</div></body></html>";
        let partial = telebirr_extract(html, "CAD1EFGHIJ");
        assert_eq!(partial.status, Some(TransactionStatus::InvalidTransactionId));
        assert_eq!(partial.amount, Some(0.0));
        assert!(partial.sender_name.is_none());
    }

    #[test]
    fn combined_cell_yields_sender_receiver_and_status() {
        let html = r#"<table><tr>
            <td>የከፋይ ስም Payer Name Abebe Kebede የገንዘብ ተቀባይ Credited Party name Hana Store የክፍያው ሁኔታ transaction status Completed</td>
            <td></td></tr></table>"#;
        let doc = Html::parse_document(html);
        let partial = walk_tables(&doc, TELEBIRR_DATE_FORMATS);
        assert_eq!(partial.sender_name.as_deref(), Some("Abebe Kebede"));
        assert_eq!(partial.receiver_name.as_deref(), Some("Hana Store"));
        assert_eq!(partial.status, Some(TransactionStatus::Completed));
    }

    #[test]
    fn organization_payer_resolves_to_account_holder() {
        let html = r#"<html><body><table>
          <tr><td>የከፋይ ስም/Payer Name</td><td>Some Organization</td></tr>
          <tr><td>የከፋይ የባንክ አካውኣት ቁጥር/Payer bank account number</td>
              <td><label id="payer_reference_number_1">100012345 Abebe Kebede</label></td></tr>
        </table></body></html>"#;
        let partial = telebirr_extract(html, "CAD1EFGHIJ");
        assert_eq!(partial.sender_name.as_deref(), Some("Abebe Kebede"));
    }

    #[test]
    fn receiver_bank_account_swaps_name_and_bank() {
        let html = r#"<html><body><table>
          <tr><td>ገንዘብ ተቀባይ/Credited Party name</td><td>Awash Bank</td></tr>
          <tr><td>የባንክ አካውኣት ቁጥር/Bank account number</td>
              <td><label id="paid_reference_number">200045678 Hana Tesfaye</label></td></tr>
        </table></body></html>"#;
        let partial = telebirr_extract(html, "CAD1EFGHIJ");
        assert_eq!(partial.receiver_bank_name.as_deref(), Some("Awash Bank"));
        assert_eq!(partial.receiver_name.as_deref(), Some("Hana Tesfaye"));
    }

    #[test]
    fn date_falls_back_to_digits_in_transaction_id() {
        let html = "<html><body><table><tr><td>Payer Name</td><td>A B</td></tr></table></body></html>";
        let partial = telebirr_extract(html, "TX20250416AB");
        assert_eq!(partial.date.as_deref(), Some("2025-04-16 00:00:00"));
    }

    #[test]
    fn boa_slip_walk_reads_the_main_table() {
        let html = r#"<html><body>
          <h1 class="text-center">Transaction Receipt</h1>
          <table class="my-5">
            <tr><td>Source Account Name</td><td>Abebe Kebede</td></tr>
            <tr><td>Receiver's Name</td><td>Hana Trading</td></tr>
            <tr><td>Transferred Amount</td><td>1,234.50 ETB</td></tr>
            <tr><td>Transaction Date</td><td>01/09/25 14:30</td></tr>
            <tr><td>Transaction Reference</td><td>FT25188TN19J</td></tr>
          </table></body></html>"#;
        let partial = boa_slip_extract(html, BOA_DATE_FORMATS).expect("table present");
        assert_eq!(partial.sender_name.as_deref(), Some("Abebe Kebede"));
        assert_eq!(partial.receiver_name.as_deref(), Some("Hana Trading"));
        assert_eq!(partial.amount, Some(1234.5));
        assert_eq!(partial.date.as_deref(), Some("2025-09-01 14:30:00"));
        assert_eq!(partial.transaction_id.as_deref(), Some("FT25188TN19J"));
    }

    #[test]
    fn boa_slip_without_heading_still_walks() {
        let html = r#"<table><tr><td>Amount</td><td>90 ETB</td></tr></table>"#;
        let partial = boa_slip_extract(html, BOA_DATE_FORMATS).expect("table present");
        assert_eq!(partial.amount, Some(90.0));
    }

    #[test]
    fn boa_slip_without_any_table_cascades() {
        assert!(boa_slip_extract("<html><body><p>nothing</p></body></html>", BOA_DATE_FORMATS).is_none());
    }

    #[test]
    fn amount_in_words_row_is_converted() {
        let html = r#"<table><tr><td>Amount in Word</td><td>twenty-two birr and zero cent</td></tr></table>"#;
        let doc = Html::parse_document(html);
        let partial = walk_tables(&doc, TELEBIRR_DATE_FORMATS);
        assert_eq!(partial.amount, Some(22.0));
        assert_eq!(
            partial.amount_in_words.as_deref(),
            Some("twenty-two birr and zero cent")
        );
    }
}
