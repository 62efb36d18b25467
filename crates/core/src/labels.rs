/// Canonical field keys the label normalizer maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    TransactionId,
    SenderName,
    SenderAccount,
    SenderPhone,
    SenderAddress,
    ReceiverName,
    ReceiverAccount,
    AmountInWords,
    TotalAmount,
    VatAmount,
    ServiceCharge,
    Amount,
    Date,
    Status,
    TransactionType,
    Narrative,
}

/// Synonym table, keyed by canonical field. Matching is substring-based
/// because bilingual receipts sometimes interleave label and value without a
/// clean delimiter, so an exact-equality lookup would miss them.
///
/// Order matters twice over: more specific labels ("amount in words",
/// "total amount") must be checked before the generic ones they contain,
/// and short synonyms like "to" would otherwise swallow "total amount".
const SYNONYMS: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::TransactionId,
        &[
            "transaction reference",
            "transaction id",
            "invoice no",
            "reference no",
            "receipt no",
            "reference",
        ],
    ),
    (
        CanonicalField::AmountInWords,
        &["transferred amount in word", "amount in words"],
    ),
    (
        CanonicalField::TotalAmount,
        &["total amount including vat", "total amount"],
    ),
    (CanonicalField::VatAmount, &["vat (15%)", "vat amount", "vat"]),
    (CanonicalField::ServiceCharge, &["service charge", "fee"]),
    (
        CanonicalField::SenderAccount,
        &[
            "source account number",
            "sender account",
            "from account",
            "payer's account",
            "payer account",
            "payer bank account",
        ],
    ),
    (
        CanonicalField::ReceiverAccount,
        &[
            "receiver account number",
            "receiver account",
            "beneficiary account",
            "to account",
            "receiver's account",
            "bank account number",
        ],
    ),
    (
        CanonicalField::SenderName,
        &[
            "source account name",
            "sender name",
            "payer's name",
            "payer name",
            "payer",
            "sender",
            "from",
            "ከፋይ",
        ],
    ),
    (
        CanonicalField::ReceiverName,
        &[
            "receiver's name",
            "receiver name",
            "beneficiary name",
            "credited party",
            "credited",
            "receiver",
            "ተቀባይ",
        ],
    ),
    (
        CanonicalField::Amount,
        &[
            "transferred amount",
            "transaction amount",
            "amount",
            "total",
            "ጠቅላላ",
            "የተከፈለ",
        ],
    ),
    (
        CanonicalField::Date,
        &[
            "transaction date",
            "transfer date",
            "date",
            "time",
            "ቀን",
        ],
    ),
    (
        CanonicalField::Status,
        &["transaction status", "status", "ሁኔታ"],
    ),
    (CanonicalField::SenderPhone, &["tel.", "phone", "telephone"]),
    (CanonicalField::SenderAddress, &["address"]),
    (CanonicalField::TransactionType, &["transaction type", "type"]),
    (CanonicalField::Narrative, &["narrative", "description"]),
    // "to" last: it is a substring of too many other labels.
    (CanonicalField::ReceiverName, &["to"]),
];

/// Map a raw label from a receipt (table cell text, API key, ...) to its
/// canonical field. Unmapped labels yield `None`, which callers ignore.
pub fn normalize(raw_label: &str) -> Option<CanonicalField> {
    let label = raw_label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    for (field, synonyms) in SYNONYMS {
        for synonym in *synonyms {
            if label.contains(synonym) {
                return Some(*field);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_synonyms_converge() {
        for label in ["Source Account Name", "sender name", "From", "ከፋይ"] {
            assert_eq!(
                normalize(label),
                Some(CanonicalField::SenderName),
                "label {label:?}"
            );
        }
    }

    #[test]
    fn unrelated_label_is_ignored() {
        assert_eq!(normalize("Branch Manager Signature"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn specific_labels_win_over_embedded_generic_ones() {
        assert_eq!(
            normalize("Total amount including VAT"),
            Some(CanonicalField::TotalAmount)
        );
        assert_eq!(
            normalize("Transferred Amount in Word"),
            Some(CanonicalField::AmountInWords)
        );
        assert_eq!(
            normalize("Source Account Number"),
            Some(CanonicalField::SenderAccount)
        );
        // Plain "Total" still lands on the amount, not on "to"/receiver.
        assert_eq!(normalize("Total"), Some(CanonicalField::Amount));
    }

    #[test]
    fn mixed_script_labels_match_by_substring() {
        assert_eq!(
            normalize("የተከፈለው ጠቅላላ መጠን/Total Paid Amount"),
            Some(CanonicalField::Amount)
        );
        assert_eq!(
            normalize("የክፍያ ቀን/Payment Date"),
            Some(CanonicalField::Date)
        );
    }

    #[test]
    fn status_and_reference_labels() {
        assert_eq!(
            normalize("transaction status"),
            Some(CanonicalField::Status)
        );
        assert_eq!(
            normalize("Transaction Reference"),
            Some(CanonicalField::TransactionId)
        );
        assert_eq!(normalize("VAT (15%)"), Some(CanonicalField::VatAmount));
    }
}
