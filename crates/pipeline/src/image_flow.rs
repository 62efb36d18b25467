//! Image-evidence flow: QR decode first, OCR second, validity gate, then
//! bank dispatch. Telebirr lookups go through the retry orchestrator since
//! OCR-read Telebirr ids are the ones that confuse `0` and `O`.

use crate::retry::{verify_with_retry, RetryOutcome, RetryReport};
use banks::{BankVerifier, OcrIdExtractor, QrDecoder};
use payverify_core::gate::{validate_extracted_id, BankKind};
use payverify_core::qr::parse_qr_payload;
use payverify_core::{TransactionRecord, TransactionStatus};
use std::sync::Arc;

pub struct ImageVerifier {
    qr: Arc<dyn QrDecoder>,
    ocr: Arc<dyn OcrIdExtractor>,
    max_ambiguous_positions: usize,
}

impl ImageVerifier {
    pub fn new(
        qr: Arc<dyn QrDecoder>,
        ocr: Arc<dyn OcrIdExtractor>,
        max_ambiguous_positions: usize,
    ) -> Self {
        Self {
            qr,
            ocr,
            max_ambiguous_positions,
        }
    }

    /// Pull a transaction id out of the image, preferring the QR code. Also
    /// yields the account number when the QR payload carries one.
    async fn read_id(&self, image: &[u8]) -> (Option<String>, Option<String>) {
        match self.qr.decode(image).await {
            Ok(Some(text)) => {
                if let Some(payload) = parse_qr_payload(&text) {
                    tracing::info!(id = %payload.transaction_id, "transaction id read from QR code");
                    return (Some(payload.transaction_id), payload.account_number);
                }
                tracing::info!(%text, "QR payload did not parse, falling back to OCR");
            }
            Ok(None) => tracing::debug!("no QR code in image, falling back to OCR"),
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "QR decode failed, falling back to OCR"),
        }

        match self.ocr.extract_transaction_id(image).await {
            Ok(id) => (id, None),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "OCR extraction failed");
                (None, None)
            }
        }
    }

    /// Verify a payment from image evidence alone.
    ///
    /// `account_number` is the caller-supplied CBE account; an account found
    /// in the QR payload wins over it. An unreadable or gate-rejected id
    /// yields a `ManualEntryRequired` record without touching any bank, with
    /// an attempt count of zero. Otherwise the report carries the real
    /// number of bank lookups, retry loop included.
    pub async fn verify_image(
        &self,
        verifier: &dyn BankVerifier,
        image: &[u8],
        account_number: Option<&str>,
    ) -> RetryReport {
        let bank = verifier.bank();
        let (extracted_id, qr_account) = self.read_id(image).await;

        let Some(transaction_id) = extracted_id else {
            let mut record = TransactionRecord::new("");
            record.status = TransactionStatus::ManualEntryRequired;
            record.push_debug("no transaction id could be read from the image");
            return RetryReport {
                outcome: RetryOutcome::Failed,
                attempts: 0,
                record,
            };
        };

        if let Err(rejection) = validate_extracted_id(&transaction_id, bank) {
            tracing::info!(%transaction_id, %bank, %rejection, "extracted id rejected by validity gate");
            let mut record = TransactionRecord::new(transaction_id);
            record.status = TransactionStatus::ManualEntryRequired;
            record.push_debug(format!("extracted id failed the {bank} check: {rejection}"));
            return RetryReport {
                outcome: RetryOutcome::Failed,
                attempts: 0,
                record,
            };
        }

        let secondary = match bank {
            BankKind::Cbe => qr_account.or_else(|| account_number.map(str::to_string)),
            _ => account_number.map(str::to_string),
        };
        let secondary = secondary.as_deref();

        match bank {
            BankKind::Telebirr => {
                verify_with_retry(
                    verifier,
                    &transaction_id,
                    secondary,
                    self.max_ambiguous_positions,
                )
                .await
            }
            _ => {
                let record = verifier.verify(&transaction_id, secondary).await;
                let outcome = if record.status.is_success() {
                    RetryOutcome::Verified
                } else {
                    RetryOutcome::Failed
                };
                RetryReport {
                    outcome,
                    attempts: 1,
                    record,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banks::mock::{MockOcr, MockQrDecoder, MockVerifier};

    fn image_verifier(qr: Option<&str>, ocr: Option<&str>) -> ImageVerifier {
        ImageVerifier::new(
            Arc::new(MockQrDecoder {
                payload: qr.map(str::to_string),
            }),
            Arc::new(MockOcr {
                transaction_id: ocr.map(str::to_string),
            }),
            10,
        )
    }

    #[tokio::test]
    async fn qr_supplied_account_wins_over_the_caller_one() {
        let flow = image_verifier(Some("id=FT25188TN19J87654321"), None);
        let bank = MockVerifier::new(BankKind::Cbe, ["FT25188TN19J"]);
        let report = flow.verify_image(&bank, b"png", Some("11111111")).await;
        assert_eq!(report.record.status, TransactionStatus::Completed);
        assert_eq!(bank.secondary_keys(), vec![Some("87654321".to_string())]);
    }

    #[tokio::test]
    async fn ocr_backs_up_a_missing_qr_code() {
        let flow = image_verifier(None, Some("FT25188TN19J"));
        let bank = MockVerifier::new(BankKind::Cbe, ["FT25188TN19J"]);
        let report = flow.verify_image(&bank, b"png", Some("11111111")).await;
        assert_eq!(report.outcome, RetryOutcome::Verified);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.record.status, TransactionStatus::Completed);
        assert_eq!(bank.secondary_keys(), vec![Some("11111111".to_string())]);
    }

    #[tokio::test]
    async fn short_id_never_reaches_the_bank() {
        let flow = image_verifier(None, Some("FT25188TN19"));
        let bank = MockVerifier::new(BankKind::Cbe, ["FT25188TN19J"]);
        let report = flow.verify_image(&bank, b"png", None).await;
        assert_eq!(report.record.status, TransactionStatus::ManualEntryRequired);
        assert_eq!(report.attempts, 0);
        assert!(report.record.debug_info.contains("CBE"));
        assert!(bank.calls().is_empty());
    }

    #[tokio::test]
    async fn unreadable_image_asks_for_manual_entry() {
        let flow = image_verifier(None, None);
        let bank = MockVerifier::new(BankKind::Boa, Vec::<String>::new());
        let report = flow.verify_image(&bank, b"png", None).await;
        assert_eq!(report.record.status, TransactionStatus::ManualEntryRequired);
        assert_eq!(report.attempts, 0);
        assert!(!report.record.debug_info.is_empty());
        assert!(bank.calls().is_empty());
    }

    #[tokio::test]
    async fn telebirr_image_lookup_retries_substitutions() {
        let flow = image_verifier(None, Some("CAD0EFGHIJ"));
        let bank = MockVerifier::new(BankKind::Telebirr, ["CADOEFGHIJ"]);
        let report = flow.verify_image(&bank, b"png", None).await;
        assert_eq!(report.outcome, RetryOutcome::Verified);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.record.status, TransactionStatus::Completed);
        assert_eq!(bank.calls(), vec!["CAD0EFGHIJ", "CADOEFGHIJ"]);
    }
}
