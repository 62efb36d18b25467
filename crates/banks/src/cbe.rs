//! Commercial Bank of Ethiopia pipeline: the bank publishes each receipt as
//! a PDF keyed by transaction id plus the last eight digits of the payer's
//! account. Text comes out of the PDF, fields come out of the text via the
//! AI-assisted extractor with the regex fallback behind it.

use crate::gemini::GeminiClient;
use crate::BankVerifier;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use payverify_core::canon::{parse_date, CBE_DATE_FORMATS};
use payverify_core::fallback::extract_basic;
use payverify_core::gate::BankKind;
use payverify_core::{ExtractionAttempt, Strategy, TransactionRecord, TransactionStatus};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://apps.cbe.com.et:100/";

pub struct CbeVerifier {
    base_url: String,
    http: reqwest::Client,
    gemini: Arc<GeminiClient>,
}

impl CbeVerifier {
    pub fn new(base_url: impl Into<String>, gemini: Arc<GeminiClient>) -> Result<Self> {
        // The receipt host serves a certificate reqwest rejects, and the PDF
        // endpoint is slow enough to need a generous timeout.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .danger_accept_invalid_certs(true)
            .build()
            .context("failed to build CBE HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            http,
            gemini,
        })
    }

    async fn fetch_receipt_text(&self, transaction_id: &str, account_number: &str) -> Result<String> {
        if account_number.len() < 8 || !account_number.chars().all(|c| c.is_ascii_digit()) {
            bail!("account number must be at least 8 digits to construct the receipt link");
        }
        let last8 = &account_number[account_number.len() - 8..];
        let url = format!("{}?id={}{}", self.base_url, transaction_id, last8);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("failed to fetch receipt PDF")?;
        if !resp.status().is_success() {
            bail!("receipt PDF fetch returned {}", resp.status());
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/pdf") {
            bail!("response is not a PDF, content-type: {content_type}");
        }
        let bytes = resp.bytes().await.context("failed to read receipt PDF body")?;
        if bytes.is_empty() {
            bail!("receipt PDF is empty");
        }
        tracing::info!(size = bytes.len(), "downloaded receipt PDF");

        let text =
            pdf_extract::extract_text_from_mem(&bytes).context("failed to extract text from PDF")?;
        if text.trim().is_empty() {
            bail!("no text could be extracted from the PDF");
        }
        Ok(text)
    }

    async fn extract(&self, text: &str, record: &mut TransactionRecord) {
        let ai_attempt = if self.gemini.is_configured() {
            match self.gemini.extract_fields(text).await {
                Ok(partial) => ExtractionAttempt::succeeded(Strategy::AiAssisted, partial),
                Err(err) => ExtractionAttempt::missed(Strategy::AiAssisted, format!("{err:#}")),
            }
        } else {
            ExtractionAttempt::missed(Strategy::AiAssisted, "no API key configured")
        };
        record.push_debug(ai_attempt.debug_note());

        let mut partial = match ai_attempt.usable() {
            Some(partial) => partial.clone(),
            None => {
                let fallback = ExtractionAttempt::succeeded(Strategy::RegexFallback, extract_basic(text));
                record.push_debug(fallback.debug_note());
                fallback.usable().cloned().unwrap_or_default()
            }
        };
        if let Some(date) = partial.date.take() {
            partial.date = Some(parse_date(&date, CBE_DATE_FORMATS));
        }
        partial.apply_to(record);
    }
}

#[async_trait]
impl BankVerifier for CbeVerifier {
    fn bank(&self) -> BankKind {
        BankKind::Cbe
    }

    async fn verify(&self, transaction_id: &str, secondary_key: Option<&str>) -> TransactionRecord {
        let mut record = TransactionRecord::new(transaction_id);
        record.sender_bank_name = Some("Commercial Bank of Ethiopia".to_string());

        let account_number = secondary_key.unwrap_or_default();
        match self.fetch_receipt_text(transaction_id, account_number).await {
            Ok(text) => {
                self.extract(&text, &mut record).await;
                tracing::info!(%transaction_id, status = %record.status, "processed CBE transaction");
            }
            Err(err) => {
                tracing::error!(%transaction_id, error = %format!("{err:#}"), "CBE verification failed");
                record.status = TransactionStatus::ServiceUnavailable;
                record.push_debug(format!(
                    "CBE verification service is temporarily unavailable: {err:#}"
                ));
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> CbeVerifier {
        let gemini = Arc::new(GeminiClient::new(None).expect("gemini client"));
        CbeVerifier::new(DEFAULT_BASE_URL, gemini).expect("cbe verifier")
    }

    #[tokio::test]
    async fn non_digit_account_is_rejected_without_a_lookup() {
        let record = verifier().verify("FT25188TN19J", Some("ኣኣኣ")).await;
        assert_eq!(record.status, TransactionStatus::ServiceUnavailable);
        assert!(record.debug_info.contains("at least 8 digits"));
    }

    #[tokio::test]
    async fn short_account_is_rejected_without_a_lookup() {
        let record = verifier().verify("FT25188TN19J", Some("1234567")).await;
        assert_eq!(record.status, TransactionStatus::ServiceUnavailable);
        assert!(record.debug_info.contains("at least 8 digits"));
    }
}
