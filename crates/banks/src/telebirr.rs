//! Telebirr pipeline: the operator publishes each receipt as a public HTML
//! page keyed by transaction id alone. All extraction is structural.

use crate::BankVerifier;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use payverify_core::gate::BankKind;
use payverify_core::html::telebirr_extract;
use payverify_core::{TransactionRecord, TransactionStatus};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://transactioninfo.ethiotelecom.et/receipt/";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct TelebirrVerifier {
    base_url: String,
    http: reqwest::Client,
}

impl TelebirrVerifier {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build Telebirr HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    async fn fetch_receipt(&self, transaction_id: &str) -> Result<String> {
        if transaction_id.is_empty() {
            bail!("transaction id is required");
        }
        let url = format!("{}{}", self.base_url, transaction_id);
        // The receipt host serves an empty shell to clients it does not
        // recognize as a desktop browser.
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("failed to fetch receipt page")?;
        if !resp.status().is_success() {
            bail!("receipt page fetch returned {}", resp.status());
        }
        let html = resp.text().await.context("failed to read receipt page body")?;
        tracing::info!(size = html.len(), "downloaded receipt page");
        Ok(html)
    }
}

#[async_trait]
impl BankVerifier for TelebirrVerifier {
    fn bank(&self) -> BankKind {
        BankKind::Telebirr
    }

    async fn verify(&self, transaction_id: &str, _secondary_key: Option<&str>) -> TransactionRecord {
        let mut record = TransactionRecord::new(transaction_id);

        match self.fetch_receipt(transaction_id).await {
            Ok(html) => {
                let partial = telebirr_extract(&html, transaction_id);
                if partial.is_empty() {
                    record.status = TransactionStatus::Failed;
                    record.push_debug("Error: no recognizable receipt fields on the page");
                } else {
                    record.push_debug("structural extraction succeeded");
                    partial.apply_to(&mut record);
                }
                tracing::info!(%transaction_id, status = %record.status, "processed Telebirr transaction");
            }
            Err(err) => {
                tracing::error!(%transaction_id, error = %format!("{err:#}"), "Telebirr verification failed");
                record.status = TransactionStatus::Failed;
                record.push_debug(format!("Error: {err:#}"));
            }
        }
        record
    }
}
