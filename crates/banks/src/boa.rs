//! Bank of Abyssinia pipeline. The slip service keys a transaction by id
//! plus the last five digits of the payer's account. Primary source is the
//! JSON slip API; when that misses, the rendered slip page is walked
//! structurally.

use crate::BankVerifier;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use payverify_core::canon::BOA_DATE_FORMATS;
use payverify_core::gate::BankKind;
use payverify_core::html::{apply_labeled_value, boa_slip_extract};
use payverify_core::{PartialRecord, TransactionRecord, TransactionStatus};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://cs.bankofabyssinia.com/api/onlineSlip/getDetails/";
pub const DEFAULT_SLIP_URL: &str = "https://cs.bankofabyssinia.com/slip/";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct BoaVerifier {
    api_url: String,
    slip_url: String,
    http: reqwest::Client,
}

impl BoaVerifier {
    pub fn new(api_url: impl Into<String>, slip_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(true)
            .build()
            .context("failed to build BOA HTTP client")?;
        Ok(Self {
            api_url: api_url.into(),
            slip_url: slip_url.into(),
            http,
        })
    }

    /// The slip API refuses requests that do not look like the browser page,
    /// hence the full header set.
    async fn fetch_api(&self, lookup_key: &str) -> Result<PartialRecord> {
        let url = format!("{}?id={}", self.api_url, lookup_key);
        tracing::info!(%url, "calling slip API");

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::REFERER, "https://cs.bankofabyssinia.com/slip/")
            .header(reqwest::header::ORIGIN, "https://cs.bankofabyssinia.com")
            .send()
            .await
            .context("slip API request failed")?;
        if !resp.status().is_success() {
            bail!("slip API returned {}", resp.status());
        }
        let data: Value = resp.json().await.context("slip API reply is not JSON")?;

        if data["header"]["status"].as_str() != Some("success") {
            bail!("slip API returned unsuccessful status");
        }
        let Some(transaction) = data["body"].as_array().and_then(|b| b.first()) else {
            bail!("no transaction data in slip API response");
        };
        let Some(fields) = transaction.as_object() else {
            bail!("slip API transaction entry is not an object");
        };

        // API keys share the receipt-page label vocabulary.
        let mut partial = PartialRecord::default();
        for (key, value) in fields {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            apply_labeled_value(key, &text, BOA_DATE_FORMATS, &mut partial);
        }
        if partial.status.is_none() {
            partial.status = Some(TransactionStatus::Completed);
        }
        Ok(partial)
    }

    async fn fetch_slip_page(&self, lookup_key: &str) -> Result<PartialRecord> {
        let url = format!("{}?trx={}", self.slip_url, lookup_key);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("slip page request failed")?;
        if !resp.status().is_success() {
            bail!("slip page returned {}", resp.status());
        }
        let html = resp.text().await.context("failed to read slip page body")?;
        boa_slip_extract(&html, BOA_DATE_FORMATS)
            .context("slip page has no transaction table to walk")
    }

    async fn verify_inner(
        &self,
        transaction_id: &str,
        account_suffix: &str,
        record: &mut TransactionRecord,
    ) -> Result<()> {
        if account_suffix.len() < 5 {
            bail!("sender account suffix must have at least 5 digits");
        }
        let lookup_key = format!("{transaction_id}{account_suffix}");

        let partial = match self.fetch_api(&lookup_key).await {
            Ok(partial) => {
                record.push_debug("slip API lookup succeeded");
                partial
            }
            Err(api_err) => {
                tracing::warn!(error = %format!("{api_err:#}"), "slip API missed, walking slip page");
                record.push_debug(format!("slip API missed: {api_err:#}"));
                let partial = self.fetch_slip_page(&lookup_key).await?;
                record.push_debug("slip page walk succeeded");
                partial
            }
        };
        partial.apply_to(record);
        Ok(())
    }
}

#[async_trait]
impl BankVerifier for BoaVerifier {
    fn bank(&self) -> BankKind {
        BankKind::Boa
    }

    async fn verify(&self, transaction_id: &str, secondary_key: Option<&str>) -> TransactionRecord {
        let mut record = TransactionRecord::new(transaction_id);
        record.sender_bank_name = Some("Bank of Abyssinia".to_string());

        let account_suffix = secondary_key.unwrap_or_default();
        match self.verify_inner(transaction_id, account_suffix, &mut record).await {
            Ok(()) => {
                tracing::info!(%transaction_id, status = %record.status, "processed BOA transaction");
            }
            Err(err) => {
                tracing::error!(%transaction_id, error = %format!("{err:#}"), "BOA verification failed");
                record.status = TransactionStatus::Failed;
                record.push_debug(format!("Error: {err:#}"));
            }
        }
        record
    }
}
