//! Gemini text-understanding client: structured field extraction from
//! receipt text and transaction-id OCR from receipt images.

use crate::OcrIdExtractor;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::Lazy;
use payverify_core::canon::parse_amount;
use payverify_core::{PartialRecord, TransactionStatus};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const FIELDS_PROMPT: &str = "Extract the following information from this bank transaction text. \
Return ONLY a JSON object with these exact fields: sender_name, receiver_name, receiver_bank_name, \
status, date, amount. If any field is not found, use null. For date, use ISO format (YYYY-MM-DD). \
For amount, use numeric value only. For status, use: SUCCESS, FAILED, PENDING, or UNKNOWN.";

const OCR_PROMPT: &str = "Analyze this bank transaction receipt image.\n\
Your task is to extract only the **Transaction ID**. Look for labels like \"Invoice No.\", \
\"Reference No.\", \"Transaction Ref\", \"Receipt No.\", \"VAT Receipt No.\". This is typically \
an alphanumeric string, often 10-15 characters long. If it's part of a URL, extract only the ID part.\n\n\
Output the Transaction ID clearly labeled.\n\
If the Transaction ID is not found, state \"Transaction ID: Not Found\".\n\n\
Example Output:\nTransaction ID: FT25188TN19J";

static TRANSACTION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Transaction ID:\s*([A-Z0-9]+)").expect("transaction id regex"));

/// Thin client over the `generateContent` endpoint. Constructed once and
/// shared; a missing API key is a legitimate state in which every call
/// reports itself unconfigured so callers can skip the strategy.
pub struct GeminiClient {
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST a `generateContent` payload and pull the model's free-text reply
    /// out of the first candidate.
    async fn generate(&self, payload: Value) -> Result<String> {
        let Some(key) = &self.api_key else {
            bail!("no Gemini API key configured");
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", key)
            .json(&payload)
            .send()
            .await
            .context("Gemini request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Gemini API returned {status}: {body}");
        }
        let reply: Value = resp.json().await.context("Gemini reply is not JSON")?;
        reply["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .context("unexpected Gemini reply shape")
    }

    /// Ask the model for the canonical receipt fields in strict JSON. Errors
    /// when the reply holds no parseable JSON object, which cascades the
    /// caller onto the regex fallback.
    pub async fn extract_fields(&self, text: &str) -> Result<PartialRecord> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": format!("{FIELDS_PROMPT}\n\nText: {text}") }] }]
        });
        let reply = self.generate(payload).await?;
        let object = isolate_json_object(&reply)
            .with_context(|| format!("no JSON object in Gemini reply: {reply}"))?;
        let fields: ReplyFields =
            serde_json::from_str(object).context("Gemini reply JSON has an unexpected shape")?;
        tracing::debug!(?fields, "Gemini field extraction parsed");
        Ok(fields.into_partial())
    }
}

#[async_trait]
impl OcrIdExtractor for GeminiClient {
    async fn extract_transaction_id(&self, image: &[u8]) -> Result<Option<String>> {
        let payload = json!({
            "contents": [{
                "parts": [
                    { "text": OCR_PROMPT },
                    { "inlineData": { "mimeType": "image/png", "data": BASE64.encode(image) } }
                ]
            }],
            "generationConfig": { "temperature": 0.1 }
        });
        let reply = self.generate(payload).await?;
        match TRANSACTION_ID_RE.captures(&reply) {
            Some(caps) => {
                let id = caps[1].trim().to_uppercase();
                if id == "NOT" {
                    // "Transaction ID: Not Found" matches the pattern too.
                    return Ok(None);
                }
                tracing::info!(%id, "transaction id read from image");
                Ok(Some(id))
            }
            None => {
                tracing::warn!(%reply, "no transaction id in OCR reply");
                Ok(None)
            }
        }
    }
}

/// The field object the prompt asks for. Amount arrives as a number or a
/// string depending on the model's mood.
#[derive(Debug, Deserialize)]
struct ReplyFields {
    sender_name: Option<String>,
    receiver_name: Option<String>,
    receiver_bank_name: Option<String>,
    status: Option<String>,
    date: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
}

impl ReplyFields {
    fn into_partial(self) -> PartialRecord {
        let amount = self.amount.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => Some(parse_amount(&s)),
            _ => None,
        });
        PartialRecord {
            sender_name: self.sender_name,
            receiver_name: self.receiver_name,
            receiver_bank_name: self.receiver_bank_name,
            status: self.status.map(|s| TransactionStatus::from_source(&s)),
            date: self.date,
            amount,
            ..Default::default()
        }
    }
}

/// Slice out the first balanced `{...}` object from a free-text reply. The
/// model wraps its JSON in prose or code fences often enough that plain
/// parsing would miss it.
pub fn isolate_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let mut depth = 0usize;
    for (i, c) in reply[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&reply[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
