use anyhow::Result;
use async_trait::async_trait;
use payverify_core::gate::BankKind;
use payverify_core::TransactionRecord;

/// One bank's verification pipeline. `verify` never fails: every outcome,
/// including an unreachable bank, comes back as a fully-populated record
/// whose status and debug trail say what happened.
///
/// `secondary_key` is the bank-specific disambiguator (CBE: payer account
/// number, BOA: last five digits of the payer account, Telebirr: unused).
#[async_trait]
pub trait BankVerifier: Send + Sync {
    fn bank(&self) -> BankKind;
    async fn verify(&self, transaction_id: &str, secondary_key: Option<&str>) -> TransactionRecord;
}

/// Decodes a QR code out of raw image bytes, yielding its text payload.
/// `Ok(None)` means the image simply has no readable QR code.
#[async_trait]
pub trait QrDecoder: Send + Sync {
    async fn decode(&self, image: &[u8]) -> Result<Option<String>>;
}

/// Reads a transaction id off a receipt photo or screenshot.
/// `Ok(None)` means the extractor ran but found no id in the image.
#[async_trait]
pub trait OcrIdExtractor: Send + Sync {
    async fn extract_transaction_id(&self, image: &[u8]) -> Result<Option<String>>;
}

pub mod boa;
pub mod cbe;
pub mod gemini;
pub mod mock;
pub mod qr_image;
pub mod telebirr;
