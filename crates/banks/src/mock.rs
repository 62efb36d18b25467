//! In-process stand-ins for the bank, QR and OCR adapters, used by the
//! pipeline tests.

use crate::{BankVerifier, OcrIdExtractor, QrDecoder};
use anyhow::Result;
use async_trait::async_trait;
use payverify_core::gate::BankKind;
use payverify_core::{TransactionRecord, TransactionStatus};
use std::collections::HashSet;
use std::sync::Mutex;

/// Verifier that succeeds for a fixed set of ids and records every id it was
/// asked about, in order.
pub struct MockVerifier {
    bank: BankKind,
    succeed_for: HashSet<String>,
    succeed_all: bool,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockVerifier {
    pub fn new(bank: BankKind, succeed_for: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            bank,
            succeed_for: succeed_for.into_iter().map(Into::into).collect(),
            succeed_all: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Verifier that reports every id as settled; backs the `mock` provider
    /// kind so the CLI can be exercised without network access.
    pub fn new_succeeding(bank: BankKind) -> Self {
        Self {
            bank,
            succeed_for: HashSet::new(),
            succeed_all: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Ids this verifier was asked about, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Secondary keys seen per call, in call order.
    pub fn secondary_keys(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .iter()
            .map(|(_, key)| key.clone())
            .collect()
    }
}

#[async_trait]
impl BankVerifier for MockVerifier {
    fn bank(&self) -> BankKind {
        self.bank
    }

    async fn verify(&self, transaction_id: &str, secondary_key: Option<&str>) -> TransactionRecord {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push((transaction_id.to_string(), secondary_key.map(str::to_string)));

        let mut record = TransactionRecord::new(transaction_id);
        if self.succeed_all || self.succeed_for.contains(transaction_id) {
            record.status = TransactionStatus::Completed;
            record.sender_name = Some("Abebe Kebede".to_string());
            record.amount = 500.0;
        } else {
            record.status = TransactionStatus::Failed;
            record.push_debug("Error: transaction not found");
        }
        record
    }
}

/// QR decoder returning a canned payload.
#[derive(Default)]
pub struct MockQrDecoder {
    pub payload: Option<String>,
}

#[async_trait]
impl QrDecoder for MockQrDecoder {
    async fn decode(&self, _image: &[u8]) -> Result<Option<String>> {
        Ok(self.payload.clone())
    }
}

/// OCR extractor returning a canned transaction id.
#[derive(Default)]
pub struct MockOcr {
    pub transaction_id: Option<String>,
}

#[async_trait]
impl OcrIdExtractor for MockOcr {
    async fn extract_transaction_id(&self, _image: &[u8]) -> Result<Option<String>> {
        Ok(self.transaction_id.clone())
    }
}
