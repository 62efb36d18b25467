pub mod audit;
pub mod image_flow;
pub mod retry;
pub mod store;

pub use image_flow::ImageVerifier;
pub use retry::{verify_with_retry, RetryOutcome, RetryReport};
pub use store::{EvidenceKind, StoredVerification, VerificationStore};
