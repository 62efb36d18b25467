pub mod candidates;
pub mod canon;
pub mod fallback;
pub mod gate;
pub mod html;
pub mod labels;
pub mod qr;
pub mod record;
pub mod strategy;

pub use record::{TransactionRecord, TransactionStatus};
pub use strategy::{ExtractionAttempt, PartialRecord, Strategy};
