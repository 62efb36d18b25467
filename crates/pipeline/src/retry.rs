//! Verification retry orchestrator. OCR confuses `0` and `O` often enough
//! that one failed lookup does not condemn the id: every substitution over
//! the ambiguous positions is tried, in mask-enumeration order, until one
//! verifies.

use banks::BankVerifier;
use payverify_core::candidates::{ambiguous_positions, generate_candidates};
use payverify_core::TransactionRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryOutcome {
    Verified,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RetryReport {
    pub outcome: RetryOutcome,
    /// Bank lookups performed, the original id included.
    pub attempts: usize,
    pub record: TransactionRecord,
}

/// Verify `transaction_id`, retrying `0`/`O` substitutions on failure.
///
/// The original id is always tried first and never re-tried. On exhaustion
/// the report carries the original attempt's record, not the last
/// candidate's: the substitutions were guesses, the original is what the
/// caller actually submitted.
pub async fn verify_with_retry(
    verifier: &dyn BankVerifier,
    transaction_id: &str,
    secondary_key: Option<&str>,
    max_ambiguous_positions: usize,
) -> RetryReport {
    let original = verifier.verify(transaction_id, secondary_key).await;
    if original.status.is_success() {
        return RetryReport {
            outcome: RetryOutcome::Verified,
            attempts: 1,
            record: original,
        };
    }
    if ambiguous_positions(transaction_id).is_empty() {
        return RetryReport {
            outcome: RetryOutcome::Failed,
            attempts: 1,
            record: original,
        };
    }

    tracing::info!(%transaction_id, "lookup failed on an ambiguous id, trying substitutions");
    let mut attempts = 1;
    for candidate in generate_candidates(transaction_id, max_ambiguous_positions)
        .into_iter()
        .skip(1)
    {
        attempts += 1;
        tracing::debug!(%candidate, attempt = attempts, "retrying with substituted id");
        let record = verifier.verify(&candidate, secondary_key).await;
        if record.status.is_success() {
            tracing::info!(original = %transaction_id, verified = %candidate, "substitution verified");
            return RetryReport {
                outcome: RetryOutcome::Verified,
                attempts,
                record,
            };
        }
    }

    RetryReport {
        outcome: RetryOutcome::Failed,
        attempts,
        record: original,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banks::mock::MockVerifier;
    use payverify_core::gate::BankKind;
    use payverify_core::TransactionStatus;

    #[tokio::test]
    async fn clean_id_verifies_without_retry() {
        let verifier = MockVerifier::new(BankKind::Boa, ["FT25188TN19J"]);
        let report = verify_with_retry(&verifier, "FT25188TN19J", Some("12345"), 10).await;
        assert_eq!(report.outcome, RetryOutcome::Verified);
        assert_eq!(report.attempts, 1);
        assert_eq!(verifier.calls(), vec!["FT25188TN19J"]);
    }

    #[tokio::test]
    async fn unambiguous_miss_is_terminal() {
        let verifier = MockVerifier::new(BankKind::Boa, Vec::<String>::new());
        let report = verify_with_retry(&verifier, "FT25188TN19J", None, 10).await;
        assert_eq!(report.outcome, RetryOutcome::Failed);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.record.status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn substitutions_run_in_mask_order_until_one_verifies() {
        let verifier = MockVerifier::new(BankKind::Telebirr, ["F001234567"]);
        let report = verify_with_retry(&verifier, "F0O1234567", None, 10).await;
        assert_eq!(report.outcome, RetryOutcome::Verified);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.record.transaction_id, "F001234567");
        assert_eq!(
            verifier.calls(),
            vec!["F0O1234567", "FOO1234567", "F001234567"]
        );
    }

    #[tokio::test]
    async fn exhaustion_reports_the_original_attempt() {
        let verifier = MockVerifier::new(BankKind::Telebirr, Vec::<String>::new());
        let report = verify_with_retry(&verifier, "F0O1234567", None, 10).await;
        assert_eq!(report.outcome, RetryOutcome::Failed);
        assert_eq!(report.attempts, 4);
        assert_eq!(report.record.transaction_id, "F0O1234567");
        let calls = verifier.calls();
        assert_eq!(
            calls.iter().filter(|c| c.as_str() == "F0O1234567").count(),
            1,
            "the original id must be tried exactly once"
        );
    }

    #[tokio::test]
    async fn attempt_count_is_bounded_by_the_position_cap() {
        // Twelve zeros, capped at 2 ambiguous positions: at most 4 lookups.
        let verifier = MockVerifier::new(BankKind::Cbe, Vec::<String>::new());
        let report = verify_with_retry(&verifier, "000000000000", None, 2).await;
        assert_eq!(report.attempts, 4);
    }
}
