use chrono::NaiveDate;
use tracing::info;

use crate::error::RunError;
use crate::ingest::Ingested;
use crate::scoring::{self, BatchOutcome};
use crate::thresholds::Thresholds;

/// Scores an ingested export and merges ingest rejections ahead of the
/// engine's own. In strict mode any rejected row, from either stage, fails
/// the whole run.
pub fn run(
    ingested: Ingested,
    thresholds: &Thresholds,
    as_of: NaiveDate,
    strict: bool,
) -> Result<BatchOutcome, RunError> {
    let mut outcome = scoring::score_batch(&ingested.records, thresholds, as_of);
    let mut rejected = ingested.rejected;
    rejected.append(&mut outcome.rejected);
    outcome.rejected = rejected;

    if strict {
        if let Some(first) = outcome.rejected.first() {
            return Err(RunError::StrictRejected {
                count: outcome.rejected.len(),
                first: first.error.clone(),
            });
        }
    }

    info!(
        scored = outcome.scored.len(),
        rejected = outcome.rejected.len(),
        strict,
        "run complete"
    );
    Ok(outcome)
}
