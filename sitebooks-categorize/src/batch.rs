//! Sequential batch categorization over a transaction store.

use sitebooks_core::{CategoryPrediction, TransactionStore};
use tracing::{info, warn};

use crate::categorizer::Categorizer;
use crate::completion::CompletionClient;

/// Default number of uncategorized transactions handled per run
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// (transaction id, prediction) for every item that was persisted
    pub predictions: Vec<(String, CategoryPrediction)>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Categorize up to `limit` pending transactions one at a time, writing each
/// result back before moving on. A failed write is counted and skipped.
pub async fn categorize_pending<S, C>(
    store: &mut S,
    categorizer: &Categorizer<C>,
    limit: usize,
) -> BatchReport
where
    S: TransactionStore,
    C: CompletionClient,
{
    let pending = store.pending(limit);
    let mut report = BatchReport::default();

    for (id, input) in pending {
        let prediction = categorizer.classify(&input).await;
        match store.record_prediction(&id, &prediction) {
            Ok(()) => {
                info!(
                    id = %id,
                    category = %prediction.category,
                    confidence = prediction.confidence,
                    "categorized"
                );
                report.succeeded += 1;
                report.predictions.push((id, prediction));
            }
            Err(e) => {
                warn!(id = %id, error = %e, "failed to save category");
                report.failed += 1;
            }
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "batch categorization complete"
    );
    report
}
