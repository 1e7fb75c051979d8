use dynaccess_core::batch::BatchWriteState;
use dynaccess_core::store::WriteRequest;
use dynaccess_core::{AccessError, Result};

use super::Access;

impl<E: Send + 'static> Access<E> {
    /// Issues one batch write (at most 25 requests) and resubmits whatever the store leaves
    /// unprocessed.
    ///
    /// Before retry `n` (counting from zero) the call sleeps `2^n * base_delay * jitter`, with
    /// `jitter` drawn uniformly from `[0, 1)` and the result capped at the policy's maximum.
    /// Fails with `MaxRetriesExceeded` once more than `max_retries` retries would be needed.
    pub async fn batch_write_with_retry(&self, requests: Vec<WriteRequest>) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }

        let mut pending = requests;
        let mut state = BatchWriteState::start();

        loop {
            state = match state {
                BatchWriteState::Pending { attempt } => {
                    tracing::trace!(
                        table = %self.table.name,
                        attempt,
                        requests = pending.len(),
                        "Writing batch"
                    );
                    pending = self
                        .store
                        .batch_write_item(&self.table.name, pending)
                        .await?;
                    state.on_response(pending.len())
                }
                BatchWriteState::PartiallyFailed {
                    attempt,
                    unprocessed,
                } => {
                    let next = state.retry(&self.retry);
                    if let BatchWriteState::Pending { .. } = next {
                        let delay = self.retry.backoff_delay(attempt, rand::random::<f64>());
                        tracing::debug!(
                            table = %self.table.name,
                            attempt,
                            unprocessed,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying unprocessed batch write requests"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    next
                }
                BatchWriteState::Succeeded { .. } => return Ok(()),
                BatchWriteState::Aborted { attempts } => {
                    tracing::warn!(
                        table = %self.table.name,
                        attempts,
                        unprocessed = pending.len(),
                        "Batch write retries exhausted"
                    );
                    return Err(AccessError::MaxRetriesExceeded {
                        table: self.table.name.clone(),
                        attempts,
                    });
                }
            };
        }
    }
}
