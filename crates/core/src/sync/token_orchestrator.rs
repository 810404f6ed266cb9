//! Bounded-concurrency listing across all credentials.

use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::FetchPhase;
use crate::config::Credentials;
use crate::errors::Error;
use crate::invoices::InvoiceProvider;

/// Runs one listing task per credential, at most `max_workers` at a time.
///
/// Each task is spawned on its own so that an error or a panic in one
/// credential is logged and skipped while the others keep their results.
/// Rows are appended here, by the collecting task, in completion order.
pub async fn fetch_all_credentials(
    provider: Arc<dyn InvoiceProvider>,
    credentials: &Credentials,
    max_workers: usize,
) -> FetchPhase {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut pending = FuturesUnordered::new();

    for credential in credentials.iter() {
        let tag = credential.tag().to_string();
        let provider = Arc::clone(&provider);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::task(format!("worker pool closed: {}", e)))?;
            info!("Fetching invoices for {}", credential.tag());
            provider.fetch_invoices(&credential).await
        });
        pending.push(async move { (tag, handle.await) });
    }

    let mut phase = FetchPhase::default();
    while let Some((tag, joined)) = pending.next().await {
        match joined {
            Ok(Ok(fetch)) => {
                info!(
                    "Done: {} ({} rows, {} pages)",
                    tag,
                    fetch.rows.len(),
                    fetch.pages
                );
                match fetch.aborted {
                    Some(reason) => {
                        warn!(
                            "Pagination for {} stopped early, keeping {} rows: {}",
                            tag,
                            fetch.rows.len(),
                            reason
                        );
                        phase.aborted.push(tag);
                    }
                    None => phase.completed.push(tag),
                }
                phase.rows.extend(fetch.rows);
            }
            Ok(Err(err)) => {
                error!("Error for {}: {}", tag, err);
                phase.failed.push(tag);
            }
            Err(join_err) => {
                error!("Fetch task for {} did not finish: {}", tag, join_err);
                phase.failed.push(tag);
            }
        }
    }

    phase
}
