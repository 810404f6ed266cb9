//! End-to-end sync run: list, filter, enrich, load.

use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use super::{
    enrich_transaction_dates, fetch_all_credentials, filter_reconciled, retain_dated, SyncReport,
};
use crate::config::{Credentials, SyncConfig};
use crate::errors::Result;
use crate::invoices::{InvoiceProvider, InvoiceTableWriter};

#[derive(Clone)]
pub struct InvoiceSyncService {
    provider: Arc<dyn InvoiceProvider>,
    writer: Arc<dyn InvoiceTableWriter>,
    credentials: Credentials,
    config: SyncConfig,
}

impl InvoiceSyncService {
    pub fn new(
        provider: Arc<dyn InvoiceProvider>,
        writer: Arc<dyn InvoiceTableWriter>,
        credentials: Credentials,
        config: SyncConfig,
    ) -> Self {
        Self {
            provider,
            writer,
            credentials,
            config,
        }
    }

    /// Runs one full sync.
    ///
    /// Fetch and enrichment failures are absorbed into the report; only an
    /// invalid configuration or a failed load returns an error. With
    /// `dry_run` the destination table is left untouched.
    pub async fn run(&self, dry_run: bool) -> Result<SyncReport> {
        self.config.validate()?;
        let started_at = Instant::now();

        let phase = fetch_all_credentials(
            Arc::clone(&self.provider),
            &self.credentials,
            self.config.max_workers,
        )
        .await;
        let rows_fetched = phase.rows.len();
        info!(
            "Fetched {} invoices across {} credentials",
            rows_fetched,
            self.credentials.len()
        );

        let filtered = filter_reconciled(phase.rows);
        let rows_after_filter = filtered.len();
        info!(
            "{} invoices are reconciled and not archived",
            rows_after_filter
        );

        let enriched = enrich_transaction_dates(
            self.provider.as_ref(),
            &self.credentials,
            filtered,
            self.config.enrichment_concurrency,
        )
        .await;
        let dataset = retain_dated(enriched);
        let rows_enriched = dataset.len();
        let rows_dropped = rows_after_filter - rows_enriched;
        if rows_dropped > 0 {
            warn!(
                "Dropping {} invoices without a transaction date",
                rows_dropped
            );
        }

        let rows_loaded = if dry_run {
            info!(
                "Dry run: skipping load of {} rows into {}",
                rows_enriched,
                self.writer.describe()
            );
            0
        } else {
            info!(
                "Loading {} rows into {}",
                rows_enriched,
                self.writer.describe()
            );
            self.writer.replace_all(dataset).await?
        };

        let report = SyncReport {
            credentials: self.credentials.len(),
            credentials_completed: phase.completed,
            credentials_aborted: phase.aborted,
            credentials_failed: phase.failed,
            rows_fetched,
            rows_after_filter,
            rows_enriched,
            rows_dropped,
            rows_loaded,
            dry_run,
            duration_ms: started_at.elapsed().as_millis() as i64,
        };
        info!(
            "Sync finished in {} ms: {} fetched, {} loaded",
            report.duration_ms, report.rows_fetched, report.rows_loaded
        );
        Ok(report)
    }
}
