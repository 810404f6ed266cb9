//! Outcome records of a sync run.

use serde::{Deserialize, Serialize};

use crate::invoices::InvoiceRow;

/// Result of the listing phase across all credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPhase {
    /// Rows of every credential, grouped by completion order.
    pub rows: Vec<InvoiceRow>,
    /// Tags whose pagination ran to the last page.
    pub completed: Vec<String>,
    /// Tags whose pagination stopped early; their partial rows are kept.
    pub aborted: Vec<String>,
    /// Tags whose task failed outright and contributed no rows.
    pub failed: Vec<String>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub credentials: usize,
    pub credentials_completed: Vec<String>,
    pub credentials_aborted: Vec<String>,
    pub credentials_failed: Vec<String>,
    pub rows_fetched: usize,
    pub rows_after_filter: usize,
    pub rows_enriched: usize,
    pub rows_dropped: usize,
    pub rows_loaded: usize,
    pub dry_run: bool,
    pub duration_ms: i64,
}
