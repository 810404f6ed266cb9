use async_trait::async_trait;

use super::{CredentialFetch, EnrichedInvoiceRow};
use crate::config::Credential;
use crate::errors::Result;

/// Source of supplier invoices and their matched transaction dates.
#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    /// Walks every listing page visible to `credential`.
    ///
    /// Page-level failures end pagination early and are reported through
    /// [`CredentialFetch::aborted`] with the rows collected so far. An `Err`
    /// means nothing usable was fetched for this credential.
    async fn fetch_invoices(&self, credential: &Credential) -> Result<CredentialFetch>;

    /// Resolves the date of the first item behind a matched-transaction URL.
    /// Any failure yields `None`.
    async fn fetch_transaction_date(&self, credential: &Credential, url: &str) -> Option<String>;
}

/// Destination that receives the final dataset.
#[async_trait]
pub trait InvoiceTableWriter: Send + Sync {
    /// Replaces the whole table content with `rows`, returning the count written.
    async fn replace_all(&self, rows: Vec<EnrichedInvoiceRow>) -> Result<usize>;

    /// Human-readable destination used in logs.
    fn describe(&self) -> String;
}
