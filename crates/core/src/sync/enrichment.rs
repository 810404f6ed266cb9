//! Business filter and transaction-date enrichment.

use futures::stream::{self, StreamExt};
use log::{debug, warn};

use crate::config::Credentials;
use crate::invoices::{EnrichedInvoiceRow, InvoiceProvider, InvoiceRow};

/// Keeps reconciled, non-archived invoices.
pub fn filter_reconciled(rows: Vec<InvoiceRow>) -> Vec<InvoiceRow> {
    rows.into_iter()
        .filter(InvoiceRow::is_reconciled_and_active)
        .collect()
}

/// Attaches a transaction date to every row.
///
/// At most `concurrency` lookups run at once and the output keeps the input
/// order. Rows without a usable URL or without a token for their tag get
/// `None` without any request.
pub async fn enrich_transaction_dates(
    provider: &dyn InvoiceProvider,
    credentials: &Credentials,
    rows: Vec<InvoiceRow>,
    concurrency: usize,
) -> Vec<EnrichedInvoiceRow> {
    stream::iter(
        rows.into_iter()
            .map(|row| resolve_transaction_date(provider, credentials, row)),
    )
    .buffered(concurrency.max(1))
    .collect()
    .await
}

async fn resolve_transaction_date(
    provider: &dyn InvoiceProvider,
    credentials: &Credentials,
    row: InvoiceRow,
) -> EnrichedInvoiceRow {
    let Some(url) = row.transaction_url().map(str::to_string) else {
        return row.with_transaction_date(None);
    };

    let Some(credential) = credentials.get(&row.tag) else {
        warn!("No token found for tag '{}', skipping.", row.tag);
        return row.with_transaction_date(None);
    };

    let date = provider.fetch_transaction_date(&credential, &url).await;
    if date.is_none() {
        debug!("No transaction date resolved for {} ({})", row.tag, url);
    }
    row.with_transaction_date(date)
}

/// Drops rows that ended up without a transaction date.
pub fn retain_dated(rows: Vec<EnrichedInvoiceRow>) -> Vec<EnrichedInvoiceRow> {
    rows.into_iter().filter(EnrichedInvoiceRow::is_dated).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credential;
    use crate::errors::Result;
    use crate::invoices::CredentialFetch;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers `<url>-date` and records every lookup.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingProvider {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InvoiceProvider for RecordingProvider {
        async fn fetch_invoices(&self, credential: &Credential) -> Result<CredentialFetch> {
            Ok(CredentialFetch::new(credential.tag()))
        }

        async fn fetch_transaction_date(&self, credential: &Credential, url: &str) -> Option<String> {
            self.calls
                .lock()
                .unwrap()
                .push((credential.token().to_string(), url.to_string()));
            // Later rows answer first when lookups overlap.
            if url.ends_with("slow") {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            if url.contains("missing") {
                return None;
            }
            Some(format!("{}-date", url))
        }
    }

    fn row(tag: &str, url: Option<&str>) -> InvoiceRow {
        InvoiceRow {
            matching_transaction: url.map(str::to_string),
            reconciled: Some(true),
            ..InvoiceRow::new(tag)
        }
    }

    #[test]
    fn filter_drops_unreconciled_and_archived() {
        let mut archived = row("paris", None);
        archived.accounting_status = Some("archived".to_string());
        let mut unreconciled = row("paris", None);
        unreconciled.reconciled = Some(false);
        let kept = row("paris", Some("tx"));

        let filtered = filter_reconciled(vec![archived, unreconciled, kept.clone()]);
        assert_eq!(filtered, vec![kept]);
    }

    #[tokio::test]
    async fn empty_url_skips_network_and_row_is_dropped() {
        let provider = RecordingProvider::default();
        let credentials = Credentials::from_pairs([("paris", "tok")]);

        let enriched = enrich_transaction_dates(
            &provider,
            &credentials,
            vec![row("paris", Some("")), row("paris", None)],
            1,
        )
        .await;

        assert!(provider.calls().is_empty());
        assert!(enriched.iter().all(|r| r.transaction_date.is_none()));
        assert!(retain_dated(enriched).is_empty());
    }

    #[tokio::test]
    async fn lookup_uses_token_of_row_tag() {
        let provider = RecordingProvider::default();
        let credentials = Credentials::from_pairs([("paris", "tok-paris"), ("lyon", "tok-lyon")]);

        let enriched = enrich_transaction_dates(
            &provider,
            &credentials,
            vec![row("lyon", Some("https://api.test/tx/9"))],
            1,
        )
        .await;

        assert_eq!(
            provider.calls(),
            vec![("tok-lyon".to_string(), "https://api.test/tx/9".to_string())]
        );
        assert_eq!(
            enriched[0].transaction_date.as_deref(),
            Some("https://api.test/tx/9-date")
        );
    }

    #[tokio::test]
    async fn unknown_tag_is_skipped_without_request() {
        let provider = RecordingProvider::default();
        let credentials = Credentials::from_pairs([("paris", "tok")]);

        let enriched =
            enrich_transaction_dates(&provider, &credentials, vec![row("nantes", Some("tx"))], 1)
                .await;

        assert!(provider.calls().is_empty());
        assert_eq!(enriched[0].transaction_date, None);
    }

    #[tokio::test]
    async fn concurrent_lookups_keep_input_order_and_drop_unresolved() {
        let provider = RecordingProvider::default();
        let credentials = Credentials::from_pairs([("paris", "tok")]);
        let rows = vec![
            row("paris", Some("a-slow")),
            row("paris", Some("b-missing")),
            row("paris", Some("c")),
        ];

        let enriched = enrich_transaction_dates(&provider, &credentials, rows, 3).await;
        let dates: Vec<_> = enriched
            .iter()
            .map(|r| r.transaction_date.clone())
            .collect();
        assert_eq!(
            dates,
            vec![Some("a-slow-date".to_string()), None, Some("c-date".to_string())]
        );

        let kept = retain_dated(enriched);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.transaction_date.is_some()));
    }

    #[test]
    fn empty_string_date_survives_retain() {
        let rows = vec![
            row("paris", Some("tx-1")).with_transaction_date(Some(String::new())),
            row("paris", Some("tx-2")).with_transaction_date(Some("2025-01-01".to_string())),
            row("paris", Some("tx-3")).with_transaction_date(None),
        ];

        let kept = retain_dated(rows);

        let dates: Vec<_> = kept.iter().map(|r| r.transaction_date.as_deref()).collect();
        assert_eq!(dates, vec![Some(""), Some("2025-01-01")]);
    }
}
