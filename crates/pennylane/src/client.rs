//! Pennylane API client for supplier invoices and matched transactions.
//!
//! Two retry loops live here. The listing loop retries only on 429 with a
//! capped backoff; the transaction loop also retries 5xx and is uncapped.
//! Neither retries transport failures.

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;

use invoice_sync_core::config::{Credential, RetryPolicy, SyncConfig};
use invoice_sync_core::invoices::CredentialFetch;
use invoice_sync_core::sync::{classify_listing_status, classify_transaction_status, RetryClass};

use crate::error::{PennylaneError, Result};
use crate::types::{MatchedTransactionList, SupplierInvoice, SupplierInvoicePage};

const MAX_LOG_BODY_CHARS: usize = 512;
const SUPPLIER_INVOICES_PATH: &str = "supplier_invoices";

/// Client for the Pennylane external API.
#[derive(Debug, Clone)]
pub struct PennylaneClient {
    client: reqwest::Client,
    base_url: String,
    filter_json: String,
    listing_retry: RetryPolicy,
    transaction_retry: RetryPolicy,
    page_delay: Duration,
}

impl PennylaneClient {
    fn body_preview(body: &str) -> String {
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        preview
    }

    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }
        warn!("[{}] Error: {}", status.as_u16(), Self::body_preview(body));
    }

    /// Create a client from the run configuration.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let filter_json = serde_json::to_string(&config.listing_filters())?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            filter_json,
            listing_retry: config.listing_retry,
            transaction_retry: config.transaction_retry,
            page_delay: config.page_delay,
        })
    }

    /// Create headers for an API request.
    fn headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| PennylaneError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn supplier_invoices_url(&self) -> String {
        format!("{}/{}", self.base_url, SUPPLIER_INVOICES_PATH)
    }

    /// GET that succeeds only on 200 and retries only on 429.
    ///
    /// Waits `listing_retry.delay_for(attempt)` between attempts; any other
    /// status or a transport failure ends the call at once.
    async fn get_with_retries(
        &self,
        url: &str,
        headers: &HeaderMap,
        query: &[(&str, &str)],
    ) -> Result<String> {
        let policy = self.listing_retry;
        let mut attempt = 0u32;

        loop {
            let response = self
                .client
                .get(url)
                .headers(headers.clone())
                .query(query)
                .send()
                .await?;
            let status = response.status();

            match classify_listing_status(status.as_u16()) {
                RetryClass::Success => return Ok(response.text().await?),
                RetryClass::Retryable => {
                    attempt += 1;
                    if attempt >= policy.max_attempts {
                        warn!("Max retries exceeded.");
                        return Err(PennylaneError::RetriesExhausted {
                            attempts: attempt,
                            status: status.as_u16(),
                        });
                    }
                    let wait = policy.delay_for(attempt - 1);
                    warn!(
                        "Rate limited. Waiting {:?} before retry #{}...",
                        wait, attempt
                    );
                    sleep(wait).await;
                }
                RetryClass::Permanent => {
                    let body = response.text().await.unwrap_or_default();
                    Self::log_response(status, &body);
                    return Err(PennylaneError::api(
                        status.as_u16(),
                        Self::body_preview(&body),
                    ));
                }
            }
        }
    }

    /// Walk every supplier-invoice page visible to `credential`.
    ///
    /// A failed page ends pagination; rows from earlier pages are kept and
    /// the reason is recorded in [`CredentialFetch::aborted`]. Only a token
    /// that cannot be turned into a header fails the whole call.
    pub async fn fetch_supplier_invoices(&self, credential: &Credential) -> Result<CredentialFetch> {
        let tag = credential.tag();
        let headers = Self::headers(credential.token())?;
        let url = self.supplier_invoices_url();
        let mut fetch = CredentialFetch::new(tag);
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("filter", self.filter_json.as_str())];
            if let Some(cursor) = cursor.as_deref() {
                query.push(("cursor", cursor));
            }

            let body = match self.get_with_retries(&url, &headers, &query).await {
                Ok(body) => body,
                Err(err) => {
                    warn!("Listing request failed for {}: {}", tag, err);
                    return Ok(fetch.abort(err.to_string()));
                }
            };

            let page: SupplierInvoicePage = match serde_json::from_str(&body) {
                Ok(page) => page,
                Err(err) => {
                    warn!("Failed to decode JSON for token {}: {}", tag, err);
                    return Ok(fetch.abort(format!("invalid JSON: {}", err)));
                }
            };

            let Some(items) = page.items else {
                warn!(
                    "No 'items' found in response for token {}: {}",
                    tag,
                    Self::body_preview(&body)
                );
                return Ok(fetch.abort("response has no items field"));
            };

            fetch.pages += 1;
            for item in items {
                match serde_json::from_value::<SupplierInvoice>(item) {
                    Ok(invoice) => fetch.rows.push(invoice.into_row(tag)),
                    Err(err) => warn!("Skipping undecodable invoice for {}: {}", tag, err),
                }
            }
            debug!(
                "Page {} for {}: {} rows so far",
                fetch.pages,
                tag,
                fetch.rows.len()
            );

            if !page.has_more.unwrap_or(false) {
                return Ok(fetch);
            }
            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => {
                    warn!("has_more set without next_cursor for {}", tag);
                    return Ok(fetch.abort("has_more set without next_cursor"));
                }
            }

            sleep(self.page_delay).await;
        }
    }

    /// Date of the first transaction behind `url`.
    ///
    /// Retries 429 and 5xx; any other status, transport or decode failure is
    /// returned as an error without retrying. A success without items is
    /// `Ok(None)`.
    pub async fn fetch_transaction_date_with_retries(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<Option<String>> {
        let policy = self.transaction_retry;
        let mut attempt = 0u32;

        loop {
            let response = self.client.get(url).headers(headers.clone()).send().await?;
            let status = response.status();

            match classify_transaction_status(status.as_u16()) {
                RetryClass::Success => {
                    let list: MatchedTransactionList = response.json().await?;
                    return Ok(list.first_date());
                }
                RetryClass::Retryable => {
                    attempt += 1;
                    if attempt >= policy.max_attempts {
                        return Err(PennylaneError::RetriesExhausted {
                            attempts: attempt,
                            status: status.as_u16(),
                        });
                    }
                    let wait = policy.delay_for(attempt - 1);
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        warn!("Rate limited. Backing off {:?} (date fetching)", wait);
                    } else {
                        warn!("Server error ({}). Retrying in {:?}", status.as_u16(), wait);
                    }
                    sleep(wait).await;
                }
                RetryClass::Permanent => {
                    let body = response.text().await.unwrap_or_default();
                    Self::log_response(status, &body);
                    return Err(PennylaneError::api(
                        status.as_u16(),
                        Self::body_preview(&body),
                    ));
                }
            }
        }
    }

    /// Transaction date for one credential, with every failure folded into `None`.
    pub async fn fetch_transaction_date(&self, credential: &Credential, url: &str) -> Option<String> {
        let headers = match Self::headers(credential.token()) {
            Ok(headers) => headers,
            Err(err) => {
                warn!("Cannot query transaction for {}: {}", credential.tag(), err);
                return None;
            }
        };

        match self.fetch_transaction_date_with_retries(url, &headers).await {
            Ok(date) => date,
            Err(err) => {
                warn!("Transaction date unavailable for {} ({}): {}", credential.tag(), url, err);
                None
            }
        }
    }
}
