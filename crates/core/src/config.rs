//! Run configuration and credential set.
//!
//! Everything a run needs is carried in explicit values built once by the
//! binary and handed to the client, orchestrator and service.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::invoices::ListingFilter;
use crate::sync::backoff_delay;

pub const DEFAULT_API_URL: &str = "https://app.pennylane.com/api/external/v2";
pub const DEFAULT_PROJECT: &str = "korner-datalake";
pub const DEFAULT_TABLE: &str = "Pennylane.suppliers_invoices";
pub const DEFAULT_MAX_WORKERS: usize = 3;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const LISTING_MAX_BACKOFF: Duration = Duration::from_secs(60);

fn default_invoice_date_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of requests allowed, first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound for a single wait; `None` leaves the growth uncapped.
    pub max_delay: Option<Duration>,
}

impl RetryPolicy {
    /// Listing endpoint: retries 429 only, waits capped at 60s.
    pub const fn listing() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            max_delay: Some(LISTING_MAX_BACKOFF),
        }
    }

    /// Transaction endpoint: retries 429 and 5xx, waits uncapped.
    pub const fn transaction() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            max_delay: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Wait before the retry following the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(self.base_delay, attempt, self.max_delay)
    }
}

/// Settings for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the external API, without trailing slash.
    pub api_url: String,
    /// Server-side cutoff: only invoices dated on or after this day are listed.
    pub invoice_date_from: NaiveDate,
    /// Credentials fetched concurrently during the listing phase.
    pub max_workers: usize,
    /// Transaction-date lookups in flight at once. `1` keeps them sequential.
    pub enrichment_concurrency: usize,
    pub listing_retry: RetryPolicy,
    pub transaction_retry: RetryPolicy,
    /// Fixed pause between two listing pages of the same credential.
    pub page_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            invoice_date_from: default_invoice_date_from(),
            max_workers: DEFAULT_MAX_WORKERS,
            enrichment_concurrency: 1,
            listing_retry: RetryPolicy::listing(),
            transaction_retry: RetryPolicy::transaction(),
            page_delay: DEFAULT_PAGE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SyncConfig {
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Filters sent with every listing request.
    pub fn listing_filters(&self) -> Vec<ListingFilter> {
        vec![ListingFilter::date_on_or_after(self.invoice_date_from)]
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::config("api_url must not be empty"));
        }
        if self.max_workers == 0 {
            return Err(Error::config("max_workers must be greater than 0"));
        }
        if self.enrichment_concurrency == 0 {
            return Err(Error::config(
                "enrichment_concurrency must be greater than 0",
            ));
        }
        if self.listing_retry.max_attempts == 0 || self.transaction_retry.max_attempts == 0 {
            return Err(Error::config("retry max_attempts must be greater than 0"));
        }
        Ok(())
    }
}

/// Destination table, addressed by project and table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDestination {
    pub project: String,
    pub table: String,
}

impl TableDestination {
    pub fn new(project: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            table: table.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(Error::config("destination project must not be empty"));
        }
        if self.table.trim().is_empty() {
            return Err(Error::config("destination table must not be empty"));
        }
        Ok(())
    }
}

impl Default for TableDestination {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT, DEFAULT_TABLE)
    }
}

impl fmt::Display for TableDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.table)
    }
}

/// One account's bearer token, keyed by the tag that attributes its rows.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    tag: String,
    token: String,
}

impl Credential {
    pub fn new(tag: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            token: token.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("tag", &self.tag)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Named secrets, tag → token. Iteration order is the tags' sort order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    entries: BTreeMap<String, String>,
}

impl Credentials {
    /// Parse a JSON object of `{"tag": "token"}` pairs.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| Error::credentials(format!("not valid JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::credentials("expected a JSON object of tag -> token"))?;

        let mut entries = BTreeMap::new();
        for (tag, token) in object {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(Error::credentials("credential tag must not be blank"));
            }
            let token = token
                .as_str()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    Error::credentials(format!("token for '{}' must be a non-empty string", tag))
                })?;
            entries.insert(tag.to_string(), token.to_string());
        }

        if entries.is_empty() {
            return Err(Error::credentials("no credentials configured"));
        }
        Ok(Self { entries })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, tag: &str) -> Option<Credential> {
        self.entries
            .get(tag)
            .map(|token| Credential::new(tag, token.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = Credential> + '_ {
        self.entries
            .iter()
            .map(|(tag, token)| Credential::new(tag.as_str(), token.as_str()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_parse_tag_token_object() {
        let creds = Credentials::from_json(r#"{"paris": "tok-a", "lyon": " tok-b "}"#).unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds.tags().collect::<Vec<_>>(), vec!["lyon", "paris"]);
        assert_eq!(creds.get("lyon").unwrap().token(), "tok-b");
        assert!(creds.get("nantes").is_none());
    }

    #[test]
    fn credentials_reject_non_object_and_empty() {
        assert!(matches!(
            Credentials::from_json(r#"["tok"]"#),
            Err(Error::Credentials(_))
        ));
        assert!(matches!(
            Credentials::from_json("{}"),
            Err(Error::Credentials(_))
        ));
        assert!(matches!(
            Credentials::from_json("not json"),
            Err(Error::Credentials(_))
        ));
    }

    #[test]
    fn credentials_reject_blank_or_non_string_tokens() {
        assert!(Credentials::from_json(r#"{"paris": ""}"#).is_err());
        assert!(Credentials::from_json(r#"{"paris": 42}"#).is_err());
    }

    #[test]
    fn debug_output_never_contains_tokens() {
        let creds = Credentials::from_pairs([("paris", "secret-token")]);
        let credential = creds.get("paris").unwrap();
        assert!(!format!("{:?}", creds).contains("secret-token"));
        assert!(!format!("{:?}", credential).contains("secret-token"));
    }

    #[test]
    fn listing_policy_is_capped_transaction_policy_is_not() {
        let listing = RetryPolicy::listing();
        assert_eq!(listing.delay_for(0), Duration::from_secs(1));
        assert_eq!(listing.delay_for(3), Duration::from_secs(8));
        assert_eq!(listing.delay_for(7), Duration::from_secs(60));

        let transaction = RetryPolicy::transaction();
        assert_eq!(transaction.delay_for(7), Duration::from_secs(128));
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = SyncConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.enrichment_concurrency, 1);
        assert_eq!(config.listing_retry.max_attempts, 5);
        assert_eq!(config.page_delay, Duration::from_millis(500));
        assert_eq!(
            config.invoice_date_from,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers_and_attempts() {
        let mut config = SyncConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = SyncConfig::default();
        config.listing_retry = config.listing_retry.with_max_attempts(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_url_is_normalized() {
        let config = SyncConfig::default().with_api_url(" http://localhost:8080/v2/ ");
        assert_eq!(config.api_url, "http://localhost:8080/v2");
    }

    #[test]
    fn destination_display_and_validation() {
        let destination = TableDestination::default();
        assert_eq!(
            destination.to_string(),
            "korner-datalake:Pennylane.suppliers_invoices"
        );
        assert!(TableDestination::new("p", " ").validate().is_err());
    }
}
