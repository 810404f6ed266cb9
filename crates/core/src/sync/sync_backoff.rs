//! Status classification and exponential backoff shared by the API client.

use std::time::Duration;

/// Largest exponent applied to the base delay.
const MAX_EXPONENT: u32 = 16;

/// How a response status should be handled by a retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Success,
    Retryable,
    Permanent,
}

/// Listing endpoint: only 200 succeeds and only 429 is retried.
pub fn classify_listing_status(status: u16) -> RetryClass {
    match status {
        200 => RetryClass::Success,
        429 => RetryClass::Retryable,
        _ => RetryClass::Permanent,
    }
}

/// Transaction endpoint: any 2xx succeeds, 429 and 5xx are retried.
pub fn classify_transaction_status(status: u16) -> RetryClass {
    match status {
        200..=299 => RetryClass::Success,
        429 => RetryClass::Retryable,
        500..=599 => RetryClass::Retryable,
        _ => RetryClass::Permanent,
    }
}

/// `base * 2^attempt`, optionally capped.
pub fn backoff_delay(base: Duration, attempt: u32, cap: Option<Duration>) -> Duration {
    let factor = 1_u32 << attempt.min(MAX_EXPONENT);
    let delay = base.saturating_mul(factor);
    match cap {
        Some(cap) => delay.min(cap),
        None => delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_status_retries_only_rate_limits() {
        assert_eq!(classify_listing_status(200), RetryClass::Success);
        assert_eq!(classify_listing_status(429), RetryClass::Retryable);
        assert_eq!(classify_listing_status(201), RetryClass::Permanent);
        assert_eq!(classify_listing_status(500), RetryClass::Permanent);
        assert_eq!(classify_listing_status(401), RetryClass::Permanent);
    }

    #[test]
    fn transaction_status_retries_rate_limits_and_server_errors() {
        assert_eq!(classify_transaction_status(200), RetryClass::Success);
        assert_eq!(classify_transaction_status(204), RetryClass::Success);
        assert_eq!(classify_transaction_status(429), RetryClass::Retryable);
        assert_eq!(classify_transaction_status(503), RetryClass::Retryable);
        assert_eq!(classify_transaction_status(404), RetryClass::Permanent);
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let base = Duration::from_secs(1);
        let cap = Some(Duration::from_secs(60));
        assert_eq!(backoff_delay(base, 0, cap), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 1, cap), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 4, cap), Duration::from_secs(16));
        assert_eq!(backoff_delay(base, 6, cap), Duration::from_secs(60));
        assert_eq!(backoff_delay(base, 6, None), Duration::from_secs(64));
    }

    #[test]
    fn backoff_exponent_is_bounded() {
        let base = Duration::from_millis(1);
        assert_eq!(backoff_delay(base, 40, None), backoff_delay(base, 16, None));
    }
}
