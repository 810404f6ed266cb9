//! Pennylane external API client for supplier invoices.
//!
//! Walks the cursor-paginated supplier invoice listing per credential and
//! resolves matched-transaction dates, each with its own backoff policy.

mod client;
mod error;
mod provider;
mod types;

pub use client::PennylaneClient;
pub use error::{PennylaneError, Result};
pub use types::*;
