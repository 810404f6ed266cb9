//! Sync pipeline: listing orchestration, enrichment and the run service.

mod enrichment;
mod sync_backoff;
mod sync_model;
mod sync_service;
mod token_orchestrator;

pub use enrichment::*;
pub use sync_backoff::*;
pub use sync_model::*;
pub use sync_service::*;
pub use token_orchestrator::*;
