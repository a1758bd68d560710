//! ClaimLens: fraud-risk scoring for insurance claim submissions.
//!
//! Entry points:
//! - [`pipeline::forensics::ImageAnalyzer`] for damage photographs
//! - [`pipeline::extraction::DocumentExtractor`] for policy documents
//! - [`pipeline::validation::validate_document_data`] for OCR-vs-form checks
//! - [`pipeline::scoring`] for fusion and the final decision
//! - [`pipeline::processor::ClaimProcessor`] to run a whole submission

pub mod config;
pub mod pipeline_config;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over the default
/// filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialised", config::APP_NAME, config::APP_VERSION);
}
