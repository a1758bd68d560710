pub mod metadata;
pub mod quality;
pub mod tamper;
pub mod content;
pub mod registry;
pub mod analyzer;
pub mod aggregate;

pub use registry::*;
pub use analyzer::*;
pub use aggregate::*;

use thiserror::Error;

use crate::models::image::ImageCheck;
use crate::pipeline::intake::IntakeError;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Image too small to analyse ({width}x{height})")]
    ImageTooSmall { width: u32, height: u32 },

    #[error("{} check timed out after {ms}ms", check.as_str())]
    Timeout { check: ImageCheck, ms: u64 },

    #[error("{} check aborted: {reason}", check.as_str())]
    CheckAborted { check: ImageCheck, reason: String },
}
