pub mod format;
pub mod hash;
pub mod raster;

pub use format::*;
pub use hash::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("File too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Invalid perceptual hash encoding: {0}")]
    InvalidHash(String),
}
