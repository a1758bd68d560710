//! Cross-checks what a document says against what the claimant typed.

pub mod similarity;
pub mod document;

pub use document::*;
