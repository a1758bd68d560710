//! Data model shared by every pipeline stage.
//!
//! All records are produced once and never mutated afterwards. They derive
//! `Serialize`/`Deserialize` so the surrounding system can persist or ship
//! them as JSON.

pub mod enums;
pub mod claim;
pub mod extracted;
pub mod image;
pub mod document;
pub mod validation;
pub mod fraud;

pub use claim::*;
pub use enums::*;
pub use extracted::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
