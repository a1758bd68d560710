//! Turns extracted document text into typed claim evidence: document type,
//! per-type fields and a text-level authenticity assessment.

pub mod classify;
pub mod patterns;
pub mod generic;
pub mod authenticity;

pub use classify::*;
pub use patterns::*;
pub use generic::*;
pub use authenticity::*;
