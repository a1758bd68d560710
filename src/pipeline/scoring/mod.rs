//! Behavioral rules, weighted fusion and the final disposition.

pub mod behavior;
pub mod fusion;
pub mod decision;

pub use behavior::*;
pub use fusion::*;
pub use decision::*;
