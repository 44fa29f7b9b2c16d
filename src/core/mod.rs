//! Core types and constants for the direction finder

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
