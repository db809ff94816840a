//! # ARCHCAP Shared
//!
//! Configuration and seed types used by the ARCHCAP binary.

pub mod config;
pub mod error;

// Re-exports
pub use config::*;
pub use error::*;
