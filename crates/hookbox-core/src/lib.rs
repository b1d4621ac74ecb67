//! # hookbox-core
//!
//! Core crate for Hookbox, the durable hook outbox. Contains configuration
//! schemas, typed identifiers, the unified error system, and the traits
//! other crates implement.
//!
//! This crate has **no** internal dependencies on other Hookbox crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
