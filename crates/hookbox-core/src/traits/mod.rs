//! Core traits defined in `hookbox-core` and implemented by other crates.

pub mod error_sink;

pub use error_sink::{ErrorReport, ErrorSink, Severity};
