//! In-process hook storage.

pub mod store;

pub use store::MemoryHookStore;
