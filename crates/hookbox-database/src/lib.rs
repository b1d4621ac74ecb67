//! # hookbox-database
//!
//! Storage for the hook outbox: PostgreSQL connection management,
//! migrations, the [`HookStore`] contract, and its PostgreSQL and
//! in-memory implementations.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryHookStore;
pub use repositories::PgHookStore;
pub use store::{HookStore, ManualTransition};
