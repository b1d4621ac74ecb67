//! Repository implementations backed by PostgreSQL.

pub mod hook;

pub use hook::{PgHookStore, append_in};
