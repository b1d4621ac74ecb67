//! # hookbox-entity
//!
//! Entity models for the hook outbox. Every struct in this crate represents
//! a `hooks` table row or a value derived from one. Database entities derive
//! `sqlx::FromRow`.

pub mod hook;

pub use hook::{
    Channel, CreateHook, EventType, Hook, HookResolution, HookStatus, Lease, ReceiverKind,
};
