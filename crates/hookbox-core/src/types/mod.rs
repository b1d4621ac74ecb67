//! Core type definitions used across the Hookbox workspace.

pub mod id;
pub mod lock_token;

pub use id::{HookId, ReceiverId};
pub use lock_token::LockToken;
