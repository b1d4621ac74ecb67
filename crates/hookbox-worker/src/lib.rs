//! The hook outbox engine.
//!
//! This crate provides:
//! - [`HookCreator`], the producer-side API business logic calls
//! - [`LockManager`], the lease protocol on top of a [`HookStore`](hookbox_database::HookStore)
//! - [`RetryPolicy`], failure bookkeeping and backoff scheduling
//! - [`Dispatcher`], the exhaustive event type → handler registry
//! - [`Poller`], the claim → dispatch → resolve loop run by each worker
//! - Channel handlers for mail, push, and webhook hooks and an HTTP delivery adapter

pub mod adapters;
pub mod creator;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod lease;
pub mod poller;
pub mod retry;
pub mod sink;

pub use creator::{HookCreator, NewHook};
pub use dispatcher::{DeliveryOutcome, Dispatcher, DispatcherBuilder, HookHandler};
pub use error::DeliveryError;
pub use handlers::build_dispatcher;
pub use lease::{LeasedHook, LockManager, ReleaseOutcome};
pub use poller::{Poller, TickSummary};
pub use retry::RetryPolicy;
pub use sink::TracingErrorSink;
