//! PostgreSQL integration tests for the hook store.
//!
//! These need a disposable database:
//! `DATABASE_URL=postgres://... cargo test --test integration -- --ignored`

mod claim_test;
mod helpers;
mod store_test;
