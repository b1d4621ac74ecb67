//! Hook outbox domain entities.

pub mod event_type;
pub mod model;
pub mod receiver;
pub mod resolution;
pub mod status;

pub use event_type::{Channel, EventType};
pub use model::{CreateHook, Hook, Lease};
pub use receiver::ReceiverKind;
pub use resolution::HookResolution;
pub use status::HookStatus;
