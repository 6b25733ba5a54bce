//! # Domain Layer
//!
//! Pure membership logic with no I/O.
//!
//! - `entities` - Membership sets, counters, snapshots, configuration
//! - `pending` - In-flight operation registry
//! - `store` - The per-session client state store
//! - `errors` - Local refusals

pub mod entities;
pub mod errors;
pub mod pending;
pub mod store;

pub use entities::*;
pub use errors::*;
pub use pending::*;
pub use store::*;
pub use shared_types::{ItemEvent, ItemState};
