//! # Shared Types Crate
//!
//! Identifiers, relationship kinds, the per-item state machine and the
//! backend error type used by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here only.
//! - **Opaque Items**: materials and courses are addressed by `ItemId`; the
//!   membership core never looks inside them.

pub mod entities;
pub mod errors;
pub mod item_state;

pub use entities::*;
pub use errors::*;
pub use item_state::{ItemEvent, ItemState};
