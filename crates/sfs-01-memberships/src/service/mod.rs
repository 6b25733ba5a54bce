//! # Service Layer
//!
//! - `optimistic` - Generic apply / confirm / revert helper
//! - `membership_service` - Dispatcher and reconciler over the store

pub mod membership_service;
pub mod optimistic;

pub use membership_service::*;
pub use optimistic::*;
