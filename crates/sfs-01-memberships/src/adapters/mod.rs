//! # Adapters
//!
//! - `in_memory` - Process-local `MembershipBackend` for offline use and tests

pub mod in_memory;

pub use in_memory::InMemoryMembershipBackend;
