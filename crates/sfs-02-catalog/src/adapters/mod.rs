//! # Adapters
//!
//! - `in_memory` - Process-local `MaterialRepository`

pub mod in_memory;

pub use in_memory::InMemoryMaterialRepository;
