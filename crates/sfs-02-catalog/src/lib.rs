//! # Catalog Subsystem
//!
//! Study materials submitted by students, moderated by reviewers, and
//! browsed by everyone.
//!
//! ## Submission Lifecycle
//!
//! ```text
//! draft ──validate──→ upload file ──→ insert ──→ [PENDING] ──approve──→ [APPROVED]
//!   │                                                 │
//!   └── field errors (nothing written)               └──reject──→ [REJECTED]
//! ```
//!
//! | Rule | Enforcement Location |
//! |------|---------------------|
//! | Only approved materials are listed | `service/catalog_service.rs` - `approved_materials` |
//! | Only the owner deletes | `service/catalog_service.rs` - `delete` |
//! | Stored file removed before the row | `service/catalog_service.rs` - `delete` |
//! | Favorites follow the live favorite set | `domain/favorites.rs` - `assemble_favorites` |
//!
//! ## Module Structure
//!
//! - `domain/` - Material, vocabularies, filters, validation, favorites
//! - `ports/` - `CatalogApi` (inbound), `MaterialRepository` (outbound)
//! - `service/` - `CatalogService`
//! - `adapters/` - `InMemoryMaterialRepository`

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::*;
