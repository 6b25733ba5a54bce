//! # Supabase Adapter
//!
//! Implements the outbound ports of the membership and catalog subsystems
//! against a hosted Supabase project.
//!
//! ```text
//! MembershipService ──→ MembershipBackend ─┐
//!                                          ├──→ SupabaseClient ──HTTPS──→ /rest/v1/*
//! CatalogService ────→ MaterialRepository ─┘                        └──→ /storage/v1/*
//! ```
//!
//! | Remote answer | Port result |
//! |---------------|-------------|
//! | `409` / `23505` on insert | `WriteOutcome::Conflict` |
//! | Delete matching no row | `WriteOutcome::Conflict` |
//! | `401` / `403` | `BackendError::Unauthorized` |
//! | Client timeout | `BackendError::Timeout` |
//!
//! Every request carries the anon key as `apikey` and the user's access token
//! (or the anon key) as the bearer credential.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod config;
pub mod error;
pub mod materials;
pub mod memberships;

pub use client::SupabaseClient;
pub use config::{SupabaseConfig, APPLICATION_NAME, STORAGE_BUCKET};
pub use error::{ErrorBody, SupabaseError};
pub use memberships::{membership_table, MATERIALS_TABLE, PROFILES_TABLE};
