//! # Memberships Subsystem
//!
//! Client-side state for every boolean user-item relationship: favorited
//! materials, upvoted materials, favorited courses and enrollments.
//!
//! ## Purpose
//!
//! Toggles update the UI immediately and are confirmed by a single remote
//! write. A failed or timed-out write restores the previous flag and
//! counter and posts a notice. A duplicate-insert conflict counts as
//! success. Enrollments also carry a progress value written the same way,
//! and the bulk load fetches the user's profile.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | At most one in-flight write per (kind, item) | `domain/pending.rs` - `PendingRegistry::register` |
//! | Counters never negative | `domain/entities.rs` - `CounterMap::adjust` |
//! | No remote call without a session | `domain/store.rs` - `prepare_toggle` |
//! | Results from an old session are dropped | `domain/store.rs` - generation check |
//! | Reloads keep in-flight targets and rebase their restore point | `domain/store.rs` - `apply_load` |
//! | Only legal state transitions | `shared_types::ItemState::next`, called by the store |
//! | Progress only on enrolled courses, at most 100 | `domain/store.rs` - `prepare_progress` |
//!
//! ## Toggle Lifecycle
//!
//! ```text
//! [ABSENT] ──toggle──→ [PENDING_ADD] ──ok / conflict──→ [PRESENT]
//!                            │
//!                            └── error / timeout ──→ [ABSENT] + notice
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/in_memory.rs - InMemoryMembershipBackend              │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - MembershipApi trait                        │
//! │  ports/outbound.rs - MembershipBackend trait                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/ - MembershipService, optimistic_toggle                │
//! │  domain/  - MembershipStore, PendingRegistry, UserProfile       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

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
