//! # Shared Bus - Event Bus for the Client Core
//!
//! Services never call the view layer directly. They publish `StoreEvent`s
//! and whoever cares (notice board, metrics recorder, UI bindings)
//! subscribes.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────┐
//! │ MembershipService│    publish()       │ NoticeBoard  │
//! │ CatalogService   │ ──────┐            │ Metrics      │
//! └──────────────────┘       │            └──────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐           │
//!                      │  Event Bus   │ ──────────┘
//!                      └──────────────┘  subscribe()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod notices;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, StoreEvent};
pub use notices::{Notice, NoticeBoard, NoticeKind, DEFAULT_NOTICE_TTL};
pub use publisher::{EventPublisher, InMemoryEventBus, NullPublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
