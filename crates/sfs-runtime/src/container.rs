//! # Service Container
//!
//! Holds the subsystem services and the infrastructure they share.
//!
//! ```text
//!                 ┌──────────────── InMemoryEventBus ───────────────┐
//!                 │                                                  │
//! MembershipService ──publish──→ │ ──observer──→ NoticeBoard       │
//! CatalogService ─────publish──→ │           └─→ MetricsRecorder    │
//!                 └──────────────────────────────────────────────────┘
//! ```
//!
//! Both services take the same backend type in a hosted run
//! (`SupabaseClient` implements both ports); offline runs use the in-memory
//! adapters filled with demo data.

use crate::config::AppConfig;
use crate::demo;
use crate::recorder::MetricsRecorder;
use parking_lot::Mutex;
use sfs_01_memberships::{InMemoryMembershipBackend, LoadReport, MembershipBackend, MembershipService};
use sfs_02_catalog::{CatalogService, InMemoryMaterialRepository, MaterialRepository};
use sfs_03_supabase::{SupabaseClient, SupabaseError};
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus, Notice, NoticeBoard, Subscription};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Services wired against a hosted Supabase project.
pub type HostedContainer = Container<SupabaseClient, SupabaseClient>;

/// Services wired against the in-memory demo backend.
pub type OfflineContainer = Container<InMemoryMembershipBackend, InMemoryMaterialRepository>;

pub struct Container<B: MembershipBackend, R: MaterialRepository> {
    pub bus: Arc<InMemoryEventBus>,
    pub memberships: MembershipService<B>,
    pub catalog: CatalogService<R>,
    pub notices: Arc<NoticeBoard>,
    recorder: MetricsRecorder,
    observer: Mutex<Subscription>,
}

impl<B: MembershipBackend + 'static, R: MaterialRepository + 'static> Container<B, R> {
    pub fn new(membership_backend: Arc<B>, repository: Arc<R>, config: &AppConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let publisher: Arc<dyn EventPublisher> = bus.clone();

        let memberships =
            MembershipService::new(membership_backend, Arc::clone(&publisher), config.memberships.clone());
        let catalog = CatalogService::new(repository, publisher, config.catalog.clone());
        let observer = Mutex::new(bus.subscribe(EventFilter::all()));

        Self {
            bus,
            memberships,
            catalog,
            notices: Arc::new(NoticeBoard::new()),
            recorder: MetricsRecorder,
            observer,
        }
    }

    /// Signs the configured user in, if there is one, and loads their sets.
    pub async fn start_session(&self, config: &AppConfig) -> Option<LoadReport> {
        let session = config.session()?;
        info!(user = %session.user_id, "Starting session");
        let report = self.memberships.sign_in(session).await;
        if let Some(report) = &report {
            for (kind, err) in &report.failed {
                warn!(kind = %kind, error = %err, "Membership load failed");
            }
            if let Some(err) = &report.profile_failed {
                warn!(error = %err, "Profile load failed");
            }
        }
        report
    }

    /// Feeds every event published so far to the notice board and the
    /// metrics recorder. Returns how many events were handled.
    pub fn flush_events(&self) -> usize {
        let events = self.observer.lock().drain();
        for event in &events {
            self.recorder.record(event);
            self.notices.absorb(event);
        }
        events.len()
    }

    /// Notices still on screen after flushing pending events.
    pub fn active_notices(&self) -> Vec<Notice> {
        self.flush_events();
        self.notices.active(Instant::now())
    }
}

impl HostedContainer {
    pub fn connect(config: &AppConfig) -> Result<Self, SupabaseError> {
        let client = Arc::new(SupabaseClient::new(config.supabase.clone())?);
        info!(url = %config.supabase.base_url(), "Connected to Supabase");
        Ok(Self::new(Arc::clone(&client), client, config))
    }
}

impl OfflineContainer {
    pub fn offline(config: &AppConfig) -> Self {
        let (memberships, repository) = demo::seeded_backends();
        info!("Using offline demo data");
        Self::new(Arc::new(memberships), Arc::new(repository), config)
    }
}
