//! # Bus Flows
//!
//! What the services publish and who consumes it: the notice board, the
//! metrics recorder, and any other subscriber.

#[cfg(test)]
mod tests {
    use sfs_01_memberships::{InMemoryMembershipBackend, MembershipConfig, MembershipService};
    use sfs_runtime::{AppConfig, OfflineContainer};
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, NoticeBoard, NoticeKind, StoreEvent};
    use shared_types::{BackendError, ItemId, MembershipKind, Session, UserId};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn offline(user: Option<&str>) -> (OfflineContainer, AppConfig) {
        let config = AppConfig {
            offline: true,
            user: user.map(UserId::from),
            ..AppConfig::default()
        };
        (OfflineContainer::offline(&config), config)
    }

    #[tokio::test]
    async fn test_toggle_publishes_dispatch_then_commit() {
        let (container, config) = offline(Some("demo-student"));
        container.start_session(&config).await;
        let mut sub = container
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Membership]));

        container
            .memberships
            .toggle(MembershipKind::UpvoteMaterial, ItemId::from("5"))
            .await;

        let events = sub.drain();
        assert!(matches!(
            events.first(),
            Some(StoreEvent::ToggleDispatched { target: true, .. })
        ));
        assert!(matches!(
            events.last(),
            Some(StoreEvent::ToggleCommitted { member: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_flush_feeds_every_observer() {
        let (container, config) = offline(Some("demo-student"));
        container.start_session(&config).await;
        let handled = container.flush_events();
        // session start plus one load per kind
        assert!(handled >= 1 + MembershipKind::ALL.len());
        assert_eq!(container.flush_events(), 0);
    }

    #[tokio::test]
    async fn test_sign_out_clears_notices() {
        let (container, _) = offline(None);
        container
            .memberships
            .toggle(MembershipKind::FavoriteMaterial, ItemId::from("1"))
            .await;
        assert_eq!(container.active_notices().len(), 1);

        container
            .memberships
            .sign_in(Session::for_user("demo-student"))
            .await;
        container.memberships.sign_out().await;
        assert!(container.active_notices().is_empty());
    }

    #[tokio::test]
    async fn test_notice_board_follows_bus_and_expires() {
        let backend = Arc::new(InMemoryMembershipBackend::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let config = MembershipConfig {
            notice_ttl: Duration::from_millis(50),
            ..MembershipConfig::default()
        };
        let service = MembershipService::new(backend.clone(), bus.clone(), config);
        let board = Arc::new(NoticeBoard::new());
        let follower = Arc::clone(&board).follow(bus.subscribe(EventFilter::topics(vec![
            EventTopic::Notice,
            EventTopic::Session,
        ])));

        service.sign_in(Session::for_user("u1")).await;
        backend.fail_writes(Some(BackendError::Transport("connection refused".into())));
        service
            .toggle(MembershipKind::Enrollment, ItemId::from("c1"))
            .await;

        for _ in 0..100 {
            if !board.active(Instant::now()).is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let active = board.active(Instant::now());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, NoticeKind::ToggleFailed);
        assert_eq!(active[0].message, "Failed to update enrollment");

        assert!(board.active(Instant::now() + Duration::from_millis(60)).is_empty());
        follower.abort();
    }
}
