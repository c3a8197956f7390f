//! Like, super-like and dislike behaviour of the relationship ledger

mod helpers;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;

use helpers::*;
use teamder::database::store::{MemoryUserStore, UserStore};
use teamder::models::{CreateUserRequest, LikeKind, ModerationStatus, NotificationType, QuotaKind, User};
use teamder::services::{QuotaTracker, RelationshipLedger};
use teamder::utils::clock::Clock;
use teamder::TeamderError;

/// Every given edge has exactly one mirrored received edge and vice versa
fn assert_symmetric(users: &[User]) {
    for user in users {
        for edge in &user.likes_given {
            let target = users
                .iter()
                .find(|u| u.telegram_id == edge.target_telegram_id)
                .expect("edge target exists");
            let mirrored: Vec<_> = target
                .likes_received
                .iter()
                .filter(|e| e.target_telegram_id == user.telegram_id)
                .collect();
            assert_eq!(mirrored.len(), 1, "{} -> {} not mirrored", user.telegram_id, target.telegram_id);
            assert_eq!(mirrored[0].kind, edge.kind);

            let inverse = target.has_liked(user.telegram_id);
            assert_eq!(edge.is_mutual, inverse);
            assert_eq!(mirrored[0].is_mutual, inverse);
        }
        for edge in &user.likes_received {
            let liker = users
                .iter()
                .find(|u| u.telegram_id == edge.target_telegram_id)
                .expect("edge source exists");
            assert!(liker.has_liked(user.telegram_id));
        }
    }
}

#[tokio::test]
async fn test_like_then_like_back_becomes_mutual() {
    let harness = TestHarness::new();
    harness.approved_users(1, 2).await;
    let ledger = &harness.services.ledger;

    let first = ledger.like(1, 2).await.unwrap();
    assert!(first.success);
    assert!(!first.is_mutual);
    assert_eq!(first.remaining, 19);

    let second = ledger.like(2, 1).await.unwrap();
    assert!(second.is_mutual);
    assert_eq!(second.remaining, 19);

    let a = harness.user(1).await;
    let b = harness.user(2).await;
    assert!(a.given_edge_to(2).unwrap().is_mutual);
    assert!(b.given_edge_to(1).unwrap().is_mutual);
    assert!(a.likes_received.iter().all(|e| e.is_mutual));
    assert_symmetric(&[a, b]);

    let between = ledger.likes_between(1, 2).await.unwrap();
    assert!(between.is_mutual());

    let matches = ledger.matches(1).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].telegram_id, 2);
    assert!(matches[0].user.is_some());
}

#[tokio::test]
async fn test_super_like_spends_its_own_allowance() {
    let harness = TestHarness::new();
    harness.approved_users(1, 2).await;

    let result = harness.services.ledger.super_like(1, 2).await.unwrap();
    assert_eq!(result.kind, LikeKind::Super);
    assert_eq!(result.remaining, 2);

    let user = harness.user(1).await;
    assert_eq!(user.likes_quota.used_today, 0);
    assert_eq!(user.super_likes_quota.used_today, 1);
    assert_eq!(harness.user(2).await.likes_received[0].kind, LikeKind::Super);
}

#[tokio::test]
async fn test_duplicate_like_of_either_kind_is_rejected() {
    let harness = TestHarness::new();
    harness.approved_users(1, 2).await;
    let ledger = &harness.services.ledger;

    ledger.like(1, 2).await.unwrap();
    assert_matches!(ledger.like(1, 2).await, Err(TeamderError::DuplicateLike { from: 1, to: 2 }));
    assert_matches!(ledger.super_like(1, 2).await, Err(TeamderError::DuplicateLike { .. }));

    let user = harness.user(1).await;
    assert_eq!(user.likes_given.len(), 1);
    assert_eq!(user.likes_quota.used_today, 1);
    assert_eq!(user.super_likes_quota.used_today, 0);
}

#[tokio::test]
async fn test_rejections_leave_nothing_behind() {
    let harness = TestHarness::new();
    harness.approved_user(1).await;
    harness.user_with_status(2, ModerationStatus::Pending).await;
    harness.create_user(3).await;
    let ledger = &harness.services.ledger;

    assert_matches!(ledger.like(1, 1).await, Err(TeamderError::InvalidTarget(_)));
    assert_matches!(ledger.like(1, 404).await, Err(TeamderError::UserNotFound { telegram_id: 404 }));
    assert_matches!(ledger.like(404, 1).await, Err(TeamderError::UserNotFound { telegram_id: 404 }));
    assert_matches!(ledger.like(2, 1).await, Err(TeamderError::ProfileNotApproved { telegram_id: 2 }));
    assert_matches!(ledger.like(3, 1).await, Err(TeamderError::ProfileNotApproved { telegram_id: 3 }));

    for telegram_id in 1..=3 {
        let user = harness.user(telegram_id).await;
        assert!(user.likes_given.is_empty());
        assert!(user.likes_received.is_empty());
        assert_eq!(user.likes_quota.used_today, 0);
    }
    assert!(harness.dispatcher.settle().await.is_empty());
}

#[tokio::test]
async fn test_dislike_removes_edge_and_demotes_inverse() {
    let harness = TestHarness::new();
    harness.approved_users(1, 2).await;
    let ledger = &harness.services.ledger;

    ledger.like(1, 2).await.unwrap();
    ledger.like(2, 1).await.unwrap();

    assert!(ledger.dislike(1, 2).await.unwrap());

    let a = harness.user(1).await;
    let b = harness.user(2).await;
    assert!(!a.has_liked(2));
    assert!(b.likes_received.is_empty());
    assert!(!b.given_edge_to(1).unwrap().is_mutual);
    assert!(!a.likes_received[0].is_mutual);
    assert_symmetric(&[a.clone(), b.clone()]);

    // repeating the dislike is a no-op
    assert!(!ledger.dislike(1, 2).await.unwrap());
    assert_eq!(harness.user(1).await, a);
    assert_eq!(harness.user(2).await, b);

    // the spent unit is not refunded
    assert_eq!(a.likes_quota.used_today, 1);
}

#[tokio::test]
async fn test_dislike_edge_cases() {
    let harness = TestHarness::new();
    harness.approved_users(1, 3).await;
    let ledger = &harness.services.ledger;
    ledger.like(3, 2).await.unwrap();
    let (a, b) = (harness.user(1).await, harness.user(2).await);

    // no edge from 1 to 2: nothing is written on either side
    assert!(!ledger.dislike(1, 2).await.unwrap());
    let (a_after, b_after) = (harness.user(1).await, harness.user(2).await);
    assert_eq!(a_after.version, a.version);
    assert_eq!(b_after.version, b.version);
    assert_eq!(a_after.likes_given, a.likes_given);
    assert_eq!(a_after.likes_received, a.likes_received);
    assert_eq!(b_after.likes_given, b.likes_given);
    assert_eq!(b_after.likes_received, b.likes_received);
    assert_eq!(b_after.likes_received.len(), 1);
    assert_eq!((a_after, b_after), (a, b));

    assert_matches!(ledger.dislike(1, 1).await, Err(TeamderError::InvalidTarget(_)));
    assert_matches!(ledger.dislike(1, 77).await, Err(TeamderError::UserNotFound { .. }));
}

#[tokio::test]
async fn test_like_after_dislike_is_allowed_again() {
    let harness = TestHarness::new();
    harness.approved_users(1, 2).await;
    let ledger = &harness.services.ledger;

    ledger.like(1, 2).await.unwrap();
    ledger.dislike(1, 2).await.unwrap();
    let again = ledger.like(1, 2).await.unwrap();
    assert_eq!(again.remaining, 18);
    assert_eq!(harness.user(2).await.likes_received.len(), 1);
}

#[tokio::test]
async fn test_daily_quota_runs_out_and_resets() {
    let harness = TestHarness::new();
    harness.approved_users(1, 27).await;
    let ledger = &harness.services.ledger;

    for target in 2..=21 {
        ledger.like(1, target).await.unwrap();
    }
    assert_matches!(
        ledger.like(1, 22).await,
        Err(TeamderError::QuotaExceeded { kind: QuotaKind::Like })
    );
    assert!(!harness.user(1).await.has_liked(22));

    // buying more lifts the cap the same day
    harness.give_stars(1, 15).await;
    harness
        .services
        .currency_service
        .purchase_extra(1, QuotaKind::Like, 5, 15)
        .await
        .unwrap();
    for (target, remaining) in (22..=26).zip((0..5).rev()) {
        let result = ledger.like(1, target).await.unwrap();
        assert_eq!(result.remaining, remaining);
    }
    assert_matches!(
        ledger.like(1, 27).await,
        Err(TeamderError::QuotaExceeded { kind: QuotaKind::Like })
    );
    let liker = harness.user(1).await;
    assert_eq!(liker.likes_quota.used_today, 25);
    assert_eq!(liker.likes_given.len(), 25);
    assert!(!liker.has_liked(27));

    harness.clock.advance(Duration::days(1));
    let info = harness.services.profile_service.likes_info(1).await.unwrap();
    assert_eq!(info.likes.used_today, 0);
    assert_eq!(info.likes.extra, 5);
    assert_eq!(info.likes.remaining, 25);
}

#[tokio::test]
async fn test_like_and_match_notifications() {
    let harness = TestHarness::new();
    harness.approved_users(1, 2).await;
    let ledger = &harness.services.ledger;

    ledger.like(1, 2).await.unwrap();
    let sent = harness.dispatcher.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].telegram_id, 2);
    assert_eq!(sent[0].kind(), Some(NotificationType::Like));
    assert_eq!(sent[0].metadata.from_telegram_id, Some(1));

    ledger.super_like(2, 1).await.unwrap();
    let sent = harness.dispatcher.wait_for(4).await;
    assert_eq!(sent.len(), 4);

    let to_first = harness.dispatcher.sent_to(1).await;
    assert!(to_first.iter().any(|n| n.kind() == Some(NotificationType::SuperLike)));
    assert!(to_first.iter().any(|n| n.kind() == Some(NotificationType::Match)));
    let to_second = harness.dispatcher.sent_to(2).await;
    assert!(to_second.iter().any(|n| n.kind() == Some(NotificationType::Match)));

    let inbox = harness.services.notification_service.recent(1, 10).await.unwrap();
    assert_eq!(inbox.len(), 2);
}

#[tokio::test]
async fn test_match_notifications_can_be_switched_off() {
    let mut settings = test_settings();
    settings.features.match_notifications = false;
    let harness = TestHarness::with_settings(settings);
    harness.approved_users(1, 2).await;

    harness.services.ledger.like(1, 2).await.unwrap();
    harness.services.ledger.like(2, 1).await.unwrap();

    let sent = harness.dispatcher.settle().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|n| n.kind() == Some(NotificationType::Like)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_never_exceed_quota() {
    let harness = Arc::new(TestHarness::new());
    harness.approved_users(1, 31).await;

    let tasks = (2..=31).map(|target| {
        let harness = harness.clone();
        tokio::spawn(async move { harness.services.ledger.like(1, target).await })
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 20);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, TeamderError::QuotaExceeded { .. })));

    let liker = harness.user(1).await;
    assert_eq!(liker.likes_quota.used_today, 20);
    assert_eq!(liker.likes_given.len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_crossing_likes_stay_symmetric() {
    let harness = Arc::new(TestHarness::new());
    harness.approved_users(1, 2).await;

    let a = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.services.ledger.like(1, 2).await })
    };
    let b = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.services.ledger.like(2, 1).await })
    };
    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

    // exactly one of the two saw the other's edge
    assert!(a.is_mutual ^ b.is_mutual);
    let users = vec![harness.user(1).await, harness.user(2).await];
    assert!(users.iter().all(|u| u.likes_given[0].is_mutual));
    assert_symmetric(&users);
}

/// Store whose pair writes always lose the version race
struct AlwaysConflicting(MemoryUserStore);

#[async_trait]
impl UserStore for AlwaysConflicting {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> teamder::Result<Option<User>> {
        self.0.find_by_telegram_id(telegram_id).await
    }

    async fn find_many(&self, telegram_ids: &[i64]) -> teamder::Result<Vec<User>> {
        self.0.find_many(telegram_ids).await
    }

    async fn create(&self, request: &CreateUserRequest, now: DateTime<Utc>) -> teamder::Result<User> {
        self.0.create(request, now).await
    }

    async fn save(&self, user: &User) -> teamder::Result<User> {
        self.0.save(user).await
    }

    async fn save_pair(&self, first: &User, _second: &User) -> teamder::Result<(User, User)> {
        Err(TeamderError::VersionConflict {
            telegram_id: first.telegram_id,
        })
    }

    async fn approved_candidates(&self, after_id: i64, batch: i64) -> teamder::Result<Vec<User>> {
        self.0.approved_candidates(after_id, batch).await
    }

    async fn find_by_moderation_status(&self, status: ModerationStatus) -> teamder::Result<Vec<User>> {
        self.0.find_by_moderation_status(status).await
    }
}

#[tokio::test]
async fn test_exhausted_retries_report_persistence_error() {
    let harness = TestHarness::new();
    let store = AlwaysConflicting(MemoryUserStore::new());
    for telegram_id in 1..=2 {
        let mut user = store
            .create(
                &CreateUserRequest {
                    telegram_id,
                    username: None,
                    first_name: None,
                    photo_url: None,
                    language_code: None,
                    daily_likes: 20,
                    daily_super_likes: 3,
                },
                harness.clock.now(),
            )
            .await
            .unwrap();
        user.profile = Some(test_profile(telegram_id, ModerationStatus::Approved));
        store.save(&user).await.unwrap();
    }
    let store = Arc::new(store);

    let ledger = RelationshipLedger::new(
        store.clone(),
        QuotaTracker::new(Arc::new(harness.clock.clone())),
        harness.services.notification_service.clone(),
        3,
        true,
    );

    assert_matches!(ledger.like(1, 2).await, Err(TeamderError::Persistence(_)));
    let liker = store.find_by_telegram_id(1).await.unwrap().unwrap();
    assert!(liker.likes_given.is_empty());
    assert_eq!(liker.likes_quota.used_today, 0);
    assert!(harness.dispatcher.settle().await.is_empty());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Like(i64, i64),
        SuperLike(i64, i64),
        Dislike(i64, i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        (0..3u8, 1..=4i64, 1..=4i64).prop_map(|(kind, from, to)| match kind {
            0 => Op::Like(from, to),
            1 => Op::SuperLike(from, to),
            _ => Op::Dislike(from, to),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_edges_stay_symmetric(ops in proptest::collection::vec(op(), 1..40)) {
            let users = tokio_test::block_on(async {
                let harness = TestHarness::new();
                harness.approved_users(1, 4).await;
                for op in ops {
                    let ledger = &harness.services.ledger;
                    // rejections are part of the property: they must not leave half-written edges
                    let _ = match op {
                        Op::Like(from, to) => ledger.like(from, to).await.map(|_| ()),
                        Op::SuperLike(from, to) => ledger.super_like(from, to).await.map(|_| ()),
                        Op::Dislike(from, to) => ledger.dislike(from, to).await.map(|_| ()),
                    };
                }
                let mut users = Vec::new();
                for telegram_id in 1..=4 {
                    users.push(harness.user(telegram_id).await);
                }
                users
            });

            assert_symmetric(&users);
            for user in &users {
                prop_assert!(user.likes_quota.used_today <= user.likes_quota.total_available());
                prop_assert!(user.super_likes_quota.used_today <= user.super_likes_quota.total_available());
                prop_assert!(!user.has_liked(user.telegram_id));
            }
        }
    }
}
