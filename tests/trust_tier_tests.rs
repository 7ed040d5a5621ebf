//! Trust service behaviour against an in-memory store

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use lending_server::error::ApiError;
use lending_server::models::VerificationStatus;
use lending_server::policy::TierPolicy;
use lending_server::trust::{TrustService, TrustStore, TrustTier, UserTrustRecord};

#[derive(Default)]
struct FakeStore {
    user: Mutex<Option<UserTrustRecord>>,
    active_vouches: i64,
    policies: Vec<TierPolicy>,
    fail_user_lookup: bool,
    fail_policy_query: bool,
    count_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

impl FakeStore {
    fn with_user(user: UserTrustRecord, active_vouches: i64) -> Self {
        Self {
            user: Mutex::new(Some(user)),
            active_vouches,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TrustStore for FakeStore {
    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserTrustRecord>, sqlx::Error> {
        if self.fail_user_lookup {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .user
            .lock()
            .unwrap()
            .clone()
            .filter(|u| u.id == user_id))
    }

    async fn count_active_vouches(&self, _user_id: Uuid) -> Result<i64, sqlx::Error> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.active_vouches)
    }

    async fn save_tier(
        &self,
        _user_id: Uuid,
        tier: TrustTier,
        vouch_count: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(user) = self.user.lock().unwrap().as_mut() {
            user.trust_tier = Some(tier);
            user.vouch_count = vouch_count as i32;
            user.tier_updated_at = Some(updated_at);
        }
        Ok(())
    }

    async fn mark_tier_stale(&self, _user_id: Uuid) -> Result<(), sqlx::Error> {
        if let Some(user) = self.user.lock().unwrap().as_mut() {
            user.tier_updated_at = None;
        }
        Ok(())
    }

    async fn active_policies_for_tier(
        &self,
        tier: TrustTier,
    ) -> Result<Vec<TierPolicy>, sqlx::Error> {
        if self.fail_policy_query {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .policies
            .iter()
            .filter(|p| p.tier_id == tier && p.is_active)
            .cloned()
            .collect())
    }
}

fn user(status: VerificationStatus) -> UserTrustRecord {
    UserTrustRecord {
        id: Uuid::new_v4(),
        verification_status: status,
        is_blocked: false,
        trust_tier: None,
        vouch_count: 0,
        tier_updated_at: None,
    }
}

fn policy(lender_id: Uuid, tier: TrustTier, rate: f64, max: f64) -> TierPolicy {
    TierPolicy {
        id: Uuid::new_v4(),
        lender_id,
        tier_id: tier,
        interest_rate: rate,
        max_loan_amount: max,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn service(store: Arc<FakeStore>) -> TrustService {
    TrustService::new(store, 3600)
}

#[tokio::test]
async fn test_tier_boundaries() {
    let cases = [
        (0, TrustTier::Low),
        (2, TrustTier::Low),
        (3, TrustTier::Building),
        (5, TrustTier::Building),
        (6, TrustTier::Established),
        (10, TrustTier::Established),
        (11, TrustTier::High),
        (40, TrustTier::High),
    ];

    for (count, expected) in cases {
        let record = user(VerificationStatus::Verified);
        let id = record.id;
        let store = Arc::new(FakeStore::with_user(record, count));

        let snapshot = service(store.clone()).calculate_tier(id).await.unwrap();

        assert_eq!(snapshot.tier, expected, "count {}", count);
        assert_eq!(snapshot.vouch_count, count);
        assert!(snapshot.recomputed);
        assert_eq!(store.save_calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_fresh_tier_served_without_counting() {
    let mut record = user(VerificationStatus::Verified);
    record.trust_tier = Some(TrustTier::Building);
    record.vouch_count = 4;
    record.tier_updated_at = Some(Utc::now() - Duration::minutes(10));
    let id = record.id;

    // The live count disagrees; a cached read must not see it
    let store = Arc::new(FakeStore::with_user(record, 12));
    let snapshot = service(store.clone()).get_tier(id).await.unwrap();

    assert_eq!(snapshot.tier, TrustTier::Building);
    assert_eq!(snapshot.vouch_count, 4);
    assert!(!snapshot.recomputed);
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.save_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stale_tier_is_recomputed() {
    let mut record = user(VerificationStatus::Verified);
    record.trust_tier = Some(TrustTier::Building);
    record.vouch_count = 4;
    record.tier_updated_at = Some(Utc::now() - Duration::hours(2));
    let id = record.id;

    let store = Arc::new(FakeStore::with_user(record, 12));
    let trust = service(store.clone());
    let snapshot = trust.get_tier(id).await.unwrap();

    assert_eq!(snapshot.tier, TrustTier::High);
    assert!(snapshot.recomputed);
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.save_calls.load(Ordering::SeqCst), 1);

    // The recompute refreshed the cache
    let again = trust.get_tier(id).await.unwrap();
    assert_eq!(again.tier, TrustTier::High);
    assert!(!again.recomputed);
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidated_tier_is_recomputed_on_next_read() {
    let mut record = user(VerificationStatus::Verified);
    record.trust_tier = Some(TrustTier::Building);
    record.vouch_count = 4;
    record.tier_updated_at = Some(Utc::now() - Duration::minutes(1));
    let id = record.id;

    let store = Arc::new(FakeStore::with_user(record, 6));
    let trust = service(store.clone());
    trust.invalidate_tier(id).await.unwrap();

    let snapshot = trust.get_tier(id).await.unwrap();
    assert_eq!(snapshot.tier, TrustTier::Established);
    assert!(snapshot.recomputed);
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_never_computed_tier_is_recomputed() {
    let record = user(VerificationStatus::Unverified);
    let id = record.id;
    let store = Arc::new(FakeStore::with_user(record, 1));

    let snapshot = service(store.clone()).get_tier(id).await.unwrap();

    assert_eq!(snapshot.tier, TrustTier::Low);
    assert_eq!(snapshot.vouches_to_next_tier, Some(2));
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let store = Arc::new(FakeStore::default());
    let result = service(store.clone()).get_tier(Uuid::new_v4()).await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_eligibility_requires_verification() {
    for (status, blocked, expected) in [
        (VerificationStatus::Verified, false, true),
        (VerificationStatus::Verified, true, false),
        (VerificationStatus::Pending, false, false),
        (VerificationStatus::Unverified, false, false),
        (VerificationStatus::Rejected, false, false),
    ] {
        let mut record = user(status);
        record.is_blocked = blocked;
        let id = record.id;
        let store = Arc::new(FakeStore::with_user(record, 0));

        let eligibility = service(store).check_vouch_eligibility(id).await.unwrap();
        assert_eq!(eligibility.can_vouch, expected, "{:?} blocked={}", status, blocked);
        assert_eq!(eligibility.reason.is_some(), !expected);
    }
}

#[tokio::test]
async fn test_eligibility_unknown_user() {
    let store = Arc::new(FakeStore::default());
    let eligibility = service(store)
        .check_vouch_eligibility(Uuid::new_v4())
        .await
        .unwrap();

    assert!(!eligibility.can_vouch);
    assert_eq!(eligibility.reason.as_deref(), Some("User not found"));
}

#[tokio::test]
async fn test_eligibility_store_failure_is_an_error() {
    let store = Arc::new(FakeStore {
        fail_user_lookup: true,
        ..Default::default()
    });
    let result = service(store).check_vouch_eligibility(Uuid::new_v4()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_matching_filters_and_sorts() {
    let record = user(VerificationStatus::Verified);
    let borrower = record.id;
    let cheap = Uuid::new_v4();
    let pricey = Uuid::new_v4();

    let mut store = FakeStore::with_user(record, 4);
    store.policies = vec![
        policy(pricey, TrustTier::Building, 18.0, 5_000.0),
        policy(cheap, TrustTier::Building, 9.5, 2_000.0),
        // Too small for the request
        policy(Uuid::new_v4(), TrustTier::Building, 5.0, 500.0),
        // Wrong tier
        policy(Uuid::new_v4(), TrustTier::High, 1.0, 50_000.0),
        // Borrower's own policy
        policy(borrower, TrustTier::Building, 2.0, 10_000.0),
    ];

    let result = service(Arc::new(store))
        .find_eligible_lenders(borrower, 1_000.0)
        .await
        .unwrap();

    assert_eq!(result.tier, TrustTier::Building);
    assert_eq!(result.total_matches, 2);
    let lenders: Vec<Uuid> = result.lenders.iter().map(|m| m.lender_id).collect();
    assert_eq!(lenders, vec![cheap, pricey]);
    assert!(result
        .lenders
        .iter()
        .all(|m| m.max_loan_amount >= 1_000.0 && m.lender_id != borrower));
    assert_eq!(result.best_rate, Some(9.5));
}

#[tokio::test]
async fn test_matching_policy_failure_returns_no_matches() {
    let record = user(VerificationStatus::Verified);
    let borrower = record.id;
    let mut store = FakeStore::with_user(record, 0);
    store.fail_policy_query = true;

    let result = service(Arc::new(store))
        .find_eligible_lenders(borrower, 100.0)
        .await
        .unwrap();

    assert_eq!(result.total_matches, 0);
    assert!(result.lenders.is_empty());
    assert_eq!(result.best_rate, None);
}

#[tokio::test]
async fn test_matching_rejects_non_positive_amount() {
    let record = user(VerificationStatus::Verified);
    let borrower = record.id;
    let store = Arc::new(FakeStore::with_user(record, 0));
    let trust = service(store.clone());

    for amount in [0.0, -10.0, f64::NAN] {
        let result = trust.find_eligible_lenders(borrower, amount).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
}
