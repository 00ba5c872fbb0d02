//! Audit recorder tests: append-only history, per-actor queries and
//! best-effort failure handling.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vaultkeeper_audit::{
    AuditAction, AuditError, AuditLog, AuditRecorder, AuditStore, InMemoryAuditStore,
    NewAuditEntry, RequestContext, Result, UserId,
};

fn context() -> RequestContext {
    RequestContext::new(Some("203.0.113.9".to_string()), Some("Mozilla/5.0".to_string()))
}

/// Fails every write, counting attempts
#[derive(Default)]
struct FlakyStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl AuditStore for FlakyStore {
    async fn append(&self, _entry: NewAuditEntry) -> Result<AuditLog> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::Persistence("connection reset".to_string()))
    }

    async fn list_for(&self, _actor: UserId) -> Result<Vec<AuditLog>> {
        Err(AuditError::Persistence("connection reset".to_string()))
    }
}

// ============================================================================
// BASIC AUDIT LOGGING
// ============================================================================

#[tokio::test]
async fn test_every_action_produces_one_row() {
    let store = Arc::new(InMemoryAuditStore::new());
    let recorder = AuditRecorder::new(store.clone());

    for action in AuditAction::ALL {
        let outcome = recorder
            .record(Some(1), action, format!("did {}", action), &context())
            .await;
        assert!(outcome.is_recorded());
    }

    let rows = recorder.list(1).await.unwrap();
    assert_eq!(rows.len(), AuditAction::ALL.len());

    for action in AuditAction::ALL {
        let matching = rows.iter().filter(|r| r.action == action.as_str()).count();
        assert_eq!(matching, 1, "expected exactly one {} row", action);
    }
}

#[tokio::test]
async fn test_rows_carry_request_metadata() {
    let recorder = AuditRecorder::new(Arc::new(InMemoryAuditStore::new()));

    recorder.user_login(5, &context()).await;

    let rows = recorder.list(5).await.unwrap();
    assert_eq!(rows[0].ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(rows[0].user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[tokio::test]
async fn test_unknown_actor_rows_not_listed() {
    let recorder = AuditRecorder::new(Arc::new(InMemoryAuditStore::new()));

    let outcome = recorder
        .record(None, AuditAction::UserLogout, "User logged out", &context())
        .await;

    assert_eq!(outcome.entry().unwrap().user_id, None);
    assert!(recorder.list(1).await.unwrap().is_empty());
}

// ============================================================================
// AUDIT QUERY TESTS
// ============================================================================

#[tokio::test]
async fn test_list_most_recent_first_and_scoped() {
    let recorder = AuditRecorder::new(Arc::new(InMemoryAuditStore::new()));

    recorder.user_registered(1, "Alice", &context()).await;
    recorder.user_login(2, &context()).await;
    recorder.user_login(1, &context()).await;
    recorder
        .record(Some(1), AuditAction::ViewedVault, "Viewed vault items", &context())
        .await;
    recorder.user_logout(2, &context()).await;

    let rows = recorder.list(1).await.unwrap();
    let actions: Vec<&str> = rows.iter().map(|r| r.action.as_str()).collect();

    assert_eq!(actions, vec!["viewed_vault", "user_login", "user_registered"]);
    assert!(rows.iter().all(|r| r.user_id == Some(1)));
    assert!(rows.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

// ============================================================================
// FAILURE TOLERANCE
// ============================================================================

#[tokio::test]
async fn test_store_failures_never_reach_caller() {
    let store = Arc::new(FlakyStore::default());
    let recorder = AuditRecorder::new(store.clone());

    for _ in 0..3 {
        let outcome = recorder.user_login(1, &context()).await;
        assert!(!outcome.is_recorded());
    }

    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_detached_failure_is_contained() {
    let recorder = AuditRecorder::new(Arc::new(FlakyStore::default()));

    let handle = recorder.spawn_record(
        Some(1),
        AuditAction::DeletedVaultItem,
        "Deleted vault item: GitHub",
        &context(),
    );

    let outcome = handle.await.unwrap();
    assert!(outcome.entry().is_none());
}

#[tokio::test]
async fn test_listing_errors_are_reported() {
    let recorder = AuditRecorder::new(Arc::new(FlakyStore::default()));

    let err = recorder.list(1).await.unwrap_err();
    assert!(matches!(err, AuditError::Persistence(_)));
}
