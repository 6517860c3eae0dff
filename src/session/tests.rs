//! Integration tests for session management
//!
//! Exercises the acquire/probe/heal cycle and disposal behavior of the
//! session registry against the mock engine.

use std::sync::Arc;

use crate::engine::{MockEngine, SessionOptions};
use crate::session::{SessionRegistry, DEFAULT_SESSION_ID};

/// Helper to build a registry alongside the engine driving it
fn registry_with_engine() -> (Arc<SessionRegistry>, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    let registry = Arc::new(SessionRegistry::new(Arc::clone(&engine) as _));
    (registry, engine)
}

#[tokio::test]
async fn test_acquire_reuses_live_handle() {
    let (registry, engine) = registry_with_engine();

    let first = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("first acquire failed");
    let second = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("second acquire failed");

    assert_eq!(engine.created_handles(), 1);
    assert!(Arc::ptr_eq(&first.handle(), &second.handle()));
}

#[tokio::test]
async fn test_acquire_probes_before_reuse() {
    let (registry, engine) = registry_with_engine();

    registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("acquire failed");
    registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("acquire failed");

    let handle = engine.last_handle().await.expect("no handle created");
    assert_eq!(handle.probe_count(), 1);
}

#[tokio::test]
async fn test_acquire_heals_dead_session() {
    let (registry, engine) = registry_with_engine();

    let first = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("first acquire failed");

    let dead = engine.last_handle().await.expect("no handle created");
    dead.set_probe_error("Session expired").await;

    let second = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("healing acquire failed");

    assert_eq!(engine.created_handles(), 2);
    assert!(!Arc::ptr_eq(&first.handle(), &second.handle()));
    assert_eq!(second.id(), DEFAULT_SESSION_ID);

    // The replacement is now the cached handle; further acquires reuse it.
    let third = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("post-heal acquire failed");
    assert_eq!(engine.created_handles(), 2);
    assert!(Arc::ptr_eq(&second.handle(), &third.handle()));
}

#[tokio::test]
async fn test_heal_discards_dead_handle_best_effort() {
    let (registry, engine) = registry_with_engine();

    registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("acquire failed");

    let dead = engine.last_handle().await.expect("no handle created");
    dead.set_probe_error("Target page, context or browser has been closed")
        .await;
    dead.set_close_error("engine unreachable").await;

    let healed = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("healing acquire failed");

    assert_eq!(engine.created_handles(), 2);
    assert_eq!(healed.id(), DEFAULT_SESSION_ID);
}

#[tokio::test]
async fn test_unrecognized_probe_failure_propagates() {
    let (registry, engine) = registry_with_engine();

    registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("acquire failed");

    let handle = engine.last_handle().await.expect("no handle created");
    handle.set_probe_error("connection reset by peer").await;

    let err = registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect_err("acquire should propagate the probe failure");
    assert!(err.to_string().contains("connection reset by peer"));

    // No replacement was created and the handle stays cached.
    assert_eq!(engine.created_handles(), 1);
    assert!(registry.get(DEFAULT_SESSION_ID).await.is_some());
}

#[tokio::test]
async fn test_resume_id_is_forwarded_to_engine() {
    let (registry, engine) = registry_with_engine();

    let options = SessionOptions {
        resume_id: Some("sess-running-elsewhere".to_string()),
        ..Default::default()
    };
    let session = registry
        .acquire("resumed", options)
        .await
        .expect("acquire failed");

    assert_eq!(session.id(), "resumed");
    assert_eq!(session.handle().id(), "sess-running-elsewhere");
    assert_eq!(engine.created_handles(), 1);
}

#[tokio::test]
async fn test_release_disposes_and_is_idempotent() {
    let (registry, engine) = registry_with_engine();

    registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("acquire failed");
    let handle = engine.last_handle().await.expect("no handle created");

    assert!(registry.release(DEFAULT_SESSION_ID).await);
    assert!(handle.is_closed());
    assert!(registry.get(DEFAULT_SESSION_ID).await.is_none());

    // Releasing again is a no-op.
    assert!(!registry.release(DEFAULT_SESSION_ID).await);
}

#[tokio::test]
async fn test_release_swallows_disposal_failure() {
    let (registry, engine) = registry_with_engine();

    registry
        .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
        .await
        .expect("acquire failed");
    let handle = engine.last_handle().await.expect("no handle created");
    handle.set_close_error("engine unreachable").await;

    assert!(registry.release(DEFAULT_SESSION_ID).await);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_release_all_disposes_every_session() {
    let (registry, engine) = registry_with_engine();

    for id in ["a", "b", "c"] {
        registry
            .acquire(id, SessionOptions::default())
            .await
            .expect("acquire failed");
    }

    // One failing disposal must not shield the others.
    let handles = engine.handles().await;
    handles[1].set_close_error("engine unreachable").await;

    registry.release_all().await;

    assert!(registry.is_empty().await);
    assert!(handles[0].is_closed());
    assert!(handles[2].is_closed());
}

#[tokio::test]
async fn test_concurrent_acquire_creates_once() {
    let (registry, engine) = registry_with_engine();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await
            .expect("task panicked")
            .expect("acquire failed");
    }

    assert_eq!(engine.created_handles(), 1);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_sessions_are_isolated_by_id() {
    let (registry, engine) = registry_with_engine();

    let a = registry
        .acquire("a", SessionOptions::default())
        .await
        .expect("acquire failed");
    let b = registry
        .acquire("b", SessionOptions::default())
        .await
        .expect("acquire failed");

    assert_eq!(engine.created_handles(), 2);
    assert!(!Arc::ptr_eq(&a.handle(), &b.handle()));

    registry.release("a").await;
    assert!(registry.get("a").await.is_none());
    assert!(registry.get("b").await.is_some());
}
