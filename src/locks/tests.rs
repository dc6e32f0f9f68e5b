//! Tests for the locks subsystem.

use super::*;
use crate::context::RepoContext;
use crate::error::RepokitError;
use crate::test_support::create_private_repo;
use chrono::{Duration, Utc};
use tempfile::TempDir;

const STALE_MINUTES: u32 = 120;

fn create_test_context() -> (TempDir, RepoContext) {
    let temp_dir = create_private_repo();
    let ctx = RepoContext::resolve_from(temp_dir.path()).unwrap();
    (temp_dir, ctx)
}

#[test]
fn test_lock_metadata_creation() {
    let meta = LockMetadata::new("adopt");

    assert!(meta.owner.contains('@'));
    assert!(meta.pid.is_some());
    assert_eq!(meta.action, "adopt");
    assert!(meta.age().num_minutes() < 1);
}

#[test]
fn test_lock_metadata_serialization() {
    let meta = LockMetadata::new("promote");
    let json = meta.to_json().unwrap();

    assert!(json.contains("owner"));
    assert!(json.contains("created_at"));

    let parsed: LockMetadata = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.action, "promote");
}

#[test]
fn test_lock_metadata_age_and_staleness() {
    let mut meta = LockMetadata::new("test");
    assert!(meta.age_string().ends_with('m'));
    assert!(!meta.is_stale(STALE_MINUTES));

    meta.created_at = Utc::now() - Duration::hours(2) - Duration::minutes(5);
    assert!(meta.age_string().contains('h'));
    assert!(meta.is_stale(STALE_MINUTES));

    meta.created_at = Utc::now() - Duration::days(3);
    assert!(meta.age_string().contains('d'));
}

#[test]
fn test_repository_lock_released_on_drop() {
    let (_temp_dir, ctx) = create_test_context();

    let guard = acquire_repository_lock(&ctx, "adopt").unwrap();
    assert!(ctx.repository_lock_path().exists());
    let meta = LockMetadata::from_file(ctx.repository_lock_path()).unwrap();
    assert_eq!(meta.action, "adopt");

    drop(guard);
    assert!(!ctx.repository_lock_path().exists());
}

#[test]
fn test_repository_lock_contention_is_lock_error() {
    let (_temp_dir, ctx) = create_test_context();

    let first = acquire_repository_lock(&ctx, "adopt").unwrap();
    let err = acquire_repository_lock(&ctx, "cascade").unwrap_err();
    assert!(matches!(err, RepokitError::LockError(_)));
    assert!(err.to_string().contains("action: adopt"));

    first.release().unwrap();
    acquire_repository_lock(&ctx, "cascade").unwrap();
}

#[test]
fn test_branch_lock_contention_is_branch_locked() {
    let (_temp_dir, ctx) = create_test_context();

    let _held = acquire_branch_lock(&ctx, "main", "adopt").unwrap();
    let err = acquire_branch_lock(&ctx, "main", "promote").unwrap_err();
    match err {
        RepokitError::BranchLocked { branch, reason } => {
            assert_eq!(branch, "main");
            assert!(reason.contains("lock clear"));
        }
        other => panic!("expected BranchLocked, got {:?}", other),
    }

    // Other branches are independent.
    acquire_branch_lock(&ctx, "dev", "promote").unwrap();
}

#[test]
fn test_list_locks() {
    let (_temp_dir, ctx) = create_test_context();
    assert!(list_locks(&ctx, STALE_MINUTES).unwrap().is_empty());

    let _repo = acquire_repository_lock(&ctx, "adopt").unwrap();
    let _branch = acquire_branch_lock(&ctx, "feature/x", "adopt").unwrap();

    let locks = list_locks(&ctx, STALE_MINUTES).unwrap();
    let names: Vec<(&str, LockType)> = locks
        .iter()
        .map(|l| (l.name.as_str(), l.lock_type))
        .collect();
    assert_eq!(
        names,
        vec![
            ("feature/x", LockType::Branch),
            ("repository", LockType::Repository)
        ]
    );
}

#[test]
fn test_list_locks_detects_stale() {
    let (_temp_dir, ctx) = create_test_context();

    let stale_meta = LockMetadata {
        owner: "test@host".to_string(),
        pid: Some(12345),
        created_at: Utc::now() - Duration::minutes(200),
        action: "cascade".to_string(),
    };
    std::fs::create_dir_all(&ctx.locks_dir).unwrap();
    std::fs::write(ctx.branch_lock_path("dev"), stale_meta.to_json().unwrap()).unwrap();

    let locks = list_locks(&ctx, STALE_MINUTES).unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].name, "dev");
    assert!(locks[0].is_stale);
    assert!(locks[0].to_string().contains("STALE"));
}

#[test]
fn test_clear_lock() {
    let (_temp_dir, ctx) = create_test_context();
    std::fs::create_dir_all(&ctx.locks_dir).unwrap();
    let meta = LockMetadata::new("adopt");
    std::fs::write(ctx.repository_lock_path(), meta.to_json().unwrap()).unwrap();
    std::fs::write(ctx.branch_lock_path("main"), meta.to_json().unwrap()).unwrap();

    let cleared = clear_lock(&ctx, "repository", STALE_MINUTES).unwrap();
    assert_eq!(cleared.lock_type, LockType::Repository);
    assert!(!ctx.repository_lock_path().exists());

    let cleared = clear_lock(&ctx, "main", STALE_MINUTES).unwrap();
    assert_eq!(cleared.lock_type, LockType::Branch);
    assert!(!ctx.branch_lock_path("main").exists());
}

#[test]
fn test_clear_lock_nonexistent_fails() {
    let (_temp_dir, ctx) = create_test_context();

    let err = clear_lock(&ctx, "staging", STALE_MINUTES).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_get_owner_string() {
    let owner = metadata::get_owner_string();
    assert!(owner.contains('@'));
}
