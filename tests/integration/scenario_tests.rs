//! End-to-end flows over the reconciler, executor, and merge engine.

use skillsync::core::models::{ChangeEventType, DeploymentStatus};
use skillsync::error::SyncError;
use skillsync::merge::{apply_merge, merge_paths, MergeResolution, ResolutionChoice};
use skillsync::tools::Tool;

use crate::common::{checksum, World};

#[test]
fn matching_deployment_reconciles_synced() {
    let world = World::new();
    world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");

    let detail = world.reconciler().reconcile_one("dep-a").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Synced);
    assert_eq!(detail.library_checksum, detail.deployed_checksum);
}

#[test]
fn edited_deployment_reconciles_diverged_with_event() {
    let world = World::new();
    let path = world.add_deployment("dep-b", Tool::Cursor, "p2/.cursor/skills/frontend-design");
    std::fs::write(path.join("SKILL.md"), b"v1 locally edited\n").unwrap();

    let detail = world.reconciler().reconcile_one("dep-b").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Diverged);

    let events = world.db.list_change_events(None).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ChangeEventType::ChecksumMismatch);
    assert_eq!(events[0].deployment_id, "dep-b");
    // Old side is the last-known fingerprint, new side the observed one.
    assert_eq!(events[0].old_checksum, detail.library_checksum);
    assert_eq!(events[0].new_checksum, detail.deployed_checksum);
}

#[test]
fn deleted_deployment_goes_missing_then_resyncs() {
    let world = World::new();
    let path = world.add_deployment("dep-c", Tool::Trae, "p3/.trae/skills/frontend-design");

    std::fs::remove_dir_all(&path).unwrap();
    let detail = world.reconciler().reconcile_one("dep-c").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Missing);

    // Recreate from the library, then converge.
    world.executor().sync_deployment("dep-c").unwrap();
    assert!(path.join("SKILL.md").exists());

    let detail = world.reconciler().reconcile_one("dep-c").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Synced);
}

#[test]
fn merge_conflict_resolved_with_library_version() {
    let world = World::new();
    let deployed = world.add_deployment("dep-d", Tool::Codex, "p4/.agents/skills/frontend-design");

    // Library moves to v2, deployment gets a local edit.
    std::fs::write(world.library.join("SKILL.md"), b"v2\n").unwrap();
    std::fs::write(deployed.join("SKILL.md"), b"v1-edited\n").unwrap();

    let result = merge_paths(None, &world.library, &deployed).unwrap();
    assert_eq!(result.conflict_count, 1);
    assert_eq!(result.files[0].path, "SKILL.md");

    // Refuses without a resolution.
    let target = world.tmp.path().join("merged");
    let err = apply_merge(&target, &result, &[]).unwrap_err();
    assert!(matches!(err, SyncError::MergeConflictUnresolved { .. }));

    // Applies with one.
    let report = apply_merge(
        &target,
        &result,
        &[MergeResolution {
            path: "SKILL.md".into(),
            choice: ResolutionChoice::UseLeft,
        }],
    )
    .unwrap();
    assert_eq!(report.files_written, 1);
    assert!(report.failures.is_empty());
    assert_eq!(
        std::fs::read_to_string(target.join("SKILL.md")).unwrap(),
        "v2\n"
    );
}

#[test]
fn watcher_change_propagates_on_full_sync() {
    let world = World::new();
    let trigger = world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");
    let sibling = world.add_deployment("dep-b", Tool::Cursor, "p2/.cursor/skills/frontend-design");

    // External edit lands on deployment A and gets absorbed.
    std::fs::write(trigger.join("SKILL.md"), b"v2 from windsurf\n").unwrap();
    world.watcher().absorb_change("dep-a").unwrap();

    // B is still on the old content: diverged against the updated library.
    let detail = world.reconciler().reconcile_one("dep-b").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Diverged);

    // Operator chooses full sync; B converges to the new checksum.
    world.watcher().full_sync("skill-1", &world.executor()).unwrap();
    let detail = world.reconciler().reconcile_one("dep-b").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Synced);
    assert_eq!(
        std::fs::read_to_string(sibling.join("SKILL.md")).unwrap(),
        "v2 from windsurf\n"
    );
}

#[test]
fn delete_with_undeletable_path_keeps_the_record() {
    let world = World::new();
    // A deployment whose recorded path is a file, not a directory: the
    // recursive removal fails and must leave the record in place.
    let bogus = world.tmp.path().join("not-a-dir");
    std::fs::write(&bogus, b"file").unwrap();
    let mut dep = skillsync::test_support::sample_deployment(
        "dep-x",
        "skill-1",
        Tool::ClaudeCode,
        &bogus.to_string_lossy(),
    );
    dep.status = DeploymentStatus::Synced;
    world.db.upsert_deployment(&dep).unwrap();

    let err = world.executor().delete_deployment("dep-x").unwrap_err();
    assert!(matches!(err, SyncError::Io(_)));
    assert!(world.db.get_deployment("dep-x").unwrap().is_some());

    let history = world.db.list_history(5).unwrap();
    assert_eq!(history[0].status, "failed");
}

#[test]
fn reconcile_all_isolates_per_deployment_failures() {
    let world = World::new();
    world.add_deployment("dep-ok", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");
    // A deployment referencing a skill that no longer exists.
    let orphan = skillsync::test_support::sample_deployment(
        "dep-orphan",
        "skill-ghost",
        Tool::Cursor,
        "/nowhere",
    );
    world
        .db
        .conn()
        .execute("PRAGMA foreign_keys = OFF", [])
        .unwrap();
    world.db.upsert_deployment(&orphan).unwrap();

    let report = world.reconciler().reconcile_all().unwrap();
    assert_eq!(report.total_deployments, 2);
    assert_eq!(report.synced, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("dep-orphan"));
}

#[test]
fn pull_then_resync_converges_all_deployments() {
    let world = World::new();
    let edited = world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");
    world.add_deployment("dep-b", Tool::Cursor, "p2/.cursor/skills/frontend-design");

    std::fs::write(edited.join("SKILL.md"), b"v2 authored in place\n").unwrap();
    let outcome = world
        .executor()
        .update_library_from_deployment("dep-a", true)
        .unwrap();
    assert_eq!(outcome.other_deployments_synced, 1);
    assert_eq!(outcome.new_checksum, checksum(&world.library));

    let report = world.reconciler().reconcile_all().unwrap();
    assert_eq!(report.synced, 2);
    assert_eq!(report.diverged, 0);
}
