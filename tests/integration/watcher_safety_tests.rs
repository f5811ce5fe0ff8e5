//! Safety properties of the watcher absorption protocol.

use skillsync::core::models::DeploymentStatus;
use skillsync::error::SyncError;
use skillsync::tools::Tool;

use crate::common::World;

#[test]
fn restore_of_watcher_backup_diverges_the_trigger() {
    let world = World::new();
    let trigger = world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");

    std::fs::write(trigger.join("SKILL.md"), b"v2 external edit\n").unwrap();
    world.watcher().absorb_change("dep-a").unwrap();

    let skill = world.db.get_skill("skill-1").unwrap().unwrap();
    let backup_id = skill.watcher_backup_id.unwrap();

    // Restoring the pre-change library (without touching the deployment)
    // must leave the trigger diverged: its on-disk content still holds the
    // absorbed edit while the library went back to v1.
    world.executor().restore_from_backup(&backup_id, false).unwrap();
    let detail = world.reconciler().reconcile_one("dep-a").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Diverged);
    assert_ne!(detail.library_checksum, detail.deployed_checksum);
}

#[test]
fn discard_restores_both_library_and_trigger_to_synced() {
    let world = World::new();
    let trigger = world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");

    std::fs::write(trigger.join("SKILL.md"), b"v2 external edit\n").unwrap();
    world.watcher().absorb_change("dep-a").unwrap();

    world.watcher().discard("skill-1", &world.executor()).unwrap();

    assert_eq!(
        std::fs::read_to_string(world.library.join("SKILL.md")).unwrap(),
        "v1 guidance\n"
    );
    assert_eq!(
        std::fs::read_to_string(trigger.join("SKILL.md")).unwrap(),
        "v1 guidance\n"
    );
    let detail = world.reconciler().reconcile_one("dep-a").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Synced);
}

#[test]
fn discard_with_forged_missing_backup_fails_closed() {
    let world = World::new();
    world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");
    world.db.set_watcher_pending("skill-1", None, "dep-a").unwrap();

    let err = world
        .watcher()
        .discard("skill-1", &world.executor())
        .unwrap_err();
    assert!(matches!(err, SyncError::NoBackupAvailable(_)));

    // Nothing was cleared or restored.
    let skill = world.db.get_skill("skill-1").unwrap().unwrap();
    assert!(skill.watcher_pending());
}

#[test]
fn coalesced_absorptions_still_restore_to_the_original() {
    let world = World::new();
    let trigger = world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");

    std::fs::write(trigger.join("SKILL.md"), b"v2\n").unwrap();
    world.watcher().absorb_change("dep-a").unwrap();
    std::fs::write(trigger.join("SKILL.md"), b"v3\n").unwrap();
    world.watcher().absorb_change("dep-a").unwrap();

    // Discard after two coalesced changes lands on v1, not v2.
    world.watcher().discard("skill-1", &world.executor()).unwrap();
    assert_eq!(
        std::fs::read_to_string(world.library.join("SKILL.md")).unwrap(),
        "v1 guidance\n"
    );
}

#[test]
fn db_only_resolution_keeps_absorbed_library() {
    let world = World::new();
    let trigger = world.add_deployment("dep-a", Tool::Windsurf, "p1/.windsurf/skills/frontend-design");
    let sibling = world.add_deployment("dep-b", Tool::Cursor, "p2/.cursor/skills/frontend-design");

    std::fs::write(trigger.join("SKILL.md"), b"v2\n").unwrap();
    world.watcher().absorb_change("dep-a").unwrap();
    world.watcher().db_only("skill-1").unwrap();

    // Library keeps v2; the sibling is untouched and reconciles diverged.
    assert_eq!(
        std::fs::read_to_string(world.library.join("SKILL.md")).unwrap(),
        "v2\n"
    );
    assert_eq!(
        std::fs::read_to_string(sibling.join("SKILL.md")).unwrap(),
        "v1 guidance\n"
    );
    let detail = world.reconciler().reconcile_one("dep-b").unwrap();
    assert_eq!(detail.status, DeploymentStatus::Diverged);
}
