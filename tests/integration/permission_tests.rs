/// Ownership, sharing and anonymous access rules of the service
use habit_share::*;

use crate::helpers::{as_user, day, disk_store};

#[test]
fn test_anonymous_caller_is_rejected() {
    let (_dir, storage) = disk_store();
    let anonymous = HabitApp::new(&storage, StaticIdentity::anonymous());

    assert_eq!(
        anonymous.create_habit("Run", "", 3).unwrap_err().kind(),
        ErrorKind::UserNotFound
    );
    assert_eq!(
        anonymous.get_my_habits(None, false).unwrap_err().kind(),
        ErrorKind::UserNotFound
    );
    assert_eq!(
        anonymous.get_shared_habits(None).unwrap_err().kind(),
        ErrorKind::UserNotFound
    );

    let habit_id = as_user(&storage, "alice").create_habit("Run", "", 3).unwrap();
    assert_eq!(
        anonymous.get_habit(&habit_id).unwrap_err().kind(),
        ErrorKind::UserNotFound
    );
}

#[test]
fn test_empty_user_id_is_anonymous() {
    assert_eq!(StaticIdentity::user(""), StaticIdentity::anonymous());
}

#[test]
fn test_owner_only_operations_deny_others() {
    let (_dir, storage) = disk_store();
    let alice = as_user(&storage, "alice");
    let mallory = as_user(&storage, "mallory");
    let habit_id = alice.create_habit("Run", "", 3).unwrap();
    alice.share_habit(&habit_id, "mallory").unwrap();

    let denied = [
        mallory.change_name(&habit_id, "Mine now").unwrap_err(),
        mallory.change_description(&habit_id, "x").unwrap_err(),
        mallory.change_frequency(&habit_id, 2).unwrap_err(),
        mallory.archive_habit(&habit_id).unwrap_err(),
        mallory.unarchive_habit(&habit_id).unwrap_err(),
        mallory.share_habit(&habit_id, "eve").unwrap_err(),
        mallory.unshare_habit(&habit_id, "mallory").unwrap_err(),
        mallory
            .create_activity(&habit_id, day(2024, 1, 1), "SUCCESS")
            .unwrap_err(),
        mallory.delete_habit(&habit_id).unwrap_err(),
    ];
    for err in denied {
        assert_eq!(err.kind(), ErrorKind::PermissionDenied, "{}", err);
    }

    // Nothing leaked through
    let habit = alice.get_habit(&habit_id).unwrap();
    assert_eq!(habit.name, "Run");
    assert_eq!(habit.frequency.get(), 3);
}

#[test]
fn test_delete_activity_requires_owner() {
    let (_dir, storage) = disk_store();
    let alice = as_user(&storage, "alice");
    let habit_id = alice.create_habit("Run", "", 3).unwrap();
    let activity_id = alice
        .create_activity(&habit_id, day(2024, 1, 1), "SUCCESS")
        .unwrap();

    let err = as_user(&storage, "bob")
        .delete_activity(activity_id.as_str())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    alice.delete_activity(activity_id.as_str()).unwrap();
    let err = alice.delete_activity(activity_id.as_str()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ActivityNotFound);
}

#[test]
fn test_reads_hide_existence_from_outsiders() {
    let (_dir, storage) = disk_store();
    let alice = as_user(&storage, "alice");
    let outsider = as_user(&storage, "outsider");
    let habit_id = alice.create_habit("Run", "", 3).unwrap();

    let hidden = [
        outsider.get_habit(&habit_id).unwrap_err(),
        outsider
            .get_activities(&habit_id, day(2024, 1, 1), day(2024, 2, 1), 10)
            .unwrap_err(),
        outsider.get_score(&habit_id).unwrap_err(),
        outsider.get_shared_with(&habit_id).unwrap_err(),
    ];
    for err in hidden {
        assert_eq!(err.kind(), ErrorKind::HabitNotFound, "{}", err);
    }

    // Same answer as for a habit that truly does not exist
    let missing = HabitId::from_string("alice_missing");
    assert_eq!(
        outsider.get_habit(&missing).unwrap_err().kind(),
        ErrorKind::HabitNotFound
    );
}

#[test]
fn test_sharer_can_read() {
    let (_dir, storage) = disk_store();
    let alice = as_user(&storage, "alice");
    let bob = as_user(&storage, "bob");
    let habit_id = alice.create_habit("Run", "", 1).unwrap();
    alice.create_activity(&habit_id, day(2024, 1, 16), "SUCCESS").unwrap();
    alice.share_habit(&habit_id, "bob").unwrap();

    assert_eq!(bob.get_habit(&habit_id).unwrap().owner, UserId::new("alice"));
    assert_eq!(
        bob.get_activities(&habit_id, day(2024, 1, 1), day(2024, 2, 1), 10)
            .unwrap()
            .activities
            .len(),
        1
    );
    assert_eq!(bob.get_score_on(&habit_id, day(2024, 1, 17)).unwrap(), 1);
    assert!(bob
        .get_shared_with(&habit_id)
        .unwrap()
        .contains(&UserId::new("bob")));

    alice.unshare_habit(&habit_id, "bob").unwrap();
    assert_eq!(
        bob.get_habit(&habit_id).unwrap_err().kind(),
        ErrorKind::HabitNotFound
    );
}

#[test]
fn test_validation_runs_before_mutation() {
    let (_dir, storage) = disk_store();
    let alice = as_user(&storage, "alice");

    for frequency in [0, 8] {
        assert_eq!(
            alice.create_habit("Run", "", frequency).unwrap_err().kind(),
            ErrorKind::Input
        );
    }
    assert!(alice.get_my_habits(None, true).unwrap().is_empty());

    let habit_id = alice.create_habit("Run", "", 1).unwrap();
    alice.create_habit("Swim", "", 7).unwrap();

    assert_eq!(
        alice.change_frequency(&habit_id, 8).unwrap_err().kind(),
        ErrorKind::Input
    );
    assert_eq!(
        alice
            .create_activity(&habit_id, day(2024, 1, 1), "DONE")
            .unwrap_err()
            .kind(),
        ErrorKind::Input
    );
    assert_eq!(
        alice.change_name(&habit_id, "  ").unwrap_err().kind(),
        ErrorKind::Input
    );
    assert_eq!(
        alice.share_habit(&habit_id, "alice").unwrap_err().kind(),
        ErrorKind::Input
    );
    assert_eq!(
        alice.share_habit(&habit_id, "").unwrap_err().kind(),
        ErrorKind::Input
    );
    assert_eq!(
        alice.delete_activity("garbage").unwrap_err().kind(),
        ErrorKind::Input
    );

    let habit = alice.get_habit(&habit_id).unwrap();
    assert_eq!(habit.frequency.get(), 1);
    assert!(habit.shared_with.is_empty());
    assert!(storage.snapshot().unwrap().habits[&habit_id].activities.is_empty());
}

#[test]
fn test_owner_comes_from_identity() {
    let (_dir, storage) = disk_store();
    let carol = as_user(&storage, "carol");
    let habit_id = carol.create_habit("Cook", "", 2).unwrap();

    let habit = carol.storage().get_habit(&habit_id).unwrap();
    assert_eq!(habit.owner, UserId::new("carol"));
    assert!(habit_id.as_str().starts_with("carol_"));
}
