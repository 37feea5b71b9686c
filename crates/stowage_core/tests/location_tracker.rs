use stowage_core::{Argon2Verifier, ItemId, PlacementOutcome, ServiceError, SpaceId, Store};
use uuid::Uuid;

fn setup() -> Store {
    let store = Store::open_in_memory()
        .unwrap()
        .with_verifier(Argon2Verifier::new(8, 1).unwrap());
    store.users().register_user("u", "pw").unwrap();
    store.users().register_user("v", "pw").unwrap();
    store
}

fn space(store: &Store, owner: &str, name: &str) -> SpaceId {
    store
        .spaces()
        .create_space(owner, name, "room", None)
        .unwrap()
}

fn item(store: &Store, owner: &str, name: &str) -> ItemId {
    store.items().create_item(owner, name, None, None).unwrap().id
}

#[test]
fn create_then_place_pushes_previous_space_onto_history() {
    let store = setup();
    let x = space(&store, "u", "X");
    let y = space(&store, "u", "Y");
    let item1 = item(&store, "u", "item1");

    let created = store.locations().create_log(item1, x).unwrap();
    assert_eq!(created.current_space, x);
    assert!(created.location_history.is_empty());

    let outcome = store.locations().place_item(item1, y).unwrap();
    assert_eq!(outcome, PlacementOutcome::Moved);

    let log = store.locations().get_item_log(item1).unwrap().unwrap();
    assert_eq!(log.this_item, item1);
    assert_eq!(log.current_space, y);
    assert_eq!(log.location_history, vec![x]);
}

#[test]
fn placing_twice_in_the_same_space_keeps_history() {
    let store = setup();
    let x = space(&store, "u", "X");
    let y = space(&store, "u", "Y");
    let lamp = item(&store, "u", "lamp");

    store.locations().create_log(lamp, x).unwrap();
    store.locations().place_item(lamp, y).unwrap();
    let before = store.locations().get_item_log(lamp).unwrap().unwrap();

    let outcome = store.locations().place_item(lamp, y).unwrap();
    assert_eq!(outcome, PlacementOutcome::Unchanged);
    assert_eq!(store.locations().get_item_log(lamp).unwrap().unwrap(), before);
}

#[test]
fn n_distinct_placements_leave_n_minus_one_history_entries() {
    let store = setup();
    let spaces: Vec<SpaceId> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|name| space(&store, "u", name))
        .collect();
    let kettle = item(&store, "u", "kettle");

    let targets = [spaces[0], spaces[1], spaces[2], spaces[0], spaces[3], spaces[4]];
    let first = store.locations().place_item(kettle, targets[0]).unwrap();
    assert_eq!(first, PlacementOutcome::Created);
    for &target in &targets[1..] {
        assert_eq!(
            store.locations().place_item(kettle, target).unwrap(),
            PlacementOutcome::Moved
        );
    }

    let log = store.locations().get_item_log(kettle).unwrap().unwrap();
    assert_eq!(log.location_history.len(), targets.len() - 1);
    assert_eq!(log.current_space, targets[targets.len() - 1]);
    assert_eq!(log.placements(), targets.to_vec());
    assert_ne!(log.location_history.last(), Some(&log.current_space));
}

#[test]
fn create_log_twice_is_already_exists() {
    let store = setup();
    let x = space(&store, "u", "X");
    let mug = item(&store, "u", "mug");
    store.locations().create_log(mug, x).unwrap();

    let err = store.locations().create_log(mug, x).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    assert_eq!(err.code(), "AlreadyExistsError");
}

#[test]
fn create_log_requires_existing_item_and_space_with_shared_owner() {
    let store = setup();
    let mine = space(&store, "u", "Mine");
    let theirs = space(&store, "v", "Theirs");
    let mug = item(&store, "u", "mug");

    for (item_id, space_id) in [
        (mug, theirs),
        (mug, Uuid::new_v4()),
        (Uuid::new_v4(), mine),
    ] {
        let err = store.locations().create_log(item_id, space_id).unwrap_err();
        assert_eq!(err.code(), "NotFoundError");
    }
    assert!(store.locations().get_logs().unwrap().is_empty());
}

#[test]
fn placing_into_a_foreign_space_is_an_ownership_error() {
    let store = setup();
    let mine = space(&store, "u", "Mine");
    let theirs = space(&store, "v", "Theirs");
    let mug = item(&store, "u", "mug");
    store.locations().place_item(mug, mine).unwrap();

    let err = store.locations().place_item(mug, theirs).unwrap_err();
    assert!(matches!(err, ServiceError::Ownership { .. }));
    let log = store.locations().get_item_log(mug).unwrap().unwrap();
    assert_eq!(log.current_space, mine);
    assert!(log.location_history.is_empty());

    let err = store
        .locations()
        .place_item(mug, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");
}

#[test]
fn delete_log_is_idempotent() {
    let store = setup();
    let x = space(&store, "u", "X");
    let y = space(&store, "u", "Y");
    let mug = item(&store, "u", "mug");
    store.locations().create_log(mug, x).unwrap();
    store.locations().place_item(mug, y).unwrap();

    store.locations().delete_log(mug).unwrap();
    store.locations().delete_log(mug).unwrap();
    store.locations().delete_log(Uuid::new_v4()).unwrap();
    assert_eq!(store.locations().get_item_log(mug).unwrap(), None);
}

#[test]
fn deleting_a_space_that_only_appears_in_history_keeps_the_entry() {
    let store = setup();
    let old = space(&store, "u", "Old");
    let new = space(&store, "u", "New");
    let sofa = item(&store, "u", "sofa");
    store.locations().create_log(sofa, old).unwrap();
    store.locations().place_item(sofa, new).unwrap();

    store.spaces().delete_space("u", old).unwrap();

    let log = store.locations().get_item_log(sofa).unwrap().unwrap();
    assert_eq!(log.location_history, vec![old]);
    assert_eq!(store.spaces().get_space(old).unwrap(), None);
}

#[test]
fn history_rows_cannot_be_rewritten() {
    let store = setup();
    let x = space(&store, "u", "X");
    let y = space(&store, "u", "Y");
    let mug = item(&store, "u", "mug");
    store.locations().create_log(mug, x).unwrap();
    store.locations().place_item(mug, y).unwrap();

    let err = store
        .connection()
        .execute(
            "UPDATE location_history SET space_uuid = ?1 WHERE item_uuid = ?2;",
            [y.to_string(), mug.to_string()],
        )
        .unwrap_err();
    assert!(err.to_string().contains("append-only"));
    assert_eq!(
        store.locations().get_item_log(mug).unwrap().unwrap().location_history,
        vec![x]
    );
}

#[test]
fn item_with_a_log_cannot_be_deleted_until_log_is_gone() {
    let store = setup();
    let x = space(&store, "u", "X");
    let mug = item(&store, "u", "mug");
    store.locations().create_log(mug, x).unwrap();

    let err = store.items().delete_item("u", mug).unwrap_err();
    assert_eq!(err.code(), "InUseError");

    store.locations().delete_log(mug).unwrap();
    store.items().delete_item("u", mug).unwrap();
    assert_eq!(store.items().get_item(mug).unwrap(), None);
}

#[test]
fn get_logs_lists_every_tracked_item() {
    let store = setup();
    let x = space(&store, "u", "X");
    let a = item(&store, "u", "a");
    let b = item(&store, "u", "b");
    store.locations().create_log(a, x).unwrap();
    store.locations().create_log(b, x).unwrap();

    let mut tracked: Vec<ItemId> = store
        .locations()
        .get_logs()
        .unwrap()
        .into_iter()
        .map(|log| log.this_item)
        .collect();
    tracked.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(tracked, expected);
}

#[test]
fn failed_move_rolls_back_the_history_append() {
    let store = setup();
    let x = space(&store, "u", "X");
    let y = space(&store, "u", "Y");
    let lamp = item(&store, "u", "lamp");
    store.locations().create_log(lamp, x).unwrap();

    // The history row is written first; the current-space update then aborts.
    store
        .connection()
        .execute_batch(
            "CREATE TEMP TRIGGER block_log_update
             BEFORE UPDATE ON location_logs
             BEGIN
                 SELECT RAISE(ABORT, 'log update blocked');
             END;",
        )
        .unwrap();

    let err = store.locations().place_item(lamp, y).unwrap_err();
    assert!(err.to_string().contains("log update blocked"), "{err}");

    let history_rows: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM location_history;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(history_rows, 0);
    let log = store.locations().get_item_log(lamp).unwrap().unwrap();
    assert_eq!(log.current_space, x);
    assert!(log.location_history.is_empty());

    store
        .connection()
        .execute_batch("DROP TRIGGER block_log_update;")
        .unwrap();
    store.locations().place_item(lamp, y).unwrap();
    let log = store.locations().get_item_log(lamp).unwrap().unwrap();
    assert_eq!(log.current_space, y);
    assert_eq!(log.location_history, vec![x]);
}
