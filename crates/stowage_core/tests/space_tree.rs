use proptest::prelude::*;
use stowage_core::{Argon2Verifier, ServiceError, SpaceId, Store};
use uuid::Uuid;

fn setup() -> Store {
    let store = Store::open_in_memory()
        .unwrap()
        .with_verifier(Argon2Verifier::new(8, 1).unwrap());
    store.users().register_user("u", "pw").unwrap();
    store.users().register_user("v", "pw").unwrap();
    store
}

fn space(store: &Store, owner: &str, name: &str, parent: Option<SpaceId>) -> SpaceId {
    store
        .spaces()
        .create_space(owner, name, "room", parent)
        .unwrap()
}

fn space_count(store: &Store) -> i64 {
    store
        .connection()
        .query_row("SELECT COUNT(*) FROM spaces;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn moving_root_under_its_child_is_a_cycle() {
    let store = setup();
    let a = space(&store, "u", "A", None);
    let b = space(&store, "u", "B", Some(a));

    let err = store.spaces().move_space("u", a, Some(b)).unwrap_err();
    assert!(matches!(err, ServiceError::Cycle { .. }));
    assert_eq!(err.code(), "CycleError");
    assert_eq!(store.spaces().get_space_parent(a).unwrap(), None);
    assert_eq!(store.spaces().get_space_parent(b).unwrap(), Some(a));
}

#[test]
fn moving_space_under_itself_is_a_cycle() {
    let store = setup();
    let a = space(&store, "u", "A", None);

    let err = store.spaces().move_space("u", a, Some(a)).unwrap_err();
    assert!(matches!(err, ServiceError::Cycle { .. }));
}

#[test]
fn deep_descendant_is_detected() {
    let store = setup();
    let a = space(&store, "u", "A", None);
    let b = space(&store, "u", "B", Some(a));
    let c = space(&store, "u", "C", Some(b));
    let d = space(&store, "u", "D", Some(c));

    assert!(matches!(
        store.spaces().move_space("u", b, Some(d)),
        Err(ServiceError::Cycle { .. })
    ));
    // Moving the leaf to the root's level is fine.
    store.spaces().move_space("u", d, Some(a)).unwrap();
    assert_eq!(store.spaces().get_space_parent(d).unwrap(), Some(a));
}

#[test]
fn null_parent_detaches_to_root() {
    let store = setup();
    let a = space(&store, "u", "A", None);
    let b = space(&store, "u", "B", Some(a));

    store.spaces().move_space("u", b, None).unwrap();
    assert_eq!(store.spaces().get_space_parent(b).unwrap(), None);
    assert!(store.spaces().get_space_children(a).unwrap().is_empty());

    // Already a root: no-op.
    store.spaces().move_space("u", b, None).unwrap();
}

const FOREST_SIZE: usize = 8;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn move_sequences_keep_the_forest_acyclic(
        moves in prop::collection::vec(
            (0..FOREST_SIZE, prop::option::of(0..FOREST_SIZE)),
            0..40,
        ),
    ) {
        let store = setup();
        let ids: Vec<SpaceId> = (0..FOREST_SIZE)
            .map(|index| space(&store, "u", &format!("S{index}"), None))
            .collect();

        for (moved, target) in moves {
            let result = store
                .spaces()
                .move_space("u", ids[moved], target.map(|index| ids[index]));
            prop_assert!(
                matches!(result, Ok(()) | Err(ServiceError::Cycle { .. })),
                "unexpected move outcome: {:?}",
                result
            );

            for &start in &ids {
                let mut cursor = Some(start);
                let mut steps = 0;
                while let Some(current) = cursor {
                    steps += 1;
                    prop_assert!(steps <= ids.len(), "parent chain from {} loops", start);
                    cursor = store.spaces().get_space_parent(current).unwrap();
                }
            }
        }
    }
}

#[test]
fn moving_foreign_spaces_is_an_ownership_error() {
    let store = setup();
    let mine = space(&store, "u", "Mine", None);
    let theirs = space(&store, "v", "Theirs", None);

    let err = store.spaces().move_space("u", mine, Some(theirs)).unwrap_err();
    assert_eq!(err.code(), "OwnershipError");
    let err = store.spaces().move_space("u", theirs, None).unwrap_err();
    assert_eq!(err.code(), "OwnershipError");
}

#[test]
fn moving_unknown_space_is_not_found() {
    let store = setup();
    let a = space(&store, "u", "A", None);

    let err = store
        .spaces()
        .move_space("u", a, Some(Uuid::new_v4()))
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");
}

#[test]
fn create_rejects_duplicate_names_per_owner_only() {
    let store = setup();
    space(&store, "u", "Garage", None);

    let err = store
        .spaces()
        .create_space("u", " Garage ", "room", None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName { .. }));
    assert_eq!(space_count(&store), 1);

    space(&store, "v", "Garage", None);
    assert_eq!(space_count(&store), 2);
}

#[test]
fn create_requires_own_parent_and_known_owner() {
    let store = setup();
    let theirs = space(&store, "v", "Theirs", None);

    let err = store
        .spaces()
        .create_space("u", "Shelf", "shelf", Some(theirs))
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");

    let err = store
        .spaces()
        .create_space("nobody", "Shelf", "shelf", None)
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");

    let err = store.spaces().create_space("u", "  ", "shelf", None).unwrap_err();
    assert_eq!(err.code(), "InvalidInputError");
    assert_eq!(space_count(&store), 1);
}

#[test]
fn rename_checks_uniqueness_and_allows_same_name() {
    let store = setup();
    let attic = space(&store, "u", "Attic", None);
    space(&store, "u", "Basement", None);

    let err = store
        .spaces()
        .rename_space("u", attic, "Basement")
        .unwrap_err();
    assert_eq!(err.code(), "DuplicateNameError");

    store.spaces().rename_space("u", attic, "Attic").unwrap();
    store.spaces().rename_space("u", attic, "Loft").unwrap();
    assert_eq!(
        store.spaces().get_space_name(attic).unwrap().as_deref(),
        Some("Loft")
    );

    let err = store.spaces().rename_space("v", attic, "Mine").unwrap_err();
    assert_eq!(err.code(), "OwnershipError");
}

#[test]
fn delete_with_children_fails_until_children_are_gone() {
    let store = setup();
    let house = space(&store, "u", "House", None);
    let kitchen = space(&store, "u", "Kitchen", Some(house));

    let err = store.spaces().delete_space("u", house).unwrap_err();
    assert!(matches!(err, ServiceError::HasChildren(id) if id == house));

    store.spaces().delete_space("u", kitchen).unwrap();
    store.spaces().delete_space("u", house).unwrap();
    assert_eq!(store.spaces().get_space(house).unwrap(), None);
    assert_eq!(space_count(&store), 0);
}

#[test]
fn delete_of_current_space_is_in_use() {
    let store = setup();
    let shed = space(&store, "u", "Shed", None);
    let rake = store.items().create_item("u", "Rake", None, None).unwrap();
    store.locations().create_log(rake.id, shed).unwrap();

    let err = store.spaces().delete_space("u", shed).unwrap_err();
    assert_eq!(err.code(), "InUseError");
    assert!(store.spaces().get_space(shed).unwrap().is_some());
}

#[test]
fn queries_return_empty_for_roots_and_missing_spaces() {
    let store = setup();
    let house = space(&store, "u", "House", None);
    let a = space(&store, "u", "A-bedroom", Some(house));
    let b = space(&store, "u", "B-bathroom", Some(house));

    let spaces = store.spaces();
    assert_eq!(spaces.get_space_owner(house).unwrap().as_deref(), Some("u"));
    assert_eq!(spaces.get_space_type(house).unwrap().as_deref(), Some("room"));
    assert_eq!(spaces.get_space_parent(house).unwrap(), None);

    let mut children = spaces.get_space_children(house).unwrap();
    children.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(children, expected);

    let mut names = spaces.get_space_children_names(house).unwrap();
    names.sort();
    assert_eq!(names, vec!["A-bedroom".to_string(), "B-bathroom".to_string()]);

    let missing = Uuid::new_v4();
    assert_eq!(spaces.get_space_owner(missing).unwrap(), None);
    assert!(spaces.get_space_children(missing).unwrap().is_empty());

    assert_eq!(spaces.get_spaces().unwrap().len(), 3);
    assert_eq!(spaces.get_spaces_by_owner("u").unwrap().len(), 3);
    assert!(spaces.get_spaces_by_owner("v").unwrap().is_empty());
}
