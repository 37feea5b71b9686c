use stowage_core::{Argon2Verifier, ItemDetailsUpdate, ServiceError, Store};
use uuid::Uuid;

fn setup() -> Store {
    let store = Store::open_in_memory()
        .unwrap()
        .with_verifier(Argon2Verifier::new(8, 1).unwrap());
    store.users().register_user("u", "pw").unwrap();
    store.users().register_user("v", "pw").unwrap();
    store
}

#[test]
fn create_item_stores_trimmed_details() {
    let store = setup();
    let drill = store
        .items()
        .create_item("u", " Drill ", Some(" cordless "), Some("tools"))
        .unwrap();

    assert_eq!(drill.name, "Drill");
    let items = store.items();
    assert_eq!(items.get_item_owner(drill.id).unwrap().as_deref(), Some("u"));
    assert_eq!(items.get_item_name(drill.id).unwrap().as_deref(), Some("Drill"));
    assert_eq!(
        items.get_item_description(drill.id).unwrap().as_deref(),
        Some("cordless")
    );
    assert_eq!(
        items.get_item_category(drill.id).unwrap().as_deref(),
        Some("tools")
    );
    assert_eq!(items.get_item(drill.id).unwrap(), Some(drill));
}

#[test]
fn blank_optional_details_are_stored_as_absent() {
    let store = setup();
    let cup = store
        .items()
        .create_item("u", "Cup", Some("   "), None)
        .unwrap();
    assert_eq!(cup.description, None);
    assert_eq!(store.items().get_item_description(cup.id).unwrap(), None);
}

#[test]
fn create_rejects_duplicates_unknown_owners_and_blank_names() {
    let store = setup();
    store.items().create_item("u", "Hammer", None, None).unwrap();

    let err = store
        .items()
        .create_item("u", "Hammer", None, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName { .. }));
    store.items().create_item("v", "Hammer", None, None).unwrap();

    let err = store
        .items()
        .create_item("ghost", "Hammer", None, None)
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");

    let err = store.items().create_item("u", "", None, None).unwrap_err();
    assert_eq!(err.code(), "InvalidInputError");
    assert_eq!(store.items().get_items().unwrap().len(), 2);
}

#[test]
fn partial_update_touches_only_given_fields() {
    let store = setup();
    let saw = store
        .items()
        .create_item("u", "Saw", Some("hand saw"), Some("tools"))
        .unwrap();

    store
        .items()
        .update_item_details(
            "u",
            saw.id,
            &ItemDetailsUpdate {
                name: Some("Hacksaw".to_string()),
                ..ItemDetailsUpdate::default()
            },
        )
        .unwrap();
    let current = store.items().get_item(saw.id).unwrap().unwrap();
    assert_eq!(current.name, "Hacksaw");
    assert_eq!(current.description.as_deref(), Some("hand saw"));
    assert_eq!(current.category.as_deref(), Some("tools"));

    store
        .items()
        .update_item_details(
            "u",
            saw.id,
            &ItemDetailsUpdate {
                description: Some(" ".to_string()),
                category: Some("metalwork".to_string()),
                ..ItemDetailsUpdate::default()
            },
        )
        .unwrap();
    let current = store.items().get_item(saw.id).unwrap().unwrap();
    assert_eq!(current.description, None);
    assert_eq!(current.category.as_deref(), Some("metalwork"));

    store
        .items()
        .update_item_details("u", saw.id, &ItemDetailsUpdate::default())
        .unwrap();
    assert_eq!(store.items().get_item(saw.id).unwrap().unwrap(), current);
}

#[test]
fn update_rejects_taken_names_and_foreign_items() {
    let store = setup();
    let a = store.items().create_item("u", "A", None, None).unwrap();
    store.items().create_item("u", "B", None, None).unwrap();

    let rename_to_b = ItemDetailsUpdate {
        name: Some("B".to_string()),
        ..ItemDetailsUpdate::default()
    };
    let err = store
        .items()
        .update_item_details("u", a.id, &rename_to_b)
        .unwrap_err();
    assert_eq!(err.code(), "DuplicateNameError");

    let err = store
        .items()
        .update_item_details("v", a.id, &rename_to_b)
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");

    let err = store
        .items()
        .update_item_details("u", Uuid::new_v4(), &rename_to_b)
        .unwrap_err();
    assert_eq!(err.code(), "NotFoundError");

    assert_eq!(store.items().get_item_name(a.id).unwrap().as_deref(), Some("A"));
}

#[test]
fn delete_item_removes_it_for_its_owner_only() {
    let store = setup();
    let box_item = store.items().create_item("u", "Box", None, None).unwrap();

    let err = store.items().delete_item("v", box_item.id).unwrap_err();
    assert_eq!(err.code(), "NotFoundError");

    store.items().delete_item("u", box_item.id).unwrap();
    assert_eq!(store.items().get_item_owner(box_item.id).unwrap(), None);
    assert!(store.items().get_items_by_user("u").unwrap().is_empty());
}

#[test]
fn list_queries_cover_all_items_and_per_user_views() {
    let store = setup();
    store.items().create_item("u", "Alpha", None, None).unwrap();
    store.items().create_item("u", "Beta", None, None).unwrap();
    store.items().create_item("v", "Gamma", None, None).unwrap();

    let mut names = store.items().get_items_string().unwrap();
    names.sort();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);

    let mine = store.items().get_items_by_user(" u ").unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|item| item.owner == "u"));
}
