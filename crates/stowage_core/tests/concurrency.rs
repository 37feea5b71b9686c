use std::path::Path;
use std::thread;
use stowage_core::db::ConnectionOptions;
use stowage_core::{Argon2Verifier, ItemId, PlacementOutcome, SpaceId, Store};

const WORKERS: usize = 4;
const MOVES_PER_WORKER: usize = 25;

fn open(path: &Path) -> Store {
    Store::open(path, &ConnectionOptions::default())
        .unwrap()
        .with_verifier(Argon2Verifier::new(8, 1).unwrap())
}

fn seed(path: &Path) -> (ItemId, Vec<SpaceId>) {
    let store = open(path);
    store.users().register_user("u", "pw").unwrap();
    let spaces: Vec<SpaceId> = (0..WORKERS + 1)
        .map(|index| {
            store
                .spaces()
                .create_space("u", &format!("S{index}"), "room", None)
                .unwrap()
        })
        .collect();
    let item = store.items().create_item("u", "ball", None, None).unwrap();
    store.locations().create_log(item.id, spaces[0]).unwrap();
    (item.id, spaces)
}

#[test]
fn racing_placements_never_record_stale_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let (item, spaces) = seed(&path);

    let stores: Vec<Store> = (0..WORKERS).map(|_| open(&path)).collect();
    let handles: Vec<_> = stores
        .into_iter()
        .enumerate()
        .map(|(worker, store)| {
            let spaces = spaces.clone();
            thread::spawn(move || {
                let mut moved = 0_usize;
                for step in 0..MOVES_PER_WORKER {
                    let target = spaces[(worker + step) % spaces.len()];
                    match store.locations().place_item(item, target).unwrap() {
                        PlacementOutcome::Moved => moved += 1,
                        PlacementOutcome::Unchanged => {}
                        PlacementOutcome::Created => panic!("log already existed"),
                    }
                }
                moved
            })
        })
        .collect();

    let effective_moves: usize = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    let log = open(&path).locations().get_item_log(item).unwrap().unwrap();
    // The initial createLog counts as the first placement.
    assert_eq!(log.location_history.len(), effective_moves);
    for pair in log.placements().windows(2) {
        assert_ne!(pair[0], pair[1], "consecutive placements repeat a space");
    }
}

#[test]
fn racing_creates_of_one_name_admit_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.db");
    {
        let store = open(&path);
        store.users().register_user("u", "pw").unwrap();
    }

    let stores: Vec<Store> = (0..WORKERS).map(|_| open(&path)).collect();
    let handles: Vec<_> = stores
        .into_iter()
        .map(|store| {
            thread::spawn(move || {
                store
                    .spaces()
                    .create_space("u", "Garage", "room", None)
                    .map_err(|err| err.code())
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|code| *code == "DuplicateNameError"));
}
