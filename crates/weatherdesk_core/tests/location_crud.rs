use rusqlite::Connection;
use std::thread::sleep;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use weatherdesk_core::db::migrations::latest_version;
use weatherdesk_core::db::open_db_in_memory;
use weatherdesk_core::{
    ErrorKind, LocationListQuery, LocationOrder, LocationPatch, LocationRepository,
    LocationService, NewLocation, RepoError, SqliteLocationRepository, ValidationError,
};

fn paris() -> NewLocation {
    NewLocation::new("Paris", 48.85, 2.35)
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let mut input = NewLocation::new("Sendai", 38.27, 140.87);
    input.country = Some("JP".to_string());
    input.state = Some("Miyagi".to_string());
    let id = repo.create_location(&input).unwrap();

    let loaded = repo.get_location(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.name, input.name);
    assert_eq!(loaded.lat, input.lat);
    assert_eq!(loaded.lon, input.lon);
    assert_eq!(loaded.country.as_deref(), Some("JP"));
    assert_eq!(loaded.state.as_deref(), Some("Miyagi"));
    assert!(!loaded.is_current);
}

fn now_millis() -> i64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    i64::try_from(elapsed.as_millis()).unwrap()
}

#[test]
fn created_at_has_millisecond_resolution() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let before = now_millis();
    let mut stamps = Vec::new();
    for _ in 0..4 {
        let id = repo.create_location(&paris()).unwrap();
        stamps.push(repo.get_location(id).unwrap().unwrap().created_at);
        sleep(Duration::from_millis(3));
    }
    let after = now_millis();

    assert!(stamps.iter().any(|stamp| stamp % 1000 != 0), "{stamps:?}");
    assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]), "{stamps:?}");
    let window = before - 1..=after + 1;
    assert!(stamps.iter().all(|stamp| window.contains(stamp)));
}

#[test]
fn first_location_gets_id_one_and_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let id = repo.create_location(&paris()).unwrap();
    assert_eq!(id, 1);

    let loaded = repo.get_location(1).unwrap().unwrap();
    assert_eq!(loaded.name, "Paris");
    assert_eq!(loaded.lat, 48.85);
    assert_eq!(loaded.lon, 2.35);
    assert!(!loaded.is_current);
    assert!(loaded.country.is_none());
    assert!(loaded.created_at > 0);
}

#[test]
fn missing_name_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let err = repo
        .create_location(&NewLocation::new("", 1.0, 1.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingField { field: "name" })
    ));
    assert!(repo
        .list_locations(&LocationListQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn marking_location_current_demotes_previous_current() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let mut first = paris();
    first.is_current = true;
    let first_id = repo.create_location(&first).unwrap();

    let mut second = NewLocation::new("Berlin", 52.52, 13.40);
    second.is_current = true;
    let second_id = repo.create_location(&second).unwrap();

    assert!(!repo.get_location(first_id).unwrap().unwrap().is_current);
    assert!(repo.get_location(second_id).unwrap().unwrap().is_current);

    repo.update_location(
        first_id,
        &LocationPatch {
            is_current: Some(true),
            ..LocationPatch::default()
        },
    )
    .unwrap();
    let current = repo
        .list_locations(&LocationListQuery {
            current_only: true,
            ..LocationListQuery::default()
        })
        .unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, first_id);
}

#[test]
fn list_orders_by_insertion_or_current_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let a = repo.create_location(&NewLocation::new("A", 1.0, 1.0)).unwrap();
    let mut current = NewLocation::new("B", 2.0, 2.0);
    current.is_current = true;
    let b = repo.create_location(&current).unwrap();
    let c = repo.create_location(&NewLocation::new("C", 3.0, 3.0)).unwrap();
    conn.execute("UPDATE saved_locations SET created_at = 1000;", [])
        .unwrap();

    let by_insertion: Vec<_> = repo
        .list_locations(&LocationListQuery::default())
        .unwrap()
        .into_iter()
        .map(|location| location.id)
        .collect();
    assert_eq!(by_insertion, vec![a, b, c]);

    let favorites: Vec<_> = repo
        .list_locations(&LocationListQuery {
            order: LocationOrder::CurrentFirst,
            ..LocationListQuery::default()
        })
        .unwrap()
        .into_iter()
        .map(|location| location.id)
        .collect();
    assert_eq!(favorites, vec![b, c, a]);
}

#[test]
fn list_pagination_with_limit_and_offset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();
    for (index, name) in ["a", "b", "c", "d"].iter().enumerate() {
        repo.create_location(&NewLocation::new(*name, index as f64, 0.0))
            .unwrap();
    }

    let page = repo
        .list_locations(&LocationListQuery {
            limit: Some(2),
            offset: 1,
            ..LocationListQuery::default()
        })
        .unwrap();
    let names: Vec<_> = page.iter().map(|location| location.name.as_str()).collect();
    assert_eq!(names, ["b", "c"]);

    let tail = repo
        .list_locations(&LocationListQuery {
            offset: 3,
            ..LocationListQuery::default()
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].name, "d");
}

#[test]
fn update_patches_only_given_fields_and_can_clear_region() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let mut input = paris();
    input.country = Some("FR".to_string());
    input.state = Some("IDF".to_string());
    let id = repo.create_location(&input).unwrap();

    repo.update_location(
        id,
        &LocationPatch {
            name: Some("Paris Centre".to_string()),
            state: Some(None),
            ..LocationPatch::default()
        },
    )
    .unwrap();

    let loaded = repo.get_location(id).unwrap().unwrap();
    assert_eq!(loaded.name, "Paris Centre");
    assert_eq!(loaded.lat, 48.85);
    assert_eq!(loaded.country.as_deref(), Some("FR"));
    assert!(loaded.state.is_none());
}

#[test]
fn update_and_delete_missing_ids_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let update_err = repo
        .update_location(
            42,
            &LocationPatch {
                name: Some("x".to_string()),
                ..LocationPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(update_err, RepoError::NotFound { id: 42, .. }));

    let empty_patch_err = repo
        .update_location(42, &LocationPatch::default())
        .unwrap_err();
    assert_eq!(empty_patch_err.kind(), ErrorKind::NotFound);

    let delete_err = repo.delete_location(42).unwrap_err();
    assert_eq!(delete_err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_removes_row_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLocationRepository::try_new(&conn).unwrap();

    let id = repo.create_location(&paris()).unwrap();
    repo.delete_location(id).unwrap();
    assert!(repo.get_location(id).unwrap().is_none());

    let err = repo.delete_location(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn service_returns_saved_records_and_current_location() {
    let conn = open_db_in_memory().unwrap();
    let service = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());

    assert!(service.current_location().unwrap().is_none());

    let saved = service.save_location(&paris()).unwrap();
    assert_eq!(saved.name, "Paris");

    let mut here = NewLocation::new("Here", 10.0, 20.0);
    here.is_current = true;
    let here = service.save_location(&here).unwrap();

    assert_eq!(service.current_location().unwrap(), Some(here.clone()));
    let favorites = service.favorites(None).unwrap();
    assert_eq!(favorites[0].id, here.id);
    assert_eq!(favorites.len(), 2);

    let updated = service
        .update_location(
            saved.id,
            &LocationPatch {
                lat: Some(48.86),
                ..LocationPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.lat, 48.86);

    service.delete_location(saved.id).unwrap();
    assert_eq!(service.favorites(None).unwrap().len(), 1);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteLocationRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE saved_locations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteLocationRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "saved_locations",
            column: "country"
        })
    ));
}
