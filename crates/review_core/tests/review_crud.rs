use review_core::db::open_db_in_memory;
use review_core::{RepoError, ReviewRepository, ReviewValidationError, SqliteReviewStore};
use rusqlite::Connection;

fn seeded_connection() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO employees (id, name) VALUES (1, 'Ada'), (2, 'Grace'), (3, 'Linus');",
    )
    .unwrap();
    conn
}

fn review_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM reviews;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_assigns_first_id_and_find_returns_equal_fields() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let created = store.create(2022, "Exceeded expectations", 3).unwrap();
    {
        let review = created.borrow();
        assert_eq!(review.id(), Some(1));
        assert_eq!(review.year(), 2022);
        assert_eq!(review.summary(), "Exceeded expectations");
        assert_eq!(review.employee_id(), 3);
    }

    let found = store.find_by_id(1).unwrap().unwrap();
    assert_eq!(*found.borrow(), *created.borrow());
}

#[test]
fn create_table_is_idempotent() {
    let conn = seeded_connection();
    let store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();
    store.create_table().unwrap();
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn early_year_is_rejected_without_insert() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let err = store.create(1999, "Too early", 1).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ReviewValidationError::YearTooEarly { year: 1999 })
    ));
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn blank_summary_is_rejected() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    for summary in ["", "   ", "\n\t"] {
        let err = store.create(2020, summary, 1).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ReviewValidationError::BlankSummary)
        ));
    }
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn unknown_employee_is_rejected_without_insert() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let err = store.create(2021, "Solid", 42).unwrap_err();
    assert!(matches!(err, RepoError::UnknownEmployee(42)));
    assert_eq!(review_count(&conn), 0);
}

#[test]
fn save_on_persisted_review_is_a_no_op() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let review = store.create(2021, "Steady", 1).unwrap();
    review.borrow_mut().set_summary("Changed locally").unwrap();

    let again = store.save(&review).unwrap();
    assert!(std::rc::Rc::ptr_eq(&again, &review));
    assert_eq!(review_count(&conn), 1);

    let stored: String = conn
        .query_row("SELECT summary FROM reviews WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "Steady");
}

#[test]
fn update_persists_mutated_fields() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let review = store.create(2021, "Needs improvement", 1).unwrap();
    let id = review.borrow().id().unwrap();
    {
        let mut current = review.borrow_mut();
        current.set_year(2023).unwrap();
        current.set_summary("Great turnaround").unwrap();
        current.set_employee_id(2, &conn).unwrap();
    }
    store.update(&review).unwrap();

    let mut fresh_store = SqliteReviewStore::try_new(&conn).unwrap();
    let reloaded = fresh_store.find_by_id(id).unwrap().unwrap();
    let reloaded = reloaded.borrow();
    assert_eq!(reloaded.year(), 2023);
    assert_eq!(reloaded.summary(), "Great turnaround");
    assert_eq!(reloaded.employee_id(), 2);
}

#[test]
fn update_on_unpersisted_review_is_a_state_error() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();
    store.create(2020, "Existing", 1).unwrap();

    let draft = store.new_review(2024, "Draft", 2).unwrap();
    let err = store.update(&draft).unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted));

    let summary: String = conn
        .query_row("SELECT summary FROM reviews WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(summary, "Existing");
    assert_eq!(review_count(&conn), 1);
}

#[test]
fn delete_on_unpersisted_review_is_a_no_op() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();

    // No table yet: a storage call here would fail.
    let draft = store.new_review(2024, "Draft", 2).unwrap();
    store.delete(&draft).unwrap();
    assert_eq!(draft.borrow().id(), None);
}

#[test]
fn delete_evicts_and_resave_gets_new_id() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let first = store.create(2020, "First", 1).unwrap();
    let second = store.create(2021, "Second", 2).unwrap();
    let first_id = first.borrow().id().unwrap();
    let second_id = second.borrow().id().unwrap();

    store.delete(&first).unwrap();
    assert_eq!(first.borrow().id(), None);
    assert!(store.cached(first_id).is_none());
    assert!(store.find_by_id(first_id).unwrap().is_none());

    store.save(&first).unwrap();
    let new_id = first.borrow().id().unwrap();
    assert_ne!(new_id, first_id);
    assert_ne!(new_id, second_id);
    assert!(std::rc::Rc::ptr_eq(&store.cached(new_id).unwrap(), &first));
    assert_eq!(review_count(&conn), 2);
}

#[test]
fn get_all_returns_rows_in_insertion_order() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    store.create(2020, "a", 1).unwrap();
    store.create(2021, "b", 2).unwrap();
    store.create(2022, "c", 3).unwrap();

    let summaries: Vec<String> = store
        .get_all()
        .unwrap()
        .iter()
        .map(|review| review.borrow().summary().to_string())
        .collect();
    assert_eq!(summaries, vec!["a", "b", "c"]);
}

#[test]
fn drop_then_create_table_leaves_empty_store() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();
    store.create(2022, "Exceeded expectations", 3).unwrap();
    assert_eq!(store.cache_len(), 1);

    store.drop_table().unwrap();
    store.drop_table().unwrap();
    assert_eq!(store.cache_len(), 0);

    store.create_table().unwrap();
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn orphaned_review_update_surfaces_storage_error() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();
    let review = store.create(2022, "Orphan", 1).unwrap();

    store.drop_table().unwrap();
    let err = store.update(&review).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn store_requires_employees_table() {
    let conn = open_db_in_memory().unwrap();
    let result = SqliteReviewStore::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("employees"))
    ));
}

#[test]
fn row_contract_serializes_four_columns() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();
    let review = store.create(2022, "Exceeded expectations", 3).unwrap();

    let row = review.borrow().to_row().unwrap();
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": 1,
            "year": 2022,
            "summary": "Exceeded expectations",
            "employee_id": 3
        })
    );
}

#[test]
fn resave_after_deleting_only_row_gets_fresh_id() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();

    let review = store.create(2022, "Only", 1).unwrap();
    let original = review.borrow().id().unwrap();

    store.delete(&review).unwrap();
    store.save(&review).unwrap();

    let new_id = review.borrow().id().unwrap();
    assert_ne!(new_id, original);
    assert!(store.find_by_id(original).unwrap().is_none());
    assert_eq!(review_count(&conn), 1);
}

#[test]
fn null_column_is_a_storage_error_on_both_hydration_paths() {
    let conn = seeded_connection();
    let mut store = SqliteReviewStore::try_new(&conn).unwrap();
    store.create_table().unwrap();
    conn.execute(
        "INSERT INTO reviews (year, summary, employee_id) VALUES (2021, NULL, 1);",
        [],
    )
    .unwrap();

    let err = store.find_by_id(1).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    let cached = store.create(2022, "Cached", 2).unwrap();
    let cached_id = cached.borrow().id().unwrap();
    conn.execute("UPDATE reviews SET year = NULL WHERE id = ?1;", [cached_id])
        .unwrap();

    let err = store.find_by_id(cached_id).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(cached.borrow().year(), 2022);
}
