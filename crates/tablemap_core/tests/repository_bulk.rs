use rusqlite::Connection;
use tablemap_core::{
    impl_model, open_db_in_memory, Collection, FieldValue, Model, ModelError, RepoError,
    Repository,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
    email: String,
}

fn check_user(user: &User) -> Result<(), ModelError> {
    if !user.email.contains('@') {
        return Err(ModelError::Invalid {
            model: "User",
            message: "email must contain @".to_string(),
        });
    }
    Ok(())
}

impl_model!(User { id, name, email }, validate = check_user);

#[derive(Debug, Clone, Default, PartialEq)]
struct Marker {
    id: i64,
}

impl_model!(Marker { id });

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (name <> ''),
            email TEXT NOT NULL UNIQUE
        );
        CREATE TABLE markers (id INTEGER PRIMARY KEY AUTOINCREMENT);",
    )
    .unwrap();
    conn
}

fn user(id: i64, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

fn table_state(repo: &Repository<'_, User>) -> Vec<User> {
    repo.get_all().unwrap().into_vec()
}

#[test]
fn insert_collection_on_empty_collection_touches_nothing() {
    let conn = setup();
    // Table does not exist: any executed statement would fail.
    let repo = Repository::<User>::new(&conn, "missing_table", "id");

    repo.insert_collection(&Collection::new(), true).unwrap();
    repo.update_collection(&Collection::new(), true).unwrap();
}

#[test]
fn insert_collection_inserts_all_rows_in_order_without_keys() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");

    let batch = Collection::from(vec![
        user(0, "A", "a@x.com"),
        user(77, "B", "b@x.com"),
        user(0, "C", "c@x.com"),
    ]);
    repo.insert_collection(&batch, false).unwrap();

    assert_eq!(
        table_state(&repo),
        vec![
            user(1, "A", "a@x.com"),
            user(2, "B", "b@x.com"),
            user(3, "C", "c@x.com"),
        ]
    );
    // Keys are not written back onto the batch.
    assert_eq!(batch[1].id, 77);
}

#[test]
fn insert_collection_failure_rolls_back_whole_batch() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");
    repo.insert(&mut user(0, "Existing", "e@x.com")).unwrap();

    let batch = Collection::from(vec![
        user(0, "A", "a@x.com"),
        user(0, "Dup", "e@x.com"),
    ]);
    let err = repo.insert_collection(&batch, false).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert_eq!(table_state(&repo), vec![user(1, "Existing", "e@x.com")]);

    // Connection is usable after the rollback.
    repo.insert_collection(&Collection::from(vec![user(0, "A", "a@x.com")]), false)
        .unwrap();
    assert_eq!(repo.get_all().unwrap().count(), 2);
}

#[test]
fn insert_collection_validates_items_only_when_asked() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");
    let batch = Collection::from(vec![user(0, "A", "a@x.com"), user(0, "B", "no-at")]);

    let err = repo.insert_collection(&batch, true).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(table_state(&repo).is_empty());

    repo.insert_collection(&batch, false).unwrap();
    assert_eq!(table_state(&repo).len(), 2);
}

#[test]
fn insert_collection_of_key_only_models_uses_default_values() {
    let conn = setup();
    let repo = Repository::<Marker>::new(&conn, "markers", "id");

    let batch = Collection::from(vec![Marker::default(), Marker::default()]);
    repo.insert_collection(&batch, false).unwrap();

    let ids = repo
        .get_all()
        .unwrap()
        .iter()
        .map(|marker| marker.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn update_collection_upserts_by_primary_key() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");
    repo.insert(&mut user(0, "A", "a@x.com")).unwrap();

    let batch = Collection::from(vec![
        user(1, "A2", "a2@x.com"),
        user(5, "E", "e@x.com"),
    ]);
    repo.update_collection(&batch, true).unwrap();

    assert_eq!(
        table_state(&repo),
        vec![user(1, "A2", "a2@x.com"), user(5, "E", "e@x.com")]
    );
}

#[test]
fn update_collection_is_idempotent() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");
    let batch = Collection::from(vec![
        user(1, "A", "a@x.com"),
        user(2, "B", "b@x.com"),
    ]);

    repo.update_collection(&batch, false).unwrap();
    let after_first = table_state(&repo);
    repo.update_collection(&batch, false).unwrap();

    assert_eq!(table_state(&repo), after_first);
    assert_eq!(after_first.len(), 2);
}

#[test]
fn update_collection_failure_rolls_back_and_reports() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");
    repo.insert(&mut user(0, "A", "a@x.com")).unwrap();

    let batch = Collection::from(vec![
        user(1, "Changed", "a@x.com"),
        user(2, "", "blank@x.com"),
    ]);
    let err = repo.update_collection(&batch, false).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert_eq!(table_state(&repo), vec![user(1, "A", "a@x.com")]);
}

#[test]
fn update_collection_of_key_only_models_ignores_conflicts() {
    let conn = setup();
    let repo = Repository::<Marker>::new(&conn, "markers", "id");
    repo.insert(&mut Marker::default()).unwrap();

    let batch = Collection::from(vec![Marker { id: 1 }, Marker { id: 3 }]);
    repo.update_collection(&batch, false).unwrap();

    let found = repo.get(&[("id", FieldValue::Integer(3))], &[]).unwrap();
    assert_eq!(found.count(), 1);
    assert_eq!(repo.get_all().unwrap().count(), 2);
    assert_eq!(Marker::FIELDS, &["id"]);
}

#[test]
fn oversized_batch_fails_as_one_db_error_and_leaves_table_untouched() {
    let conn = setup();
    let repo = Repository::<User>::new(&conn, "users", "id");

    // Two bound values per row: well past SQLite's bound-parameter limit.
    let batch = (0..20_000)
        .map(|index| user(0, "bulk", &format!("u{index}@x.com")))
        .collect::<Collection<_>>();
    let err = repo.insert_collection(&batch, false).unwrap_err();

    assert!(matches!(err, RepoError::Db(_)));
    assert!(err.to_string().contains("too many SQL variables"));
    assert!(table_state(&repo).is_empty());

    repo.insert_collection(&Collection::from(vec![user(0, "A", "a@x.com")]), false)
        .unwrap();
    assert_eq!(repo.get_all().unwrap().count(), 1);
}
