//! Integration tests for the model mapping layer: schema declaration,
//! CRUD round-trips, and model operations inside transaction scopes.

use chrono::Utc;
use litorm::{
    connection, execute, init_engine, next_id, with_transaction, DbConfig, FieldDef, LitormError,
    Model, ModelSchema, Result, Row,
};
use once_cell::sync::Lazy;
use rusqlite::types::Value;

fn setup() {
    let _ = init_engine(DbConfig::in_memory());
}

static USER_SCHEMA: Lazy<ModelSchema> = Lazy::new(|| {
    ModelSchema::new(
        "user",
        vec![
            FieldDef::new("id", "TEXT")
                .primary_key()
                .with_default_fn(|| Value::Text(next_id())),
            FieldDef::new("email", "TEXT"),
            FieldDef::new("passwd", "TEXT"),
            FieldDef::new("admin", "INTEGER").with_default(Value::Integer(0)),
            FieldDef::new("name", "TEXT"),
            FieldDef::new("created_at", "REAL")
                .not_updatable()
                .with_default_fn(|| Value::Real(Utc::now().timestamp_millis() as f64 / 1000.0)),
        ],
    )
    .expect("valid user schema")
});

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: String,
    email: String,
    passwd: String,
    admin: bool,
    name: String,
    created_at: f64,
}

impl User {
    fn new(email: &str, name: &str) -> Self {
        User {
            id: next_id(),
            email: email.to_string(),
            passwd: "******".to_string(),
            admin: false,
            name: name.to_string(),
            created_at: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }
}

impl Model for User {
    fn schema() -> &'static ModelSchema {
        &USER_SCHEMA
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(User {
            id: row.get("id")?,
            email: row.get("email")?,
            passwd: row.get("passwd")?,
            admin: row.get("admin")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
        })
    }

    fn to_row(&self) -> Row {
        Row::from_pairs([
            ("id", Value::Text(self.id.clone())),
            ("email", Value::Text(self.email.clone())),
            ("passwd", Value::Text(self.passwd.clone())),
            ("admin", Value::Integer(i64::from(self.admin))),
            ("name", Value::Text(self.name.clone())),
            ("created_at", Value::Real(self.created_at)),
        ])
    }
}

fn setup_user_table() {
    execute(&User::schema().create_table_sql(), []).unwrap();
}

#[test]
fn insert_then_select_round_trips() {
    setup();
    let _scope = connection();
    setup_user_table();

    let user = User::new("alice@example.com", "Alice");
    assert_eq!(user.insert().unwrap(), 1);

    let loaded = User::get(user.id.clone()).unwrap().expect("user should exist");
    assert_eq!(loaded, user);

    let by_email = User::find_first("email = ?", ["alice@example.com"])
        .unwrap()
        .expect("user should be found by email");
    assert_eq!(by_email.id, user.id);
}

#[test]
fn update_touches_updatable_columns_only() {
    setup();
    let _scope = connection();
    setup_user_table();

    let mut user = User::new("bob@example.com", "Bob");
    user.insert().unwrap();
    let original_created_at = user.created_at;

    user.name = "Robert".to_string();
    user.admin = true;
    // created_at is not updatable; whatever the struct now carries is
    // ignored by the UPDATE statement
    user.created_at = 0.0;
    assert_eq!(user.update().unwrap(), 1);

    let loaded = User::get(user.id.clone()).unwrap().expect("user should exist");
    assert_eq!(loaded.name, "Robert");
    assert!(loaded.admin);
    assert_eq!(loaded.created_at, original_created_at);
}

#[test]
fn delete_removes_the_row() {
    setup();
    let _scope = connection();
    setup_user_table();

    let user = User::new("carol@example.com", "Carol");
    user.insert().unwrap();
    assert_eq!(user.delete().unwrap(), 1);
    assert!(User::get(user.id.clone()).unwrap().is_none());
}

#[test]
fn model_writes_join_transaction_scopes() {
    setup();
    let _scope = connection();
    setup_user_table();

    let before = User::count_all().unwrap();

    let result: Result<()> = with_transaction(|| {
        User::new("dave@example.com", "Dave").insert()?;
        User::new("erin@example.com", "Erin").insert()?;
        Err(LitormError::Query("abort the batch".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(User::count_all().unwrap(), before);

    with_transaction(|| {
        User::new("frank@example.com", "Frank").insert()?;
        Ok(())
    })
    .unwrap();
    assert_eq!(User::count_all().unwrap(), before + 1);
}

#[test]
fn find_by_and_count_by_filter_rows() {
    setup();
    let _scope = connection();
    setup_user_table();

    let mut admin = User::new("root@example.com", "Root");
    admin.admin = true;
    admin.insert().unwrap();
    User::new("guest@example.com", "Guest").insert().unwrap();

    assert_eq!(User::count_by("admin = ?", [1]).unwrap(), 1);
    let admins = User::find_by("admin = ? ORDER BY email", [1]).unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, "root@example.com");
}

#[test]
fn schema_rules_are_enforced_at_declaration() {
    let missing = ModelSchema::new("m1", vec![FieldDef::new("name", "TEXT")]);
    assert!(matches!(missing.unwrap_err(), LitormError::Schema(_)));

    let duplicate = ModelSchema::new(
        "m2",
        vec![
            FieldDef::new("a", "TEXT").primary_key(),
            FieldDef::new("b", "TEXT").primary_key(),
        ],
    );
    assert!(matches!(duplicate.unwrap_err(), LitormError::Schema(_)));

    let coerced = ModelSchema::new(
        "m3",
        vec![FieldDef::new("id", "TEXT").primary_key().nullable()],
    )
    .unwrap();
    assert!(!coerced.primary_key().nullable);
    assert!(!coerced.primary_key().updatable);
}
