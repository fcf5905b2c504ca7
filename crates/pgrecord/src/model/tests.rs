use crate::entities::{Post, Profile, Role, User};
use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, EntityConfig, HasAttributes, Relation};
use crate::testing::{RecordingConnector, StatementKind, row};
use crate::value::Value;

crate::entity! {
    struct Account {
        config: EntityConfig::new("account").with_fillable(&["name", "email"]),
        relations: [],
    }
}

crate::entity! {
    struct Locked {
        config: EntityConfig::new("locked")
            .with_fillable(&["name"])
            .with_guarded(&["*"]),
        relations: [],
    }
}

fn alice() -> User {
    User::hydrate(row([
        ("id", Value::Int(1)),
        ("name", Value::from("Alice")),
        ("email", Value::from("alice@example.com")),
    ]))
}

#[test]
fn test_fill_drops_non_fillable_keys() {
    let account = Account::make(crate::record! {
        "name" => "Alice",
        "email" => "alice@example.com",
        "role" => "admin",
    });
    assert_eq!(account.get_attribute("name"), Some(&Value::from("Alice")));
    assert!(account.get_attribute("role").is_none());
    assert_eq!(account.get_attributes().len(), 2);
}

#[test]
fn test_guarded_wildcard_blocks_fill() {
    let locked = Locked::make(crate::record! { "name" => "x" });
    assert!(locked.get_attributes().is_empty());

    let mut locked = Locked::new();
    locked.set_attribute("name", "direct");
    assert_eq!(locked.get_attribute("name"), Some(&Value::from("direct")));
}

#[test]
fn test_new_entity_is_transient() {
    let user = User::make(crate::record! { "name" => "Alice" });
    assert!(!user.exists());
    assert!(user.get_original().is_empty());
    assert!(user.get_key().is_none());
    assert_eq!(User::config().table(), "users");
    assert_eq!(user.key_name(), "id");
}

#[test]
fn test_dirty_tracking() {
    let mut user = alice();
    assert!(!user.is_dirty());

    user.set_attribute("name", "Alicia");
    user.set_attribute("age", 30);
    let dirty = user.get_dirty();
    assert_eq!(dirty.len(), 2);
    assert_eq!(dirty.get("name"), Some(&Value::from("Alicia")));
    assert_eq!(user.get_original().get("name"), Some(&Value::from("Alice")));

    user.set_attribute("name", "Alice");
    assert_eq!(user.get_dirty().len(), 1);
}

#[tokio::test]
async fn test_clean_save_issues_no_statement() {
    let conn = RecordingConnector::new();
    let mut user = alice();
    assert!(user.save(&conn).await.unwrap());
    assert!(user.get_dirty().is_empty());
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_dirty_save_updates_only_changes() {
    let conn = RecordingConnector::new();
    let mut user = alice();
    user.set_attribute("name", "Alicia");

    assert!(user.save(&conn).await.unwrap());

    let statements = conn.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].sql,
        "UPDATE users SET name = :update_name WHERE id = :id"
    );
    assert_eq!(statements[0].binding(":update_name"), Some(&Value::from("Alicia")));
    assert_eq!(statements[0].binding(":id"), Some(&Value::Int(1)));
    assert!(!user.is_dirty());
    assert_eq!(user.get_original().get("email"), Some(&Value::from("alice@example.com")));
}

#[tokio::test]
async fn test_update_touching_no_rows_keeps_dirty_state() {
    let conn = RecordingConnector::new();
    conn.push_affected(0);
    let mut user = alice();
    user.set_attribute("name", "Alicia");

    assert!(!user.save(&conn).await.unwrap());
    assert!(user.is_dirty());
}

#[tokio::test]
async fn test_changing_the_key_updates_by_stored_key() {
    let conn = RecordingConnector::new();
    let mut user = alice();
    user.set_attribute("id", 7);
    user.save(&conn).await.unwrap();

    let statement = &conn.statements()[0];
    assert_eq!(statement.sql, "UPDATE users SET id = :update_id WHERE id = :id");
    assert_eq!(statement.binding(":id"), Some(&Value::Int(1)));
    assert_eq!(statement.binding(":update_id"), Some(&Value::Int(7)));
}

#[tokio::test]
async fn test_create_assigns_generated_key() {
    let conn = RecordingConnector::new();
    conn.set_last_insert_id(42);

    let user = User::create(
        &conn,
        crate::record! { "name" => "Alice", "email" => "alice@example.com" },
    )
    .await
    .unwrap();

    assert!(user.exists());
    assert_eq!(user.get_key(), Some(&Value::Int(42)));
    assert!(!user.is_dirty());
    assert_eq!(
        conn.sql_log(),
        vec!["INSERT INTO users (email, name) VALUES (:email, :name) RETURNING id".to_string()]
    );
}

#[tokio::test]
async fn test_generated_key_comes_from_the_insert_itself() {
    let conn = RecordingConnector::new();
    // Another writer on the same connector already moved the sequence on.
    conn.set_last_insert_id(99);
    conn.push_rows(vec![row([("id", Value::Int(42))])]);

    let user = User::create(&conn, crate::record! { "name" => "Alice" })
        .await
        .unwrap();

    assert_eq!(user.get_key(), Some(&Value::Int(42)));
    let statements = conn.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].kind, StatementKind::Query);
}

#[tokio::test]
async fn test_insert_returning_nothing_leaves_entity_transient() {
    let conn = RecordingConnector::new();
    conn.push_rows(Vec::new());

    let mut user = User::make(crate::record! { "name" => "Alice" });
    assert!(!user.save(&conn).await.unwrap());
    assert!(!user.exists());
    assert!(user.is_dirty());
}

#[tokio::test]
async fn test_insert_keeps_explicit_key() {
    let conn = RecordingConnector::new();
    conn.set_last_insert_id(42);

    let user = User::create(&conn, crate::record! { "id" => 5, "name" => "Bob" })
        .await
        .unwrap();
    assert_eq!(user.get_key(), Some(&Value::Int(5)));
    assert_eq!(
        conn.sql_log(),
        vec!["INSERT INTO users (id, name) VALUES (:id, :name)".to_string()]
    );
}

#[tokio::test]
async fn test_insert_ignores_zero_last_insert_id() {
    let conn = RecordingConnector::new();
    conn.set_last_insert_id(0);

    let account = Account::create(&conn, crate::record! { "name" => "Carol" })
        .await
        .unwrap();
    assert!(account.exists());
    assert!(account.get_key().is_none());
}

#[tokio::test]
async fn test_insert_leaves_out_null_key() {
    let conn = RecordingConnector::new();
    let mut user = User::new();
    user.set_attribute("id", Value::Null);
    user.set_attribute("name", "Dan");
    user.save(&conn).await.unwrap();

    assert_eq!(
        conn.sql_log(),
        vec!["INSERT INTO users (name) VALUES (:name) RETURNING id".to_string()]
    );
}

#[tokio::test]
async fn test_empty_insert_is_a_silent_success() {
    let conn = RecordingConnector::new();
    let user = User::create(&conn, crate::record! {}).await.unwrap();
    assert!(!user.exists());
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_delete_transient_is_a_no_op() {
    let conn = RecordingConnector::new();
    let mut user = User::make(crate::record! { "name" => "Alice" });
    assert!(!user.delete(&conn).await.unwrap());
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_delete_persisted() {
    let conn = RecordingConnector::new();
    let mut user = alice();

    assert!(user.delete(&conn).await.unwrap());
    assert!(!user.exists());
    assert_eq!(conn.sql_log(), vec!["DELETE FROM users WHERE id = :id".to_string()]);

    // A second delete never reaches storage.
    assert!(!user.delete(&conn).await.unwrap());
    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn test_find_hydrates_row() {
    let conn = RecordingConnector::new();
    let stored = row([("id", Value::Int(3)), ("name", Value::from("Eve"))]);
    conn.push_rows(vec![stored.clone()]);

    let user = User::find(&conn, 3).await.unwrap().unwrap();
    assert!(user.exists());
    assert_eq!(user.get_attributes(), &stored);
    assert!(!user.is_dirty());
    assert_eq!(conn.sql_log(), vec!["SELECT * FROM users WHERE id = :id LIMIT 1".to_string()]);
}

#[tokio::test]
async fn test_find_or_fail_on_missing_key() {
    let conn = RecordingConnector::new();
    assert!(User::find(&conn, 99999).await.unwrap().is_none());

    let err = User::find_or_fail(&conn, 99999).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No user found with key 99999");
}

#[tokio::test]
async fn test_all_hydrates_every_row() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![
        row([("id", Value::Int(1))]),
        row([("id", Value::Int(2))]),
    ]);

    let users = User::all(&conn).await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.exists()));
    assert_eq!(conn.sql_log(), vec!["SELECT * FROM users".to_string()]);
}

#[tokio::test]
async fn test_update_model_and_destroy_bypass_instances() {
    let conn = RecordingConnector::new();
    conn.push_affected(1);
    conn.push_affected(1);

    let updated = User::update_model(&conn, 4, crate::record! { "status" => "inactive" })
        .await
        .unwrap();
    let deleted = User::destroy(&conn, 4).await.unwrap();

    assert_eq!((updated, deleted), (1, 1));
    assert_eq!(
        conn.sql_log(),
        vec![
            "UPDATE users SET status = :update_status WHERE id = :id".to_string(),
            "DELETE FROM users WHERE id = :id".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_refresh_reloads_attributes() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![row([("id", Value::Int(1)), ("name", Value::from("Stored"))])]);

    let mut user = alice();
    user.set_attribute("name", "Local");
    user.model_mut().set_relation("posts", Relation::Many(Vec::new()));
    user.refresh(&conn).await.unwrap();

    assert_eq!(user.get_attribute("name"), Some(&Value::from("Stored")));
    assert!(user.get_attribute("email").is_none());
    assert!(!user.is_dirty());
    assert!(!user.relation_loaded("posts"));
}

#[tokio::test]
async fn test_refresh_without_key_fails() {
    let conn = RecordingConnector::new();
    let mut user = User::new();
    let err = user.refresh(&conn).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[tokio::test]
async fn test_has_many_and_has_one_queries() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![row([("id", Value::Int(10)), ("user_id", Value::Int(1))])]);

    let user = alice();
    let posts = user.posts(&conn).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].exists());

    let profile = user.profile(&conn).await.unwrap();
    assert!(profile.is_none());

    let statements = conn.statements();
    assert_eq!(statements[0].sql, "SELECT * FROM posts WHERE user_id = :user_id");
    assert_eq!(statements[0].binding(":user_id"), Some(&Value::Int(1)));
    assert_eq!(
        statements[1].sql,
        "SELECT * FROM profiles WHERE user_id = :user_id LIMIT 1"
    );
    // Direct relation calls do not memoize.
    assert!(!user.relation_loaded("posts"));
}

#[tokio::test]
async fn test_belongs_to_uses_owner_foreign_key() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![row([("id", Value::Int(1)), ("name", Value::from("Alice"))])]);

    let post = Post::hydrate(row([("id", Value::Int(10)), ("user_id", Value::Int(1))]));
    let author = post.user(&conn).await.unwrap().unwrap();
    assert_eq!(author.full_name(), Some("Alice"));

    let statement = &conn.statements()[0];
    assert_eq!(statement.sql, "SELECT * FROM users WHERE id = :id LIMIT 1");
    assert_eq!(statement.binding(":id"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn test_belongs_to_many_joins_through_pivot() {
    let conn = RecordingConnector::new();
    let user = alice();
    let roles: Vec<Role> = user.roles(&conn).await.unwrap();
    assert!(roles.is_empty());

    let statement = &conn.statements()[0];
    assert_eq!(
        statement.sql,
        "SELECT roles.* FROM users \
         INNER JOIN user_roles ON users.id = user_roles.user_id \
         INNER JOIN roles ON user_roles.role_id = roles.id \
         WHERE users.id = :users_id"
    );
    assert_eq!(statement.binding(":users_id"), Some(&Value::Int(1)));
}

#[test]
fn test_belongs_to_many_default_pivot() {
    let user = alice();
    let sql = user.belongs_to_many_query::<Role>(None, None, None).to_sql();
    assert_eq!(
        sql,
        "SELECT roles.* FROM users \
         INNER JOIN role_user ON users.id = role_user.user_id \
         INNER JOIN roles ON role_user.role_id = roles.id \
         WHERE users.id = :users_id"
    );
}

#[tokio::test]
async fn test_get_relation_memoizes() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![row([("id", Value::Int(10)), ("title", Value::from("Hello"))])]);

    let mut user = alice();
    let posts = user.get_relation(&conn, "posts").await.unwrap().many::<Post>();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].get_attribute("title"), Some(&Value::from("Hello")));

    user.get_relation(&conn, "posts").await.unwrap();
    assert_eq!(conn.statements().len(), 1);
    assert!(user.relation_loaded("posts"));
}

#[tokio::test]
async fn test_get_relation_rejects_unknown_name() {
    let conn = RecordingConnector::new();
    let mut user = alice();
    let err = user.get_relation(&conn, "followers").await.unwrap_err();
    assert!(err.is_invalid_relation());
    assert_eq!(
        err.to_string(),
        "Relation [followers] is not defined on entity [user]"
    );
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_eager_load_resolves_per_entity() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![
        row([("id", Value::Int(1))]),
        row([("id", Value::Int(2))]),
    ]);
    conn.push_rows(vec![row([("id", Value::Int(10)), ("user_id", Value::Int(1))])]);
    conn.push_rows(Vec::new());

    let users = User::get(&conn, &User::active().with(["posts", "bogus"]))
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].relation("posts").map(|r| r.as_many().len()), Some(1));
    assert_eq!(users[1].relation("posts").map(|r| r.as_many().len()), Some(0));
    assert!(!users[0].relation_loaded("bogus"));
    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT * FROM users WHERE status = :status".to_string(),
            "SELECT * FROM posts WHERE user_id = :user_id".to_string(),
            "SELECT * FROM posts WHERE user_id = :user_id".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_first_with_relation() {
    let conn = RecordingConnector::new();
    conn.push_rows(vec![row([("id", Value::Int(1)), ("user_id", Value::Int(1))])]);
    conn.push_rows(vec![row([("id", Value::Int(1)), ("name", Value::from("Alice"))])]);

    let profile = Profile::first(&conn, &Profile::with(["user"])).await.unwrap().unwrap();
    let owner = profile.relation("user").and_then(|r| r.one::<User>()).unwrap();
    assert_eq!(owner.full_name(), Some("Alice"));
}

#[test]
fn test_to_array_expands_relations() {
    let mut user = alice();
    let post = Post::hydrate(row([("id", Value::Int(10)), ("title", Value::from("Hello"))]));
    user.model_mut().set_relation("posts", vec![post].into());
    user.model_mut().set_relation("profile", Relation::One(None));
    user.model_mut().set_relation("score", Value::Int(7).into());

    let array = user.to_array();
    assert_eq!(array["name"], serde_json::json!("Alice"));
    assert_eq!(array["posts"], serde_json::json!([{ "id": 10, "title": "Hello" }]));
    assert_eq!(array["profile"], serde_json::Value::Null);
    assert_eq!(array["score"], serde_json::json!(7));

    let json: serde_json::Value = serde_json::from_str(&user.to_json()).unwrap();
    assert_eq!(json["posts"][0]["title"], "Hello");
}

async fn create_pair(conn: &RecordingConnector, fail: bool) -> OrmResult<User> {
    crate::transaction!(conn, {
        let user = User::create(conn, crate::record! { "name" => "Alice" }).await?;
        if fail {
            conn.fail_next("boom");
        }
        Profile::create(conn, crate::record! { "user_id" => user.get_key().cloned() }).await?;
        Ok(user)
    })
}

#[tokio::test]
async fn test_transaction_commits_on_ok() {
    let conn = RecordingConnector::new();
    conn.set_last_insert_id(1);
    create_pair(&conn, false).await.unwrap();

    let log = conn.statements();
    assert_eq!(log.first().map(|s| s.sql.as_str()), Some("BEGIN"));
    assert_eq!(log.last().map(|s| s.sql.as_str()), Some("COMMIT"));
    assert_eq!(
        log.iter().filter(|s| s.sql.starts_with("INSERT")).count(),
        2
    );
}

#[tokio::test]
async fn test_transaction_rolls_back_on_err() {
    let conn = RecordingConnector::new();
    conn.set_last_insert_id(1);
    let err = create_pair(&conn, true).await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(conn.sql_log().last().map(String::as_str), Some("ROLLBACK"));
}
