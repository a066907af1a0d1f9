//! Runs the API against a real Postgres from `configuration.yaml`.
//! `cargo test -- --ignored` once the database is up.

mod common;

use std::sync::Arc;

use common::{spawn_app_on, test_jwt_settings, TestApp, PASSWORD};
use rbac_api::configuration::{get_configuration, DatabaseSettings};
use rbac_api::domain::{NewUser, Role, UserChanges};
use rbac_api::error::{AppError, DatabaseError};
use rbac_api::store::{fingerprint, CredentialStore, PgStore, TokenLedger};
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

struct PgTestApp {
    app: TestApp<PgStore>,
    db_pool: PgPool,
}

async fn spawn_app() -> PgTestApp {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    let db_pool = configure_database(&configuration.database).await;

    let app = spawn_app_on(Arc::new(PgStore::new(db_pool.clone())), test_jwt_settings());

    PgTestApp { app, db_pool }
}

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let db_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    PgStore::new(db_pool.clone())
        .migrate()
        .await
        .expect("Failed to migrate the database.");
    db_pool
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        role: Role::User,
        password_hash: "not-a-real-hash".to_string(),
    }
}

async fn count(pool: &PgPool, sql: &str, user_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn unique_index_rejects_email_differing_only_in_case() {
    let test = spawn_app().await;
    let store = &test.app.store;

    store.insert_user(new_user("alice@example.com")).await.unwrap();
    let err = store
        .insert_user(new_user("ALICE@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Database(DatabaseError::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn register_duplicate_email_returns_409() {
    let test = spawn_app().await;

    let first = test.app.register("Alice Smith", "alice@example.com", "user").await;
    assert_eq!(201, first.status().as_u16());

    let second = test.app.register("Alice Again", "Alice@Example.com", "user").await;
    assert_eq!(409, second.status().as_u16());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&test.db_pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn refresh_token_is_single_use() {
    let test = spawn_app().await;
    let session = test.app.signed_in("alice@example.com", "user").await;

    let stored: String = sqlx::query_scalar("SELECT token_hash FROM refresh_tokens")
        .fetch_one(&test.db_pool)
        .await
        .unwrap();
    assert_eq!(stored, fingerprint(&session.refresh_token));

    let body = json!({"refreshToken": session.refresh_token});
    let first = test.app.post_json("/auth/refresh-token", &body).await;
    assert_eq!(200, first.status().as_u16());

    let replay = test.app.post_json("/auth/refresh-token", &body).await;
    assert_eq!(401, replay.status().as_u16());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn concurrent_consumers_have_a_single_winner() {
    let test = spawn_app().await;
    let store = &test.app.store;
    let user = store.insert_user(new_user("alice@example.com")).await.unwrap();
    store.record_refresh_token("refresh.token.value", user.id).await.unwrap();

    let (a, b) = tokio::join!(
        store.consume_refresh_token("refresh.token.value", user.id),
        store.consume_refresh_token("refresh.token.value", user.id),
    );

    assert!(a.unwrap() ^ b.unwrap());
    assert!(!store
        .consume_refresh_token("refresh.token.value", user.id)
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn update_user_keeps_unset_columns() {
    let test = spawn_app().await;
    let store = &test.app.store;
    let user = store.insert_user(new_user("alice@example.com")).await.unwrap();

    let updated = store
        .update_user(
            user.id,
            UserChanges {
                role: Some(Role::Moderator),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("User vanished");

    assert_eq!(updated.role, Role::Moderator);
    assert_eq!(updated.name, "Test User");
    assert_eq!(updated.email, "alice@example.com");
    assert!(store
        .update_user(Uuid::new_v4(), UserChanges::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn deleting_a_user_removes_its_tokens() {
    let test = spawn_app().await;
    let user = test.app.signed_in("user@example.com", "user").await;
    let admin = test.app.signed_in("admin@example.com", "admin").await;
    let user_id = Uuid::parse_str(&user.id).unwrap();

    let response = test.app.get_with_token("/auth/logout", &user.access_token).await;
    assert_eq!(204, response.status().as_u16());
    test.app.login("user@example.com", PASSWORD).await;

    assert_eq!(
        count(&test.db_pool, "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1", user_id).await,
        1
    );
    assert_eq!(
        count(&test.db_pool, "SELECT COUNT(*) FROM invalid_tokens WHERE user_id = $1", user_id).await,
        1
    );

    let response = test
        .app
        .client
        .delete(test.app.url(&format!("/users/{}", user.id)))
        .bearer_auth(&admin.access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["body"]["message"], "User deleted successfully");

    for table in ["users WHERE id", "refresh_tokens WHERE user_id", "invalid_tokens WHERE user_id"] {
        let sql = format!("SELECT COUNT(*) FROM {} = $1", table);
        assert_eq!(count(&test.db_pool, &sql, user_id).await, 0, "{}", table);
    }
}
