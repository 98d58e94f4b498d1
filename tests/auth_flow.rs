//! Registration, token issuance and both authentication strategies against a
//! real Postgres. Run with `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use cookbook::{
    auth::{repo_types::User, services, tokens},
    error::AppError,
};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn register_returns_populated_user(pool: PgPool) {
    let user = common::user(&pool, "ada").await;
    assert!(user.id > 0);
    assert_eq!(user.username, "ada");
    assert!(user.password_hash.starts_with("$argon2"));
    assert!(user.token.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn duplicate_email_is_a_conflict(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    services::register(&mut conn, common::register_request("ada", "a@example.com"))
        .await
        .unwrap();

    let err = services::register(&mut conn, common::register_request("grace", "a@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = services::register(&mut conn, common::register_request("ada", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn password_strategy_resolves_and_fails_closed(pool: PgPool) {
    common::user(&pool, "ada").await;
    let mut conn = pool.acquire().await.unwrap();

    let user = services::authenticate_password(&mut conn, "ada", "ada-password")
        .await
        .unwrap();
    assert_eq!(user.username, "ada");

    let err = services::authenticate_password(&mut conn, "ada", "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication { .. }));

    let err = services::authenticate_password(&mut conn, "nobody", "ada-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn token_is_reused_inside_window_then_rotated(pool: PgPool) {
    let user = common::user(&pool, "ada").await;
    let policy = tokens::TokenPolicy::default();
    let t0 = OffsetDateTime::now_utc();

    let mut conn = pool.acquire().await.unwrap();
    let first = tokens::issue_or_reuse(&mut conn, &policy, user.id, t0).await.unwrap();
    assert_eq!(first.token.len(), 32);

    let again = tokens::issue_or_reuse(&mut conn, &policy, user.id, t0 + Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(again, first);

    let late = t0 + Duration::minutes(59) + Duration::seconds(30);
    let rotated = tokens::issue_or_reuse(&mut conn, &policy, user.id, late).await.unwrap();
    assert_ne!(rotated.token, first.token);

    let stored = User::find_by_id(&mut conn, user.id).await.unwrap().unwrap();
    assert_eq!(stored.token.as_deref(), Some(rotated.token.as_str()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn token_strategy_honours_expiry(pool: PgPool) {
    let user = common::user(&pool, "ada").await;
    let policy = tokens::TokenPolicy::default();
    let t0 = OffsetDateTime::now_utc();

    let mut conn = pool.acquire().await.unwrap();
    let issued = tokens::issue_or_reuse(&mut conn, &policy, user.id, t0).await.unwrap();

    let resolved = services::authenticate_token(&mut conn, &issued.token, t0)
        .await
        .unwrap();
    assert_eq!(resolved.id, user.id);

    let err = services::authenticate_token(&mut conn, &issued.token, issued.token_expiration)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication { .. }));

    let err = services::authenticate_token(&mut conn, "0123456789abcdef0123456789abcdef", t0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication { .. }));

    // authenticating never moves the expiry
    let stored = User::find_by_id(&mut conn, user.id).await.unwrap().unwrap();
    assert_eq!(stored.token_expiration, Some(issued.token_expiration));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn padded_username_logs_in_as_registered(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let mut req = common::register_request("ada", "ada@example.com");
    req.username = " ada ".into();
    let user = services::register(&mut conn, req).await.unwrap();
    assert_eq!(user.username, "ada");

    for given in [" ada ", "ada"] {
        let resolved = services::authenticate_password(&mut conn, given, "ada-password")
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id, "{given:?}");
    }
}
