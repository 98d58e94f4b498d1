//! The full router over a real Postgres: Basic credentials for `/token`,
//! bearer tokens everywhere else. Run with `DATABASE_URL=... cargo test -- --ignored`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64ct::{Base64, Encoding};
use cookbook::{
    app::build_app,
    config::{AppConfig, TokenConfig},
    state::AppState,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

fn app(pool: PgPool) -> Router {
    let config = AppConfig {
        database_url: String::new(),
        host: "127.0.0.1".into(),
        port: 0,
        max_connections: 1,
        token: TokenConfig::default(),
    };
    build_app(AppState {
        db: pool,
        config: Arc::new(config),
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn basic(username: &str, password: &str) -> Option<String> {
    let raw = format!("{username}:{password}");
    Some(format!("Basic {}", Base64::encode_string(raw.as_bytes())))
}

fn bearer(token: &Value) -> Option<String> {
    Some(format!("Bearer {}", token.as_str().unwrap()))
}

fn registration(username: &str, email: &str) -> Value {
    json!({
        "firstName": "Test",
        "lastName": username,
        "username": username,
        "email": email,
        "password": format!("{username}-password"),
    })
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn register_token_and_owner_only_delete(pool: PgPool) {
    let app = app(pool);

    let (status, ada) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(registration("ada", "ada@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(ada["id"].as_i64().unwrap() > 0);
    assert_eq!(ada["username"], "ada");
    assert!(ada.get("password").is_none() && ada.get("email").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(registration("grace", "ada@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, grace) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(registration("grace", "grace@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(grace["id"], ada["id"]);

    let (status, first) = send(&app, Method::GET, "/token", basic("ada", "ada-password"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, Method::GET, "/token", basic("ada", "ada-password"), None).await;
    assert_eq!(first["token"], second["token"]);
    assert_eq!(first["tokenExpiration"], second["tokenExpiration"]);

    let (status, _) = send(&app, Method::GET, "/token", basic("ada", "wrong"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, grace_token) =
        send(&app, Method::GET, "/token", basic("grace", "grace-password"), None).await;

    let (status, me) = send(&app, Method::GET, "/users/me", bearer(&first["token"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], ada["id"]);

    let (status, recipe) = send(
        &app,
        Method::POST,
        "/recipes",
        bearer(&first["token"]),
        Some(json!({
            "name": "Dal",
            "description": null,
            "cuisine": "Indian",
            "cookTime": "40 min",
            "servings": "4",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recipe["userId"], ada["id"]);
    let uri = format!("/recipes/{}", recipe["id"].as_i64().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, bearer(&grace_token["token"]), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, &uri, bearer(&first["token"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["success"].is_string());

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn bearer_routes_reject_credentials_meant_for_token(pool: PgPool) {
    let app = app(pool);
    send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(registration("ada", "ada@example.com")),
    )
    .await;

    let (status, _) = send(&app, Method::GET, "/users/me", basic("ada", "ada-password"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::GET,
        "/users/me",
        Some("Bearer 0123456789abcdef0123456789abcdef".into()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
