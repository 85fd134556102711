use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use smartfarm::config::{BootstrapAdminConfig, Config};
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin-password";

fn test_config() -> Config {
    let db_path =
        std::env::temp_dir().join(format!("smartfarm-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.token_secret = Some("api-test-secret-api-test-secret-xx".to_string());
    config.security.bootstrap_admin = Some(BootstrapAdminConfig {
        username: "admin".to_string(),
        password: ADMIN_PASSWORD.to_string(),
        email: "admin@example.com".to_string(),
    });
    config
}

async fn spawn_app_with(config: Config) -> Router {
    let state = smartfarm::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    smartfarm::api::router(state)
}

async fn spawn_app() -> Router {
    spawn_app_with(test_config()).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str, password: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/register",
        None,
        Some(json!({
            "username": username,
            "password": password,
            "email": format!("{username}@example.com"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_house(app: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/houses",
        Some(token),
        Some(json!({ "name": name, "location": "Field A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_login_me_logout() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "alice", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    let (status, _) = send(&app, "POST", "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthenticated");
    assert!(body["error"].as_str().unwrap().contains("revoked"));
}

#[tokio::test]
async fn test_logout_twice_succeeds() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;
    let token = login(&app, "alice", "secret1").await;

    let (status, body) = send(&app, "POST", "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, "POST", "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, "POST", "/api/v1/logout", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/api/v1/logout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthenticated");

    let (status, _) = send(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;

    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "nobody", "password": "wrong" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["kind"], "invalid_credentials");
}

#[tokio::test]
async fn test_missing_and_forged_tokens_are_rejected() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("missing"));

    let (status, body) = send(&app, "GET", "/api/v1/houses", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "another1",
            "email": "alice2@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "duplicate_username");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/register",
        None,
        Some(json!({ "username": "bob", "password": "123", "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(&app, "GET", "/api/v1/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(&admin),
        Some(json!({
            "username": "operator",
            "password": "operator-pw",
            "email": "operator@example.com",
            "role": "admin",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "admin");

    let (status, body) = send(&app, "GET", "/api/v1/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, _) = send(&app, "GET", "/api/v1/users/999", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_house_ownership() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;
    register(&app, "bob", "secret2").await;
    let alice = login(&app, "alice", "secret1").await;
    let bob = login(&app, "bob", "secret2").await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let house_id = create_house(&app, &alice, "North").await;
    let uri = format!("/api/v1/houses/{house_id}");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&bob),
        Some(json!({ "name": "Mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/v1/houses", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({ "status": "maintenance" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "maintenance");

    let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_cultivation_lifecycle() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    let house_id = create_house(&app, &alice, "North").await;
    let cycle_body = json!({ "house_id": house_id });

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cultivation/stop",
        Some(&alice),
        Some(cycle_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "not_running");

    let (status, first) = send(
        &app,
        "POST",
        "/api/v1/cultivation/start",
        Some(&alice),
        Some(cycle_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["state"], "running");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cultivation/start",
        Some(&alice),
        Some(cycle_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "already_running");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/v1/houses/{house_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "active_cycle");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/cultivation/stop",
        Some(&alice),
        Some(cycle_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = send(
        &app,
        "POST",
        "/api/v1/cultivation/start",
        Some(&alice),
        Some(cycle_body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["data"]["id"], second["data"]["id"]);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/cultivation/status?house_id={house_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["house_status"], "cultivating");
    assert_eq!(body["data"]["current_cycle"], second["data"]["id"]);
    assert_eq!(body["data"]["cycles"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_starts_over_http() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    let house_id = create_house(&app, &alice, "North").await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            let token = alice.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    "POST",
                    "/api/v1/cultivation/start",
                    Some(&token),
                    Some(json!({ "house_id": house_id })),
                )
                .await
                .0
            })
        })
        .collect();

    let mut ok = 0;
    let mut conflict = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => conflict += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflict, 9);
}

#[tokio::test]
async fn test_sensor_readings() {
    let app = spawn_app().await;
    register(&app, "alice", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    let house_id = create_house(&app, &alice, "North").await;
    let uri = format!("/api/v1/iot/data?house_id={house_id}");

    let (status, body) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/iot/data",
        Some(&alice),
        Some(json!({
            "house_id": house_id,
            "temperature": 24.5,
            "humidity": 58.0,
            "light": 1100.0,
            "soil_moisture": 33.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["temperature"], 24.5);
}

#[tokio::test]
async fn test_memory_credential_backend() {
    let mut config = test_config();
    config.storage.credential_backend = smartfarm::config::CredentialBackend::Memory;
    let app = spawn_app_with(config).await;

    register(&app, "alice", "secret1").await;
    let alice = login(&app, "alice", "secret1").await;
    create_house(&app, &alice, "North").await;

    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, body) = send(&app, "GET", "/api/v1/houses", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_root_and_health() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "smartfarm");

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "ok");

    let (status, _) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
