//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::client::Session;
use shared::error::{ErrorBody, ErrorCode};
use shared::models::Employee;
use staff_mock::{AppState, Config, api};
use tower::ServiceExt;

const API_KEY: &str = "test-anon-key";

fn app() -> (Router, Arc<AppState>) {
    let config = Config {
        api_key: API_KEY.into(),
        ..Config::default()
    }
    .with_seed_user("ben@example.com", "secret");
    let state = Arc::new(AppState::new(config));
    (api::router(state.clone()), state)
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("apikey", API_KEY)
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer.unwrap_or(API_KEY)));
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn sign_in(app: &Router, email: &str, password: &str) -> Session {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/auth/v1/token?grant_type=password",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn row(user_id: &str, name: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@x.com", name.to_lowercase()),
        "designation": "Engineer",
        "department": "R&D",
        "salary": 90000,
        "date_of_joining": "2024-01-15",
        "last_day_of_working": null,
        "user_id": user_id
    })
}

async fn insert(app: &Router, session: &Session, name: &str) -> Employee {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/rest/v1/employees",
            Some(&session.access_token),
            Some(json!([row(&session.user.id, name)])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let mut rows: Vec<Employee> = serde_json::from_slice(&body).unwrap();
    rows.remove(0)
}

async fn list(app: &Router, bearer: Option<&str>) -> Vec<Employee> {
    let (status, body) = send(
        app,
        request(
            Method::GET,
            "/rest/v1/employees?select=*&order=created_at.desc",
            bearer,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn error_code(body: &[u8]) -> ErrorCode {
    serde_json::from_slice::<ErrorBody>(body).unwrap().error_code()
}

#[tokio::test]
async fn test_password_grant_and_user() {
    let (app, _) = app();
    let session = sign_in(&app, "ana@example.com", "password").await;
    assert_eq!(session.user.email, "ana@example.com");

    let (status, body) = send(
        &app,
        request(Method::GET, "/auth/v1/user", Some(&session.access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(user["id"], session.user.id.as_str());
}

#[tokio::test]
async fn test_wrong_password_is_401() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/auth/v1/token?grant_type=password",
            None,
            Some(json!({ "email": "ana@example.com", "password": "nope" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), ErrorCode::InvalidCredentials);
}

#[tokio::test]
async fn test_missing_api_key_is_rejected() {
    let (app, _) = app();
    let req = Request::builder()
        .uri("/rest/v1/employees")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (app, _) = app();
    let session = sign_in(&app, "ana@example.com", "password").await;
    let (status, _) = send(
        &app,
        request(Method::POST, "/auth/v1/logout", Some(&session.access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        request(Method::GET, "/auth/v1/user", Some(&session.access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), ErrorCode::SessionExpired);
}

#[tokio::test]
async fn test_rows_are_scoped_and_newest_first() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let ben = sign_in(&app, "ben@example.com", "secret").await;

    insert(&app, &ana, "First").await;
    insert(&app, &ana, "Second").await;
    insert(&app, &ben, "Other").await;

    let names: Vec<_> = list(&app, Some(&ana.access_token))
        .await
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
    assert_eq!(list(&app, Some(&ben.access_token)).await.len(), 1);
    assert!(list(&app, None).await.is_empty());
}

#[tokio::test]
async fn test_insert_for_another_owner_is_forbidden() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/rest/v1/employees",
            Some(&ana.access_token),
            Some(json!([row("someone-else", "Ana")])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_anonymous_insert_is_401() {
    let (app, _) = app();
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/rest/v1/employees",
            None,
            Some(json!([row("u-1", "Ana")])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_overwrites_and_keeps_owner() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let created = insert(&app, &ana, "Ana").await;

    let mut change = row(&ana.user.id, "Ana Ruiz");
    change["last_day_of_working"] = json!("2024-06-01");
    let uri = format!("/rest/v1/employees?id=eq.{}", created.id);
    let (status, body) = send(
        &app,
        request(Method::PATCH, &uri, Some(&ana.access_token), Some(change)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<Employee> = serde_json::from_slice(&body).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, created.id);
    assert_eq!(rows[0].created_at, created.created_at);
    assert_eq!(rows[0].name, "Ana Ruiz");
    assert!(rows[0].last_day_of_working.is_some());

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            Some(&ana.access_token),
            Some(row("someone-else", "Ana")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), ErrorCode::OwnerImmutable);
}

#[tokio::test]
async fn test_update_out_of_scope_returns_no_rows() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let ben = sign_in(&app, "ben@example.com", "secret").await;
    let created = insert(&app, &ana, "Ana").await;

    let uri = format!("/rest/v1/employees?id=eq.{}", created.id);
    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            Some(&ben.access_token),
            Some(row(&ben.user.id, "Stolen")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<Employee> = serde_json::from_slice(&body).unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_delete_removes_exactly_one() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let first = insert(&app, &ana, "First").await;
    insert(&app, &ana, "Second").await;

    let uri = format!("/rest/v1/employees?id=eq.{}", first.id);
    let (status, body) = send(
        &app,
        request(Method::DELETE, &uri, Some(&ana.access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let removed: Vec<Employee> = serde_json::from_slice(&body).unwrap();
    assert_eq!(removed.len(), 1);

    let names: Vec<_> = list(&app, Some(&ana.access_token))
        .await
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Second"]);
}

#[tokio::test]
async fn test_delete_requires_id_filter() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let (status, body) = send(
        &app,
        request(Method::DELETE, "/rest/v1/employees", Some(&ana.access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn test_fault_injection() {
    let (app, state) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;

    state.set_fail_reads(true);
    let (status, body) = send(
        &app,
        request(Method::GET, "/rest/v1/employees", Some(&ana.access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&body), ErrorCode::DatabaseError);

    state.set_fail_writes(true);
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/rest/v1/employees",
            Some(&ana.access_token),
            Some(json!([row(&ana.user.id, "Ana")])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.read_rows().is_empty());
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let (app, _) = app();
    let ana = sign_in(&app, "ana@example.com", "password").await;
    let mut body = row(&ana.user.id, "Ana");
    body["name"] = json!("   ");
    let (status, resp) = send(
        &app,
        request(
            Method::POST,
            "/rest/v1/employees",
            Some(&ana.access_token),
            Some(json!([body])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), ErrorCode::RequiredField);
}

#[tokio::test]
async fn test_unknown_table_is_404() {
    let (app, _) = app();
    let (status, _) = send(
        &app,
        request(Method::GET, "/rest/v1/payroll", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
