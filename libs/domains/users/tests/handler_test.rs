//! Handler tests for Users domain
//!
//! Drive the users router end to end over the in-memory repository:
//! - Request parsing and validation
//! - Response envelopes and status codes
//! - Error responses

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::RuntimeInfo;
use chrono::{DateTime, Utc};
use core_config::Environment;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt; // For oneshot()

fn app_with(repo: InMemoryUserRepository) -> Router {
    let service = UserService::new(repo);
    let runtime = RuntimeInfo::new("1.0.0", Environment::Development);
    Router::new().nest("/users", handlers::router(service, runtime))
}

fn app() -> Router {
    app_with(InMemoryUserRepository::new())
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, json_body(response.into_body()).await)
}

async fn create(app: &Router, body: Value) -> String {
    let (status, json) = send(app, "POST", "/users", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_user_lifecycle() {
    let app = app();

    let (status, created) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "name": "Ab", "email": "ab@example.com", "age": 28 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "User created successfully");
    assert_eq!(created["data"]["ageGroup"], "adult");
    assert_eq!(created["data"]["status"], "pending");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, "GET", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["name"], "Ab");
    assert_eq!(fetched["data"]["email"], "ab@example.com");
    assert_eq!(fetched["data"]["age"], 28);
    assert_eq!(fetched["data"]["createdAt"], created["data"]["createdAt"]);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["message"], "User updated successfully");
    assert_eq!(updated["data"]["status"], "active");
    assert_eq!(updated["data"]["name"], "Ab");
    assert_eq!(updated["data"]["email"], "ab@example.com");
    assert_eq!(updated["data"]["age"], 28);

    let (status, deleted) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "User deleted successfully");
    assert_eq!(deleted["data"]["id"], id.as_str());
    assert!(deleted["data"]["deletedAt"].is_string());

    let (status, missing) = send(&app, "GET", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "NOT_FOUND");
    assert_eq!(missing["message"], format!("No user found with ID: {id}"));
}

#[tokio::test]
async fn test_create_normalizes_input() {
    let app = app();
    let (status, created) = send(
        &app,
        "POST",
        "/users",
        Some(json!({
            "name": "  Grace Hopper ",
            "email": " Grace@Example.COM ",
            "age": 85,
            "status": "inactive"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["name"], "Grace Hopper");
    assert_eq!(created["data"]["email"], "grace@example.com");
    assert_eq!(created["data"]["ageGroup"], "senior");
    assert_eq!(created["data"]["status"], "inactive");
    assert!(created["data"].get("updatedAt").is_none());
}

#[tokio::test]
async fn test_create_duplicate_email_is_case_insensitive() {
    let app = app();
    create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 28 })).await;

    let (status, json) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "name": "Other", "email": "AB@Example.com", "age": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "CONFLICT");
    assert_eq!(json["message"], "Email already registered");
}

#[tokio::test]
async fn test_create_reports_every_invalid_field() {
    let app = app();

    let (status, json) = send(&app, "POST", "/users", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert_eq!(
        json["details"],
        json!([
            { "field": "age", "message": "Age is required" },
            { "field": "email", "message": "Email is required" },
            { "field": "name", "message": "Name is required" }
        ])
    );

    let (status, json) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "name": "A", "email": "nope", "age": 121, "status": "banned" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["age", "email", "name", "status"]);
}

#[tokio::test]
async fn test_create_rejects_malformed_body() {
    let app = app();

    let (status, json) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "name": "A", "email": "bad", "age": "28" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
    let details = json["details"].as_array().unwrap();
    let fields: Vec<&str> = details
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["age", "email", "name"]);
    assert_eq!(details[0]["message"], "Age must be an integer");

    let (status, json) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "name": "Ab", "email": "ab@example.com", "age": 28.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "age");

    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response.into_body()).await;
    assert_eq!(json["error"], "JSON_EXTRACTION");
}

#[tokio::test]
async fn test_list_second_page() {
    let app = app();
    for age in 1..=25 {
        create(
            &app,
            json!({ "name": format!("User {age:02}"), "email": format!("user{age}@example.com"), "age": age }),
        )
        .await;
    }

    let (status, json) = send(&app, "GET", "/users?page=2&limit=10&sort=age", None).await;
    assert_eq!(status, StatusCode::OK);

    let ages: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, (11..=20).collect::<Vec<i64>>());

    let pagination = &json["pagination"];
    assert_eq!(pagination["total"], 25);
    assert_eq!(pagination["page"], 2);
    assert_eq!(pagination["limit"], 10);
    assert_eq!(pagination["pages"], 3);
    assert_eq!(pagination["hasNext"], true);
    assert_eq!(pagination["hasPrev"], true);
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let app = app();
    create(&app, json!({ "name": "Cy", "email": "cy@example.com", "age": 30, "status": "active" })).await;
    create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 30, "status": "active" })).await;
    create(&app, json!({ "name": "Bo", "email": "bo@example.com", "age": 50 })).await;

    let (status, json) = send(&app, "GET", "/users?status=active&sort=-age,name", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ab", "Cy"]);
    assert_eq!(json["pagination"]["total"], 2);
    assert_eq!(json["pagination"]["pages"], 1);
    assert_eq!(json["pagination"]["hasPrev"], false);
}

#[tokio::test]
async fn test_list_defaults_newest_first_and_empty() {
    let app = app();

    let (status, json) = send(&app, "GET", "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));
    assert_eq!(json["pagination"]["pages"], 1);
    assert_eq!(json["pagination"]["hasNext"], false);

    create(&app, json!({ "name": "First", "email": "first@example.com", "age": 20 })).await;
    create(&app, json!({ "name": "Second", "email": "second@example.com", "age": 20 })).await;

    let (_, json) = send(&app, "GET", "/users", None).await;
    assert_eq!(json["data"][0]["name"], "Second");
    assert_eq!(json["data"][1]["name"], "First");
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let app = app();

    let (status, json) = send(&app, "GET", "/users?status=deleted&sort=password", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert_eq!(json["details"][0]["field"], "sort");
    assert_eq!(json["details"][1]["field"], "status");

    let (status, _) = send(&app, "GET", "/users?page=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&app, "GET", "/users?page=0&limit=1000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["limit"], 100);
}

#[tokio::test]
async fn test_malformed_id_returns_400() {
    let app = app();

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(json!({ "age": 30 }))),
        ("DELETE", None),
    ] {
        let (status, json) = send(&app, method, "/users/invalid123", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(json["error"], "INVALID_ID");
        assert_eq!(json["message"], "Invalid ID format");
    }
}

#[tokio::test]
async fn test_unknown_id_returns_404() {
    let app = app();
    let id = "665f1c2e9b1d4a0012345678";

    let (status, _) = send(&app, "PUT", &format!("/users/{id}"), Some(json!({ "age": 30 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], format!("No user found with ID: {id}"));
}

#[tokio::test]
async fn test_double_delete_returns_404() {
    let app = app();
    let id = create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 28 })).await;

    let (status, _) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_age_only_recomputes_age_group() {
    let app = app();
    let id = create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 17 })).await;
    let (_, before) = send(&app, "GET", &format!("/users/{id}"), None).await;

    tokio::time::sleep(Duration::from_millis(5)).await;

    let (status, json) = send(&app, "PUT", &format!("/users/{id}"), Some(json!({ "age": 70 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["age"], 70);
    assert_eq!(json["data"]["ageGroup"], "senior");
    assert_eq!(json["data"]["name"], "Ab");
    assert_eq!(json["data"]["status"], "pending");

    assert_eq!(json["data"]["createdAt"], before["data"]["createdAt"]);
    let created_at = timestamp(&json["data"]["createdAt"]);
    let updated_at = timestamp(&json["data"]["updatedAt"]);
    assert!(updated_at > created_at);
    assert!(updated_at > timestamp(&before["data"]["updatedAt"]));
}

#[tokio::test]
async fn test_update_validation_and_conflict() {
    let app = app();
    let id = create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 28 })).await;
    create(&app, json!({ "name": "Cd", "email": "cd@example.com", "age": 28 })).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(json!({ "name": null, "age": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "age");
    assert_eq!(json["details"][1]["field"], "name");

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(json!({ "email": "CD@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email already registered");

    // Re-submitting the user's own email is not a conflict
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(json!({ "email": "Ab@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_status_ok() {
    let app = app();
    create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 28 })).await;

    let (status, json) = send(&app, "GET", "/users/health/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "User API");
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["environment"], "development");
    assert_eq!(json["database"]["connected"], true);
    assert_eq!(json["database"]["userCount"], 1);
    assert_eq!(json["database"]["stats"]["objects"], 1);
    assert!(json["server"]["uptime"].is_number());
    assert!(json.get("errors").is_none());
}

#[tokio::test]
async fn test_health_status_degraded() {
    let repo = InMemoryUserRepository::new();
    let app = app_with(repo.clone());
    repo.set_offline(true);

    let (status, json) = send(&app, "GET", "/users/health/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["database"]["connected"], false);
    assert_eq!(json["database"]["userCount"], Value::Null);
    assert_eq!(json["database"]["stats"], Value::Null);
    assert_eq!(json["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_stats_summary() {
    let app = app();
    create(&app, json!({ "name": "Ab", "email": "ab@example.com", "age": 20 })).await;
    create(&app, json!({ "name": "Cd", "email": "cd@example.com", "age": 25, "status": "active" })).await;
    create(&app, json!({ "name": "Ef", "email": "ef@example.com", "age": 26, "status": "active" })).await;

    let (status, json) = send(&app, "GET", "/users/stats/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let summary = &json["data"]["summary"];
    assert_eq!(summary["totalUsers"], 3);
    assert_eq!(summary["averageAge"], 23.67);
    assert_eq!(summary["minAge"], 20);
    assert_eq!(summary["maxAge"], 26);
    assert_eq!(
        json["data"]["statusDistribution"],
        json!([
            { "status": "active", "count": 2 },
            { "status": "pending", "count": 1 }
        ])
    );
    assert!(json["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_stats_summary_empty() {
    let app = app();

    let (status, json) = send(&app, "GET", "/users/stats/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["summary"], json!({ "totalUsers": 0 }));
    assert_eq!(json["data"]["statusDistribution"], json!([]));
}

#[tokio::test]
async fn test_database_failure_hides_details() {
    let repo = InMemoryUserRepository::new();
    let app = app_with(repo.clone());
    repo.set_offline(true);

    let (status, json) = send(&app, "GET", "/users", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "DATABASE_ERROR");
    assert!(!json["message"].as_str().unwrap().contains("offline"));
}
