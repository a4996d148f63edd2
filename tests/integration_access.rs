//! Router behaviour that is decided before any query runs: authentication,
//! role checks, body validation and the documentation routes.

mod common;

use axum::http::StatusCode;
use common::{send, setup_test_app, token_for, unreachable_pool};
use escola_models::UserRole;
use escola_models::ids::SchoolId;
use serde_json::json;

#[tokio::test]
async fn test_health_reports_database_down() {
    let app = setup_test_app(unreachable_pool());

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "down");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup_test_app(unreachable_pool());

    for uri in [
        "/api/students",
        "/api/classes",
        "/api/enrollments",
        "/api/schools",
        "/api/auth/me",
        "/api/users",
    ] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Missing authorization header");
    }
}

#[tokio::test]
async fn test_malformed_bearer_header_is_unauthorized() {
    let app = setup_test_app(unreachable_pool());

    let (status, _) = send(&app, "GET", "/api/students", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = setup_test_app(unreachable_pool());
    let foreign = escola_auth::create_access_token(
        escola_models::ids::UserId::new(),
        "intruder",
        UserRole::SystemAdmin,
        None,
        &escola_config::JwtConfig {
            secret: "some-other-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 3600,
        },
    )
    .unwrap();

    let (status, body) = send(&app, "GET", "/api/schools", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_schools_are_system_admin_only() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::SchoolAdmin, Some(SchoolId::new()));

    let (status, _) = send(
        &app,
        "POST",
        "/api/schools",
        Some(&token),
        Some(json!({ "name": "Escola Nova" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_students_cannot_reach_office_routes() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::Student, Some(SchoolId::new()));

    for (method, uri) in [
        ("GET", "/api/students"),
        ("GET", "/api/classes"),
        ("GET", "/api/enrollments"),
        ("GET", "/api/feedback"),
        ("GET", "/api/users"),
    ] {
        let (status, _) = send(&app, method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_teachers_cannot_write_classes() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::Teacher, Some(SchoolId::new()));

    let (status, _) = send(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({
            "course_id": SchoolId::new(),
            "academic_year_id": SchoolId::new(),
            "name": "6º Ano B",
            "shift": "morning"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_cannot_delete_enrollments() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::Staff, Some(SchoolId::new()));

    let uri = format!("/api/enrollments/{}", SchoolId::new());
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_school_admin_cannot_manage_school_admins() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::SchoolAdmin, Some(SchoolId::new()));

    let (status, _) = send(
        &app,
        "POST",
        "/api/users/school-admins",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_required_field_is_bad_request() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::SystemAdmin, None);

    let (status, body) = send(
        &app,
        "POST",
        "/api/schools",
        Some(&token),
        Some(json!({ "code": "ABC" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn test_invalid_email_is_bad_request() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::SchoolAdmin, Some(SchoolId::new()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/students",
        Some(&token),
        Some(json!({
            "first_name": "Lucas",
            "last_name": "Pereira",
            "email": "lucas-at-example"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not a valid email"));
}

#[tokio::test]
async fn test_rule_violation_is_unprocessable() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::SystemAdmin, None);

    let (status, _) = send(
        &app,
        "POST",
        "/api/schools",
        Some(&token),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_system_admin_must_name_school_for_feedback() {
    let app = setup_test_app(unreachable_pool());
    let token = token_for(UserRole::SystemAdmin, None);

    let (status, body) = send(
        &app,
        "POST",
        "/api/feedback",
        Some(&token),
        Some(json!({ "subject": "Cantina", "message": "Mais opções de lanche" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "System admin must specify school_id");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app(unreachable_pool());

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/enrollments/{id}/transfer"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app(unreachable_pool());

    let (status, _) = send(&app, "GET", "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
