mod common;

use axum::http::StatusCode;
use common::{
    TEST_PASSWORD, create_school, create_user, failing_smtp_config, send, setup_app_with_email,
    setup_test_app,
};
use escola_models::UserRole;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_login_with_username_or_email(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Municipal Centro").await;
    create_user(&pool, "ana.souza", UserRole::Teacher, Some(school_id)).await;
    let app = setup_test_app(pool);

    for login in ["ana.souza", "ANA.SOUZA", "ana.souza@escola.test"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "login": login, "password": TEST_PASSWORD })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{login}");
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["username"], "ana.souza");
        assert_eq!(body["user"]["role"], "teacher");
        assert!(body["access_token"].as_str().is_some());
        assert!(body["refresh_token"].as_str().is_some());
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_rejects_wrong_password_and_unknown_user(pool: PgPool) {
    create_user(&pool, "root", UserRole::SystemAdmin, None).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": "root", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": "nobody", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deactivated_account_cannot_login(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Estadual Norte").await;
    let user = create_user(&pool, "bruno.lima", UserRole::Staff, Some(school_id)).await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": "bruno.lima", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_issues_new_tokens(pool: PgPool) {
    create_user(&pool, "root", UserRole::SystemAdmin, None).await;
    let app = setup_test_app(pool);

    let (_, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": "root", "password": TEST_PASSWORD })),
    )
    .await;
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "system_admin");

    // An access token is not accepted as a refresh token.
    let access_token = login["access_token"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": access_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_returns_profile(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Sul").await;
    let user = create_user(&pool, "carla.dias", UserRole::SchoolAdmin, Some(school_id)).await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&user.token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "carla.dias");
    assert_eq!(body["email"], "carla.dias@escola.test");
    assert_eq!(body["school_id"], school_id.to_string());
    assert_eq!(body["must_change_password"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_flow(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Leste").await;
    let user = create_user(&pool, "davi.rocha", UserRole::Teacher, Some(school_id)).await;
    sqlx::query("UPDATE users SET must_change_password = TRUE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool.clone());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some(&user.token),
        Some(json!({ "current_password": "not-it", "new_password": "Brand-New-Pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some(&user.token),
        Some(json!({ "current_password": TEST_PASSWORD, "new_password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some(&user.token),
        Some(json!({ "current_password": TEST_PASSWORD, "new_password": "Brand-New-Pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let must_change =
        sqlx::query_scalar::<_, bool>("SELECT must_change_password FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(!must_change);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": "davi.rocha", "password": "Brand-New-Pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_forgot_password_is_silent(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "unknown@escola.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_reset_mail_keeps_current_password(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Correio").await;
    let teacher = create_user(&pool, "sara.lima", UserRole::Teacher, Some(school_id)).await;
    let app = setup_app_with_email(pool.clone(), failing_smtp_config());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "sara.lima@escola.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": teacher.username, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{login}");
    assert_eq!(login["user"]["must_change_password"], false);

    let pending = sqlx::query_scalar::<_, bool>(
        "SELECT must_change_password FROM users WHERE id = $1",
    )
    .bind(teacher.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!pending);
}
