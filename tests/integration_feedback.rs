mod common;

use axum::http::StatusCode;
use common::{create_school, create_user, send, setup_test_app};
use escola_models::UserRole;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_member_submits_and_office_resolves(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Opinião").await;
    let student = create_user(&pool, "lara.melo", UserRole::Student, Some(school_id)).await;
    let secretary = create_user(&pool, "marcos.reis", UserRole::Staff, Some(school_id)).await;
    let app = setup_test_app(pool);

    let (status, created) = send(
        &app,
        "POST",
        "/api/feedback",
        Some(&student.token),
        Some(json!({
            "subject": "Biblioteca",
            "message": "Poderia abrir aos sábados?",
            "rating": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["status"], "open");
    assert_eq!(created["author_username"], "lara.melo");
    let uri = format!("/api/feedback/{}", created["id"].as_str().unwrap());

    let (status, mine) = send(&app, "GET", "/api/feedback/mine", Some(&student.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["meta"]["total"], 1);

    let (status, listed) = send(
        &app,
        "GET",
        "/api/feedback?status=open",
        Some(&secretary.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"][0]["id"], created["id"]);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("{uri}/status"),
        Some(&secretary.token),
        Some(json!({ "status": "resolved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "resolved");

    let (status, body) = send(&app, "GET", &uri, Some(&student.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");

    let (status, _) = send(&app, "DELETE", &uri, Some(&student.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some(&secretary.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_other_students_cannot_read_feedback(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Privacidade").await;
    let author = create_user(&pool, "nina.prado", UserRole::Student, Some(school_id)).await;
    let classmate = create_user(&pool, "otto.ramos", UserRole::Student, Some(school_id)).await;
    let app = setup_test_app(pool);

    let (_, created) = send(
        &app,
        "POST",
        "/api/feedback",
        Some(&author.token),
        Some(json!({ "subject": "Quadra", "message": "A rede está rasgada" })),
    )
    .await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/feedback/{}", created["id"].as_str().unwrap()),
        Some(&classmate.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_account_without_membership_cannot_submit(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Membros").await;
    let teacher = create_user(&pool, "paulo.teixeira", UserRole::Teacher, Some(school_id)).await;
    sqlx::query("DELETE FROM teachers WHERE person_id = $1")
        .bind(teacher.person_id)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/feedback",
        Some(&teacher.token),
        Some(json!({ "subject": "Sala", "message": "Ar-condicionado quebrado" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not a member of this school");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rating_out_of_range_is_rejected(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Notas").await;
    let guardian = create_user(&pool, "rita.souto", UserRole::Guardian, Some(school_id)).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/feedback",
        Some(&guardian.token),
        Some(json!({ "subject": "Reunião", "message": "Horário ruim", "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
