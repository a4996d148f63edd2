mod common;

use axum::{Router, http::StatusCode};
use common::{TestUser, create_school, create_user, send, setup_test_app};
use escola_models::UserRole;
use serde_json::{Value, json};
use sqlx::PgPool;

async fn register(app: &Router, admin: &TestUser, path: &str, body: Value) -> Value {
    let (status, created) = send(app, "POST", path, Some(&admin.token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created
}

async fn student_id_of(pool: &PgPool, user: &TestUser) -> uuid::Uuid {
    sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM students WHERE person_id = $1")
        .bind(user.person_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_lifecycle(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Docentes").await;
    let admin = create_user(&pool, "laura.mendes", UserRole::SchoolAdmin, Some(school_id)).await;
    let app = setup_test_app(pool);

    let created = register(
        &app,
        &admin,
        "/api/teachers",
        json!({
            "first_name": "Marta",
            "last_name": "Queiroz",
            "email": "marta.queiroz@escola.test",
            "specialization": "Matemática",
            "hire_date": "2024-02-01"
        }),
    )
    .await;
    assert_eq!(created["teacher"]["school_id"], school_id.to_string());
    assert_eq!(created["teacher"]["specialization"], "Matemática");
    assert_eq!(created["account"]["username"], "marta.queiroz");
    assert_eq!(created["account"]["role"], "teacher");
    let uri = format!("/api/teachers/{}", created["teacher"]["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin.token),
        Some(json!({ "specialization": "Física", "last_name": "Queiroz Lima" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["specialization"], "Física");
    assert_eq!(body["last_name"], "Queiroz Lima");
    assert_eq!(body["first_name"], "Marta");

    let (status, listed) = send(&app, "GET", "/api/teachers", Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["total"], 1);

    let (status, _) = send(&app, "DELETE", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "login": "marta.queiroz", "password": "anything-at-all" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_staff_lifecycle(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Secretaria").await;
    let admin = create_user(&pool, "nadia.orsi", UserRole::SchoolAdmin, Some(school_id)).await;
    let secretary = create_user(&pool, "olavo.pires", UserRole::Staff, Some(school_id)).await;
    let app = setup_test_app(pool);

    let created = register(
        &app,
        &admin,
        "/api/staff",
        json!({
            "first_name": "Paula",
            "last_name": "Rocha",
            "email": "paula.rocha@escola.test",
            "position": "Secretária"
        }),
    )
    .await;
    assert_eq!(created["staff"]["position"], "Secretária");
    assert_eq!(created["account"]["role"], "staff");
    let uri = format!("/api/staff/{}", created["staff"]["id"].as_str().unwrap());

    // Office staff can read the roster but not change it.
    let (status, listed) = send(&app, "GET", "/api/staff", Some(&secretary.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["total"], 3);

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&secretary.token),
        Some(json!({ "position": "Coordenadora" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin.token),
        Some(json!({ "position": "Coordenadora" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], "Coordenadora");

    let (status, _) = send(&app, "DELETE", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_namesakes_get_numbered_usernames(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Homônimos").await;
    let admin = create_user(&pool, "quiteria.reis", UserRole::SchoolAdmin, Some(school_id)).await;
    let app = setup_test_app(pool);

    let first = register(
        &app,
        &admin,
        "/api/students",
        json!({ "first_name": "Ana", "last_name": "Souza", "email": "ana.souza@familia.com" }),
    )
    .await;
    let second = register(
        &app,
        &admin,
        "/api/students",
        json!({ "first_name": "Ana Clara", "last_name": "de Souza", "email": "anaclara@familia.com" }),
    )
    .await;

    assert_eq!(first["account"]["username"], "ana.souza");
    assert_eq!(second["account"]["username"], "ana.souza2");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_guardian_links(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Famílias").await;
    let other = create_school(&pool, "Escola Distante").await;
    let admin = create_user(&pool, "sergio.tavares", UserRole::SchoolAdmin, Some(school_id)).await;
    let student = create_user(&pool, "tiago.umbelino", UserRole::Student, Some(school_id)).await;
    let outsider = create_user(&pool, "ursula.vaz", UserRole::Student, Some(other)).await;
    let app = setup_test_app(pool.clone());

    let student_id = student_id_of(&pool, &student).await;
    let outsider_id = student_id_of(&pool, &outsider).await;

    let mother = register(
        &app,
        &admin,
        "/api/guardians",
        json!({ "first_name": "Vera", "last_name": "Umbelino", "email": "vera@familia.com" }),
    )
    .await;
    let father = register(
        &app,
        &admin,
        "/api/guardians",
        json!({ "first_name": "Wagner", "last_name": "Umbelino", "email": "wagner@familia.com" }),
    )
    .await;
    assert_eq!(mother["account"]["role"], "guardian");
    let mother_uri = format!("/api/guardians/{}/students", mother["guardian"]["id"].as_str().unwrap());
    let father_uri = format!("/api/guardians/{}/students", father["guardian"]["id"].as_str().unwrap());

    let (status, link) = send(
        &app,
        "POST",
        &mother_uri,
        Some(&admin.token),
        Some(json!({ "student_id": student_id, "relationship": "mother", "is_primary": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{link}");
    assert_eq!(link["is_primary"], true);
    assert_eq!(link["relationship"], "mother");

    let (status, body) = send(
        &app,
        "POST",
        &mother_uri,
        Some(&admin.token),
        Some(json!({ "student_id": student_id, "relationship": "mother" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Student is already linked to this guardian");

    let (status, _) = send(
        &app,
        "POST",
        &father_uri,
        Some(&admin.token),
        Some(json!({ "student_id": student_id, "relationship": "father", "is_primary": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The newer primary guardian demotes the earlier one.
    let (status, linked) = send(&app, "GET", &mother_uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(linked.as_array().unwrap().len(), 1);
    assert_eq!(linked[0]["is_primary"], false);

    let (status, body) = send(
        &app,
        "POST",
        &mother_uri,
        Some(&admin.token),
        Some(json!({ "student_id": outsider_id, "relationship": "aunt" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{mother_uri}/{student_id}"),
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, linked) = send(&app, "GET", &mother_uri, Some(&admin.token), None).await;
    assert!(linked.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_school_is_not_found(pool: PgPool) {
    let root = create_user(&pool, "root", UserRole::SystemAdmin, None).await;
    let app = setup_test_app(pool);
    let missing = uuid::Uuid::new_v4();

    let requests = [
        (
            "/api/students",
            json!({ "first_name": "Xavier", "last_name": "Yamada", "email": "xavier@familia.com", "school_id": missing }),
        ),
        (
            "/api/teachers",
            json!({ "first_name": "Yara", "last_name": "Zanetti", "email": "yara@escola.test", "school_id": missing }),
        ),
        (
            "/api/staff",
            json!({ "first_name": "Zeca", "last_name": "Alves", "email": "zeca@escola.test", "position": "Porteiro", "school_id": missing }),
        ),
        (
            "/api/guardians",
            json!({ "first_name": "Alice", "last_name": "Brito", "email": "alice@familia.com", "school_id": missing }),
        ),
        ("/api/courses", json!({ "name": "Ensino Médio", "school_id": missing })),
        (
            "/api/academic-years",
            json!({ "year": 2025, "start_date": "2025-02-03", "end_date": "2025-12-12", "school_id": missing }),
        ),
    ];

    for (path, body) in requests {
        let (status, body) = send(&app, "POST", path, Some(&root.token), Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}: {body}");
        assert_eq!(body["error"], "School not found", "{path}");
    }
}
