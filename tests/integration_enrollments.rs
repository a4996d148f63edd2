mod common;

use axum::{Router, http::StatusCode};
use common::{TestUser, create_school, create_user, send, setup_test_app};
use escola_models::UserRole;
use escola_models::ids::SchoolId;
use serde_json::{Value, json};
use sqlx::PgPool;

struct Fixture {
    app: Router,
    admin: TestUser,
    year_id: String,
    course_id: String,
}

async fn fixture(pool: &PgPool, school_id: SchoolId) -> Fixture {
    let admin = create_user(pool, "diretora", UserRole::SchoolAdmin, Some(school_id)).await;
    let app = setup_test_app(pool.clone());

    let (status, year) = send(
        &app,
        "POST",
        "/api/academic-years",
        Some(&admin.token),
        Some(json!({
            "year": 2025,
            "start_date": "2025-02-03",
            "end_date": "2025-12-12",
            "is_current": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{year}");

    let (status, course) = send(
        &app,
        "POST",
        "/api/courses",
        Some(&admin.token),
        Some(json!({ "name": "Ensino Fundamental II", "workload_hours": 800 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{course}");

    Fixture {
        app,
        admin,
        year_id: year["id"].as_str().unwrap().to_string(),
        course_id: course["id"].as_str().unwrap().to_string(),
    }
}

async fn create_class(fx: &Fixture, name: &str, capacity: i32) -> Value {
    let (status, class) = send(
        &fx.app,
        "POST",
        "/api/classes",
        Some(&fx.admin.token),
        Some(json!({
            "course_id": fx.course_id,
            "academic_year_id": fx.year_id,
            "name": name,
            "shift": "morning",
            "capacity": capacity
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{class}");
    class
}

async fn student_id_of(pool: &PgPool, user: &TestUser) -> String {
    sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM students WHERE person_id = $1")
        .bind(user.person_id)
        .fetch_one(pool)
        .await
        .unwrap()
        .to_string()
}

async fn enroll(fx: &Fixture, student_id: &str, class: &Value) -> (StatusCode, Value) {
    send(
        &fx.app,
        "POST",
        "/api/enrollments",
        Some(&fx.admin.token),
        Some(json!({ "student_id": student_id, "class_id": class["id"] })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_respects_capacity(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Capacidade").await;
    let fx = fixture(&pool, school_id).await;
    let class = create_class(&fx, "6º Ano A", 1).await;

    let first = create_user(&pool, "aluno.um", UserRole::Student, Some(school_id)).await;
    let second = create_user(&pool, "aluno.dois", UserRole::Student, Some(school_id)).await;
    let first_id = student_id_of(&pool, &first).await;
    let second_id = student_id_of(&pool, &second).await;

    let (status, body) = enroll(&fx, &first_id, &class).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "active");
    assert_eq!(body["shift"], "morning");
    assert_eq!(body["class_name"], "6º Ano A");
    assert_eq!(body["academic_year"], 2025);

    let (status, body) = enroll(&fx, &second_id, &class).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Class is full");

    let (_, class) = send(
        &fx.app,
        "GET",
        &format!("/api/classes/{}", class["id"].as_str().unwrap()),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(class["enrolled_count"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_one_active_enrollment_per_year(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Única").await;
    let fx = fixture(&pool, school_id).await;
    let class_a = create_class(&fx, "7º Ano A", 30).await;
    let class_b = create_class(&fx, "7º Ano B", 30).await;
    let student = create_user(&pool, "aluna.tres", UserRole::Student, Some(school_id)).await;
    let student_id = student_id_of(&pool, &student).await;

    let (status, _) = enroll(&fx, &student_id, &class_a).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = enroll(&fx, &student_id, &class_b).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_from_other_school_cannot_enroll(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Local").await;
    let other = create_school(&pool, "Escola Distante").await;
    let fx = fixture(&pool, school_id).await;
    let class = create_class(&fx, "8º Ano A", 30).await;
    let outsider = create_user(&pool, "aluno.fora", UserRole::Student, Some(other)).await;
    let outsider_id = student_id_of(&pool, &outsider).await;

    let (status, body) = enroll(&fx, &outsider_id, &class).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_transfer_moves_student_between_classes(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Transferência").await;
    let fx = fixture(&pool, school_id).await;
    let class_a = create_class(&fx, "9º Ano A", 30).await;
    let class_b = create_class(&fx, "9º Ano B", 30).await;
    let student = create_user(&pool, "aluno.quatro", UserRole::Student, Some(school_id)).await;
    let student_id = student_id_of(&pool, &student).await;

    let (_, enrollment) = enroll(&fx, &student_id, &class_a).await;
    let enrollment_id = enrollment["id"].as_str().unwrap();

    let (status, body) = send(
        &fx.app,
        "POST",
        &format!("/api/enrollments/{enrollment_id}/transfer"),
        Some(&fx.admin.token),
        Some(json!({ "class_id": class_a["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Enrollment is already in this class");

    let (status, body) = send(
        &fx.app,
        "POST",
        &format!("/api/enrollments/{enrollment_id}/transfer"),
        Some(&fx.admin.token),
        Some(json!({ "class_id": class_b["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["previous"]["status"], "transferred");
    assert!(body["previous"]["ended_at"].is_string());
    assert_eq!(body["current"]["status"], "active");
    assert_eq!(body["current"]["class_id"], class_b["id"]);

    // The closed enrollment cannot be transferred again.
    let (status, _) = send(
        &fx.app,
        "POST",
        &format!("/api/enrollments/{enrollment_id}/transfer"),
        Some(&fx.admin.token),
        Some(json!({ "class_id": class_a["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, history) = send(
        &fx.app,
        "GET",
        &format!("/api/students/{student_id}/enrollments"),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);

    let (_, roster) = send(
        &fx.app,
        "GET",
        &format!("/api/classes/{}/students", class_b["id"].as_str().unwrap()),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(roster.as_array().unwrap().len(), 1);
    assert_eq!(roster[0]["student_id"], student_id.as_str());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_changes_only_from_active(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Status").await;
    let fx = fixture(&pool, school_id).await;
    let class = create_class(&fx, "1º Ano A", 30).await;
    let student = create_user(&pool, "aluna.cinco", UserRole::Student, Some(school_id)).await;
    let student_id = student_id_of(&pool, &student).await;

    let (_, enrollment) = enroll(&fx, &student_id, &class).await;
    let uri = format!("/api/enrollments/{}/status", enrollment["id"].as_str().unwrap());

    let (status, body) = send(
        &fx.app,
        "PATCH",
        &uri,
        Some(&fx.admin.token),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(body["ended_at"].is_string());

    let (status, _) = send(
        &fx.app,
        "PATCH",
        &uri,
        Some(&fx.admin.token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // A cancelled enrollment frees the seat for a new one in the same year.
    let (status, _) = enroll(&fx, &student_id, &class).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_class_with_active_students_cannot_be_deleted(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Exclusão").await;
    let fx = fixture(&pool, school_id).await;
    let class = create_class(&fx, "2º Ano A", 30).await;
    let student = create_user(&pool, "aluno.seis", UserRole::Student, Some(school_id)).await;
    let student_id = student_id_of(&pool, &student).await;
    let (_, enrollment) = enroll(&fx, &student_id, &class).await;
    let class_uri = format!("/api/classes/{}", class["id"].as_str().unwrap());

    let (status, _) = send(&fx.app, "DELETE", &class_uri, Some(&fx.admin.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &fx.app,
        "PUT",
        &class_uri,
        Some(&fx.admin.token),
        Some(json!({ "capacity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    send(
        &fx.app,
        "PATCH",
        &format!("/api/enrollments/{}/status", enrollment["id"].as_str().unwrap()),
        Some(&fx.admin.token),
        Some(json!({ "status": "completed" })),
    )
    .await;

    let (status, _) = send(&fx.app, "DELETE", &class_uri, Some(&fx.admin.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_in_use_cannot_be_deleted(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Cursos").await;
    let fx = fixture(&pool, school_id).await;
    create_class(&fx, "3º Ano A", 30).await;

    let (status, _) = send(
        &fx.app,
        "DELETE",
        &format!("/api/courses/{}", fx.course_id),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &fx.app,
        "DELETE",
        &format!("/api/academic-years/{}", fx.year_id),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_activating_year_clears_previous_current(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Anos").await;
    let fx = fixture(&pool, school_id).await;

    let (status, next) = send(
        &fx.app,
        "POST",
        "/api/academic-years",
        Some(&fx.admin.token),
        Some(json!({ "year": 2026, "start_date": "2026-02-02", "end_date": "2026-12-11" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(next["is_current"], false);

    let (status, body) = send(
        &fx.app,
        "POST",
        &format!("/api/academic-years/{}/activate", next["id"].as_str().unwrap()),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_current"], true);

    let (_, previous) = send(
        &fx.app,
        "GET",
        &format!("/api/academic-years/{}", fx.year_id),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(previous["is_current"], false);

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/academic-years",
        Some(&fx.admin.token),
        Some(json!({ "year": 2026, "start_date": "2026-02-02", "end_date": "2026-12-11" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_enrollments_take_one_seat(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Concorrida").await;
    let fx = fixture(&pool, school_id).await;
    let class = create_class(&fx, "6º Ano B", 1).await;

    let first = create_user(&pool, "aluno.sete", UserRole::Student, Some(school_id)).await;
    let second = create_user(&pool, "aluna.oito", UserRole::Student, Some(school_id)).await;
    let first_id = student_id_of(&pool, &first).await;
    let second_id = student_id_of(&pool, &second).await;

    let ((first_status, _), (second_status, _)) = tokio::join!(
        enroll(&fx, &first_id, &class),
        enroll(&fx, &second_id, &class),
    );

    let mut statuses = [first_status, second_status];
    statuses.sort_by_key(|status| status.as_u16());
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let active = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE class_id = $1 AND status = 'active'",
    )
    .bind(uuid::Uuid::parse_str(class["id"].as_str().unwrap()).unwrap())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_transfer_into_full_class_conflicts(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Lotada").await;
    let fx = fixture(&pool, school_id).await;
    let open = create_class(&fx, "5º Ano A", 30).await;
    let full = create_class(&fx, "5º Ano B", 1).await;

    let mover = create_user(&pool, "aluno.nove", UserRole::Student, Some(school_id)).await;
    let seated = create_user(&pool, "aluna.dez", UserRole::Student, Some(school_id)).await;
    let mover_id = student_id_of(&pool, &mover).await;
    let seated_id = student_id_of(&pool, &seated).await;

    let (status, _) = enroll(&fx, &seated_id, &full).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, enrollment) = enroll(&fx, &mover_id, &open).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &fx.app,
        "POST",
        &format!("/api/enrollments/{}/transfer", enrollment["id"].as_str().unwrap()),
        Some(&fx.admin.token),
        Some(json!({ "class_id": full["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Target class is full");

    // The source enrollment is untouched.
    let (_, source) = send(
        &fx.app,
        "GET",
        &format!("/api/enrollments/{}", enrollment["id"].as_str().unwrap()),
        Some(&fx.admin.token),
        None,
    )
    .await;
    assert_eq!(source["status"], "active");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_academic_year_and_course_rules(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Calendário").await;
    let fx = fixture(&pool, school_id).await;

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/academic-years",
        Some(&fx.admin.token),
        Some(json!({ "year": 2027, "start_date": "2027-12-10", "end_date": "2027-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &fx.app,
        "POST",
        "/api/academic-years",
        Some(&fx.admin.token),
        Some(json!({ "year": 2027, "start_date": "2027-02-01", "end_date": "2027-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/academic-years",
        Some(&fx.admin.token),
        Some(json!({ "year": 2025, "start_date": "2025-03-01", "end_date": "2025-11-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This academic year already exists for the school");

    let (status, body) = send(
        &fx.app,
        "POST",
        "/api/courses",
        Some(&fx.admin.token),
        Some(json!({ "name": "Ensino Fundamental II" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A course with this name already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_activation_racing_another_current_year_conflicts(pool: PgPool) {
    let school_id = create_school(&pool, "Escola Corrida").await;
    let fx = fixture(&pool, school_id).await;

    let (_, next) = send(
        &fx.app,
        "POST",
        "/api/academic-years",
        Some(&fx.admin.token),
        Some(json!({ "year": 2026, "start_date": "2026-02-02", "end_date": "2026-12-11" })),
    )
    .await;

    // Another writer swaps the current year and holds its transaction open.
    let mut writer = pool.begin().await.unwrap();
    sqlx::query("UPDATE academic_years SET is_current = false WHERE school_id = $1")
        .bind(school_id)
        .execute(&mut *writer)
        .await
        .unwrap();
    sqlx::query(
        r#"INSERT INTO academic_years (school_id, year, start_date, end_date, is_current)
           VALUES ($1, 2027, '2027-02-01', '2027-12-10', true)"#,
    )
    .bind(school_id)
    .execute(&mut *writer)
    .await
    .unwrap();

    let app = fx.app.clone();
    let token = fx.admin.token.clone();
    let uri = format!("/api/academic-years/{}/activate", next["id"].as_str().unwrap());
    let activation =
        tokio::spawn(async move { send(&app, "POST", &uri, Some(&token), None).await });

    // Wait until the activation blocks on the writer's row lock.
    for _ in 0..100 {
        let waiting = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM pg_stat_activity
                   WHERE datname = current_database() AND wait_event_type = 'Lock'
               )"#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        if waiting {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    writer.commit().await.unwrap();

    let (status, body) = activation.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"], "Another academic year is already current");
}
