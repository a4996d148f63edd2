use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::enrollments::EnrollmentDetail;
use escola_models::ids::StudentId;
use escola_models::students::{
    CreateStudentDto, CreatedStudentResponse, PaginatedStudentsResponse, Student,
    StudentFilterParams, StudentGuardian, UpdateStudentDto,
};
use tracing::instrument;

use super::service::StudentService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireFaculty, RequireOffice};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

/// Register a student
///
/// Creates the person, the student record, and a login account. A
/// registration number is generated when none is given.
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student registered", body = CreatedStudentResponse),
        (status = 400, description = "Malformed body or missing school_id", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Email, document, or registration number in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn create_student(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<CreatedStudentResponse>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let created =
        StudentService::create_student(&state.db, &state.email_config, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Students", body = PaginatedStudentsResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let students = StudentService::list_students(&state.db, school_id, filters).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = StudentId, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<StudentId>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_student(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = StudentId, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Email, document, or registration number in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    let student =
        StudentService::update_student(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(student))
}

/// Delete a student with their person record and account
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = StudentId, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<StudentId>,
) -> Result<StatusCode, AppError> {
    StudentService::delete_student(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/enrollments",
    params(("id" = StudentId, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Enrollment history, newest first", body = Vec<EnrollmentDetail>),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student_enrollments(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<StudentId>,
) -> Result<Json<Vec<EnrollmentDetail>>, AppError> {
    let enrollments =
        StudentService::student_enrollments(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/guardians",
    params(("id" = StudentId, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Guardians of the student", body = Vec<StudentGuardian>),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student_guardians(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<StudentId>,
) -> Result<Json<Vec<StudentGuardian>>, AppError> {
    let guardians =
        StudentService::student_guardians(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(guardians))
}
