use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use escola_core::{PaginationMeta, PaginationParams};
use escola_models::UserRole;
use escola_models::academic_years::{AcademicYear, CreateAcademicYearDto, UpdateAcademicYearDto};
use escola_models::auth::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    RefreshTokenRequest,
};
use escola_models::classes::{Class, CreateClassDto, RosterEntry, Shift, UpdateClassDto};
use escola_models::courses::{Course, CreateCourseDto, UpdateCourseDto};
use escola_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentDetail, EnrollmentStatus, TransferEnrollmentDto,
    TransferResponse, UpdateEnrollmentStatusDto,
};
use escola_models::feedback::{
    CreateFeedbackDto, Feedback, FeedbackStatus, UpdateFeedbackStatusDto,
};
use escola_models::guardians::{
    CreateGuardianDto, CreatedGuardianResponse, Guardian, GuardianStudent, LinkStudentDto,
    UpdateGuardianDto,
};
use escola_models::people::AccountCredentials;
use escola_models::schools::{CreateSchoolDto, School, SchoolDetail, UpdateSchoolDto};
use escola_models::staff::{CreateStaffDto, CreatedStaffResponse, StaffMember, UpdateStaffDto};
use escola_models::students::{
    CreateStudentDto, CreatedStudentResponse, Student, StudentGuardian, UpdateStudentDto,
};
use escola_models::teachers::{
    CreateTeacherDto, CreatedTeacherResponse, Teacher, UpdateTeacherDto,
};
use escola_models::users::{
    AccountProfile, CreateSchoolAdminDto, CreatedSchoolAdminResponse, PasswordResetResponse,
    UpdateUserStatusDto,
};

use crate::modules::health::controller::HealthResponse;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Student not found")]
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health_check,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::change_password,
        crate::modules::auth::controller::forgot_password,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user_status,
        crate::modules::users::controller::reset_user_password,
        crate::modules::users::controller::create_school_admin,
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::list_schools,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::update_school,
        crate::modules::schools::controller::delete_school,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::list_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::students::controller::get_student_enrollments,
        crate::modules::students::controller::get_student_guardians,
        crate::modules::teachers::controller::create_teacher,
        crate::modules::teachers::controller::list_teachers,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::teachers::controller::delete_teacher,
        crate::modules::teachers::controller::get_teacher_classes,
        crate::modules::staff::controller::create_staff,
        crate::modules::staff::controller::list_staff,
        crate::modules::staff::controller::get_staff,
        crate::modules::staff::controller::update_staff,
        crate::modules::staff::controller::delete_staff,
        crate::modules::guardians::controller::create_guardian,
        crate::modules::guardians::controller::list_guardians,
        crate::modules::guardians::controller::get_guardian,
        crate::modules::guardians::controller::update_guardian,
        crate::modules::guardians::controller::delete_guardian,
        crate::modules::guardians::controller::link_student,
        crate::modules::guardians::controller::get_guardian_students,
        crate::modules::guardians::controller::unlink_student,
        crate::modules::academic_years::controller::create_academic_year,
        crate::modules::academic_years::controller::list_academic_years,
        crate::modules::academic_years::controller::get_academic_year,
        crate::modules::academic_years::controller::update_academic_year,
        crate::modules::academic_years::controller::delete_academic_year,
        crate::modules::academic_years::controller::activate_academic_year,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::list_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::class_roster,
        crate::modules::enrollments::controller::create_enrollment,
        crate::modules::enrollments::controller::list_enrollments,
        crate::modules::enrollments::controller::get_enrollment,
        crate::modules::enrollments::controller::update_enrollment_status,
        crate::modules::enrollments::controller::transfer_enrollment,
        crate::modules::enrollments::controller::delete_enrollment,
        crate::modules::feedback::controller::create_feedback,
        crate::modules::feedback::controller::list_feedback,
        crate::modules::feedback::controller::my_feedback,
        crate::modules::feedback::controller::get_feedback,
        crate::modules::feedback::controller::update_feedback_status,
        crate::modules::feedback::controller::delete_feedback,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            PaginationMeta,
            PaginationParams,
            UserRole,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            MessageResponse,
            AccountProfile,
            AccountCredentials,
            UpdateUserStatusDto,
            PasswordResetResponse,
            CreateSchoolAdminDto,
            CreatedSchoolAdminResponse,
            School,
            SchoolDetail,
            CreateSchoolDto,
            UpdateSchoolDto,
            Student,
            CreateStudentDto,
            UpdateStudentDto,
            CreatedStudentResponse,
            StudentGuardian,
            Teacher,
            CreateTeacherDto,
            UpdateTeacherDto,
            CreatedTeacherResponse,
            StaffMember,
            CreateStaffDto,
            UpdateStaffDto,
            CreatedStaffResponse,
            Guardian,
            CreateGuardianDto,
            UpdateGuardianDto,
            CreatedGuardianResponse,
            LinkStudentDto,
            GuardianStudent,
            AcademicYear,
            CreateAcademicYearDto,
            UpdateAcademicYearDto,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            Shift,
            Class,
            CreateClassDto,
            UpdateClassDto,
            RosterEntry,
            EnrollmentStatus,
            Enrollment,
            EnrollmentDetail,
            CreateEnrollmentDto,
            UpdateEnrollmentStatusDto,
            TransferEnrollmentDto,
            TransferResponse,
            FeedbackStatus,
            Feedback,
            CreateFeedbackDto,
            UpdateFeedbackStatusDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Authentication", description = "Login, tokens and passwords"),
        (name = "Users", description = "Account administration"),
        (name = "Schools", description = "School (tenant) management"),
        (name = "Students", description = "Student records"),
        (name = "Teachers", description = "Teacher records"),
        (name = "Staff", description = "Administrative staff"),
        (name = "Guardians", description = "Guardians and their students"),
        (name = "Academic Years", description = "School calendar years"),
        (name = "Courses", description = "Courses offered by a school"),
        (name = "Classes", description = "Classes within a course and academic year"),
        (name = "Enrollments", description = "Student enrollments in classes"),
        (name = "Feedback", description = "Feedback from school members")
    ),
    info(
        title = "Escola API",
        version = "0.1.0",
        description = "Multi-tenant school management API built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/users/school-admins",
            "/api/schools/{id}",
            "/api/guardians/{id}/students/{student_id}",
            "/api/academic-years/{id}/activate",
            "/api/classes/{id}/students",
            "/api/enrollments/{id}/transfer",
            "/api/feedback/mine",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
