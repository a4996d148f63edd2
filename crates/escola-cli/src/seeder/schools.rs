//! School plan generation and the school-level rows: the school, its
//! current academic year, courses and classes.

use chrono::{Datelike, NaiveDate, Utc};
use escola_models::UserRole;
use escola_models::classes::Shift;
use escola_models::ids::{AcademicYearId, ClassId, CourseId, SchoolId};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName};
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::{
    ClassSeed, PersonSeed, SEED_EMAIL_DOMAIN, SEED_SCHOOL_CODE_PREFIX, SchoolPlan, SchoolSeed,
    SeedConfig,
};

pub const COURSES: [&str; 3] = ["Ensino Fundamental I", "Ensino Fundamental II", "Ensino Médio"];

const SHIFTS: [Shift; 3] = [Shift::Morning, Shift::Afternoon, Shift::Evening];

/// Generates one plan per school in parallel.
pub fn generate_school_plans(config: &SeedConfig) -> Vec<SchoolPlan> {
    let year = Utc::now().year();
    // Codes make every run's rows distinct even when names repeat.
    let run = Uuid::new_v4().simple().to_string();
    let run = &run[..6];

    (0..config.num_schools)
        .into_par_iter()
        .map(|school_idx| {
            let tag = format!("{run}{school_idx:04}");
            let people = |role: UserRole, count: usize| -> Vec<PersonSeed> {
                (0..count)
                    .map(|idx| generate_person(role, &tag, idx))
                    .collect()
            };

            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();
            let state: String = StateAbbr().fake();

            let classes = (0..COURSES.len())
                .flat_map(|course_idx| {
                    (0..config.classes_per_course).map(move |n| ClassSeed {
                        course_idx,
                        name: format!("Turma {}", (b'A' + (n % 26) as u8) as char),
                        shift: SHIFTS[n % SHIFTS.len()],
                        capacity: 30,
                    })
                })
                .collect();

            let students = people(UserRole::Student, config.members.students);
            let guardians = people(UserRole::Guardian, config.members.students.div_ceil(2));

            SchoolPlan {
                school: SchoolSeed {
                    name: format!("Escola {city} {tag}"),
                    code: format!("{SEED_SCHOOL_CODE_PREFIX}{tag}"),
                    address: format!("{building} {street}, {city} - {state}"),
                    phone: PhoneNumber().fake(),
                },
                year,
                courses: COURSES.iter().map(|c| (*c).to_string()).collect(),
                classes,
                admins: people(UserRole::SchoolAdmin, 1),
                staff: people(UserRole::Staff, config.members.staff),
                teachers: people(UserRole::Teacher, config.members.teachers),
                students,
                guardians,
            }
        })
        .collect()
}

fn generate_person(role: UserRole, tag: &str, idx: usize) -> PersonSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let handle = format!("{}.{tag}.{idx}", role.as_str());

    PersonSeed {
        email: format!("{handle}@{SEED_EMAIL_DOMAIN}"),
        username: handle,
        first_name,
        last_name,
        role,
    }
}

pub async fn insert_school(
    tx: &mut Transaction<'_, Postgres>,
    school: &SchoolSeed,
) -> Result<SchoolId, sqlx::Error> {
    sqlx::query_scalar::<_, SchoolId>(
        "INSERT INTO schools (name, code, address, phone) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&school.name)
    .bind(&school.code)
    .bind(&school.address)
    .bind(&school.phone)
    .fetch_one(&mut **tx)
    .await
}

/// February to December of `year`, marked current.
pub async fn insert_current_year(
    tx: &mut Transaction<'_, Postgres>,
    school_id: SchoolId,
    year: i32,
) -> Result<AcademicYearId, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(year, 2, 1).ok_or("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(year, 12, 15).ok_or("invalid end date")?;

    let id = sqlx::query_scalar::<_, AcademicYearId>(
        "INSERT INTO academic_years (school_id, year, start_date, end_date, is_current)
         VALUES ($1, $2, $3, $4, TRUE) RETURNING id",
    )
    .bind(school_id)
    .bind(year)
    .bind(start)
    .bind(end)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

/// Inserts the courses and their classes; returns the class ids with their
/// capacities, in plan order.
pub async fn insert_courses_and_classes(
    tx: &mut Transaction<'_, Postgres>,
    school_id: SchoolId,
    year_id: AcademicYearId,
    plan: &SchoolPlan,
) -> Result<Vec<(ClassId, i32)>, sqlx::Error> {
    let mut course_ids = Vec::with_capacity(plan.courses.len());
    for name in &plan.courses {
        let id = sqlx::query_scalar::<_, CourseId>(
            "INSERT INTO courses (school_id, name, workload_hours) VALUES ($1, $2, 800) RETURNING id",
        )
        .bind(school_id)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        course_ids.push(id);
    }

    let mut class_ids = Vec::with_capacity(plan.classes.len());
    for class in &plan.classes {
        let id = sqlx::query_scalar::<_, ClassId>(
            "INSERT INTO classes (school_id, course_id, academic_year_id, name, shift, capacity)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(school_id)
        .bind(course_ids[class.course_idx])
        .bind(year_id)
        .bind(&class.name)
        .bind(class.shift)
        .bind(class.capacity)
        .fetch_one(&mut **tx)
        .await?;
        class_ids.push((id, class.capacity));
    }

    Ok(class_ids)
}
