//! Fake data for development databases.
//!
//! Names are generated in parallel with `rayon` + `fake`; each school is then
//! written in its own transaction. Seeded rows are recognisable by the
//! [`SEED_EMAIL_DOMAIN`] email domain and the [`SEED_SCHOOL_CODE_PREFIX`]
//! school code, which is what [`clear_all`] deletes by.

pub mod models;
pub mod people;
pub mod schools;

pub use models::{
    MembersPerSchool, SEED_EMAIL_DOMAIN, SEED_PASSWORD, SEED_SCHOOL_CODE_PREFIX, SeedConfig,
    SeedSummary,
};

use escola_core::hash_password;
use escola_models::UserRole;
use sqlx::PgPool;
use std::time::Instant;

use models::SchoolPlan;

pub async fn seed_all(
    db: &PgPool,
    config: &SeedConfig,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Generating data for {} schools...", config.num_schools);

    let plans = schools::generate_school_plans(config);
    // One hash for every seeded account; bcrypt is slow on purpose.
    let password_hash =
        hash_password(SEED_PASSWORD).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut summary = SeedSummary::default();
    for plan in &plans {
        let written = seed_school(db, plan, &password_hash).await?;
        summary.schools += written.schools;
        summary.classes += written.classes;
        summary.accounts += written.accounts;
        summary.enrollments += written.enrollments;
        println!("   ✓ {}", plan.school.name);
    }

    println!(
        "✅ Seeded {} schools, {} classes, {} accounts, {} enrollments in {:?}",
        summary.schools,
        summary.classes,
        summary.accounts,
        summary.enrollments,
        start_time.elapsed()
    );
    println!("   Every seeded account uses the password '{SEED_PASSWORD}'");

    Ok(summary)
}

async fn seed_school(
    db: &PgPool,
    plan: &SchoolPlan,
    password_hash: &str,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;

    let school_id = schools::insert_school(&mut tx, &plan.school).await?;
    let year_id = schools::insert_current_year(&mut tx, school_id, plan.year).await?;
    let classes = schools::insert_courses_and_classes(&mut tx, school_id, year_id, plan).await?;

    let mut accounts = 0;
    let mut guardian_ids = Vec::new();
    for (role, group) in [
        (UserRole::SchoolAdmin, &plan.admins),
        (UserRole::Staff, &plan.staff),
        (UserRole::Teacher, &plan.teachers),
        (UserRole::Guardian, &plan.guardians),
    ] {
        let person_ids =
            people::insert_people_with_accounts(&mut tx, school_id, group, password_hash).await?;
        people::insert_members(&mut tx, school_id, role, &person_ids).await?;
        accounts += person_ids.len();
        if role == UserRole::Guardian {
            guardian_ids = person_ids;
        }
    }

    let student_person_ids =
        people::insert_people_with_accounts(&mut tx, school_id, &plan.students, password_hash)
            .await?;
    accounts += student_person_ids.len();
    let student_ids =
        people::insert_students(&mut tx, school_id, plan.year, &student_person_ids).await?;

    people::link_guardians(&mut tx, &guardian_ids, &student_ids).await?;

    let assignments = people::assign_classes(&student_ids, &classes);
    let enrollments =
        people::insert_enrollments(&mut tx, school_id, year_id, &assignments).await?;

    tx.commit().await?;

    Ok(SeedSummary {
        schools: 1,
        classes: classes.len(),
        accounts,
        enrollments,
    })
}

/// Deletes seeded people and schools. Everything else hangs off them and
/// goes with them; system administrators are never seeded and stay.
pub async fn clear_all(db: &PgPool) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;

    let people = sqlx::query("DELETE FROM people WHERE email LIKE '%@' || $1")
        .bind(SEED_EMAIL_DOMAIN)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let schools = sqlx::query("DELETE FROM schools WHERE code LIKE $1 || '%'")
        .bind(SEED_SCHOOL_CODE_PREFIX)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    println!(
        "   ✓ Deleted {people} people and {schools} schools in {:?}",
        start_time.elapsed()
    );
    Ok((people, schools))
}
