//! Person-backed rows: people, accounts, the per-role member tables,
//! guardian links and enrollments.

use escola_models::UserRole;
use escola_models::ids::{AcademicYearId, ClassId, PersonId, SchoolId, StudentId};
use escola_models::staff::SCHOOL_ADMIN_POSITION;
use sqlx::{Postgres, QueryBuilder, Transaction};

use super::models::PersonSeed;

// 65535 bind parameters per statement; users take five each.
const BATCH_SIZE: usize = 1000;

/// Inserts the people and their accounts; returns person ids in input order.
pub async fn insert_people_with_accounts(
    tx: &mut Transaction<'_, Postgres>,
    school_id: SchoolId,
    people: &[PersonSeed],
    password_hash: &str,
) -> Result<Vec<PersonId>, sqlx::Error> {
    let mut person_ids = Vec::with_capacity(people.len());

    for chunk in people.chunks(BATCH_SIZE) {
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO people (first_name, last_name, email) ");
        builder.push_values(chunk, |mut row, person| {
            row.push_bind(&person.first_name)
                .push_bind(&person.last_name)
                .push_bind(&person.email);
        });
        builder.push(" RETURNING id");
        let ids: Vec<PersonId> = builder
            .build_query_scalar()
            .fetch_all(&mut **tx)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO users (person_id, username, password_hash, role, school_id, must_change_password) ",
        );
        builder.push_values(ids.iter().zip(chunk), |mut row, (person_id, person)| {
            row.push_bind(*person_id)
                .push_bind(&person.username)
                .push_bind(password_hash)
                .push_bind(person.role)
                .push_bind(school_id)
                .push_bind(false);
        });
        builder.build().execute(&mut **tx).await?;

        person_ids.extend(ids);
    }

    Ok(person_ids)
}

/// Table holding the school membership of `role`. Students are written by
/// [`insert_students`] since they need a registration number.
fn member_table(role: UserRole) -> Option<&'static str> {
    match role {
        UserRole::SchoolAdmin | UserRole::Staff => Some("staff"),
        UserRole::Teacher => Some("teachers"),
        UserRole::Guardian => Some("guardians"),
        UserRole::Student | UserRole::SystemAdmin => None,
    }
}

/// Staff, teacher and guardian membership rows.
pub async fn insert_members(
    tx: &mut Transaction<'_, Postgres>,
    school_id: SchoolId,
    role: UserRole,
    person_ids: &[PersonId],
) -> Result<(), sqlx::Error> {
    let Some(table) = member_table(role) else {
        return Ok(());
    };
    if person_ids.is_empty() {
        return Ok(());
    }

    for chunk in person_ids.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO {table} "));
        match role {
            UserRole::SchoolAdmin | UserRole::Staff => {
                let position = if role == UserRole::SchoolAdmin {
                    SCHOOL_ADMIN_POSITION
                } else {
                    "Secretary"
                };
                builder.push("(person_id, school_id, position) ");
                builder.push_values(chunk, |mut row, person_id| {
                    row.push_bind(*person_id)
                        .push_bind(school_id)
                        .push_bind(position);
                });
            }
            UserRole::Teacher => {
                builder.push("(person_id, school_id, specialization) ");
                builder.push_values(chunk, |mut row, person_id| {
                    row.push_bind(*person_id)
                        .push_bind(school_id)
                        .push_bind("Pedagogy");
                });
            }
            _ => {
                builder.push("(person_id, school_id) ");
                builder.push_values(chunk, |mut row, person_id| {
                    row.push_bind(*person_id).push_bind(school_id);
                });
            }
        }
        builder.build().execute(&mut **tx).await?;
    }

    Ok(())
}

/// Student rows with sequential registration numbers `YYYY000001`...
pub async fn insert_students(
    tx: &mut Transaction<'_, Postgres>,
    school_id: SchoolId,
    year: i32,
    person_ids: &[PersonId],
) -> Result<Vec<StudentId>, sqlx::Error> {
    let mut student_ids = Vec::with_capacity(person_ids.len());

    for (chunk_idx, chunk) in person_ids.chunks(BATCH_SIZE).enumerate() {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO students (person_id, school_id, registration_number) ",
        );
        builder.push_values(chunk.iter().enumerate(), |mut row, (idx, person_id)| {
            let serial = chunk_idx * BATCH_SIZE + idx + 1;
            row.push_bind(*person_id)
                .push_bind(school_id)
                .push_bind(format!("{year}{serial:06}"));
        });
        builder.push(" RETURNING id");
        let ids: Vec<StudentId> = builder
            .build_query_scalar()
            .fetch_all(&mut **tx)
            .await?;
        student_ids.extend(ids);
    }

    Ok(student_ids)
}

/// Two consecutive students share each guardian; the guardian is primary
/// for both.
pub async fn link_guardians(
    tx: &mut Transaction<'_, Postgres>,
    guardian_person_ids: &[PersonId],
    student_ids: &[StudentId],
) -> Result<usize, sqlx::Error> {
    let links: Vec<(StudentId, PersonId)> = student_ids
        .iter()
        .enumerate()
        .filter_map(|(idx, student_id)| {
            guardian_person_ids
                .get(idx / 2)
                .map(|guardian| (*student_id, *guardian))
        })
        .collect();
    if links.is_empty() {
        return Ok(0);
    }

    for chunk in links.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO student_guardians (student_id, guardian_id, relationship, is_primary) \
             SELECT v.student_id, g.id, v.relationship, TRUE FROM (",
        );
        builder.push_values(chunk, |mut row, (student_id, guardian_person)| {
            row.push_bind(*student_id)
                .push_bind(*guardian_person)
                .push_bind("guardian");
        });
        builder.push(
            ") AS v(student_id, guardian_person_id, relationship) \
             JOIN guardians g ON g.person_id = v.guardian_person_id",
        );
        builder.build().execute(&mut **tx).await?;
    }

    Ok(links.len())
}

/// Fills classes in order until each is at capacity. Students beyond the
/// total capacity stay unenrolled.
pub fn assign_classes(
    student_ids: &[StudentId],
    classes: &[(ClassId, i32)],
) -> Vec<(StudentId, ClassId)> {
    let seats = classes
        .iter()
        .flat_map(|(class_id, capacity)| std::iter::repeat_n(*class_id, (*capacity).max(0) as usize));

    student_ids.iter().copied().zip(seats).collect()
}

pub async fn insert_enrollments(
    tx: &mut Transaction<'_, Postgres>,
    school_id: SchoolId,
    year_id: AcademicYearId,
    assignments: &[(StudentId, ClassId)],
) -> Result<usize, sqlx::Error> {
    for chunk in assignments.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO enrollments (school_id, student_id, class_id, academic_year_id, shift) \
             SELECT v.school_id, v.student_id, v.class_id, v.academic_year_id, c.shift FROM (",
        );
        builder.push_values(chunk, |mut row, (student_id, class_id)| {
            row.push_bind(school_id)
                .push_bind(*student_id)
                .push_bind(*class_id)
                .push_bind(year_id);
        });
        builder.push(
            ") AS v(school_id, student_id, class_id, academic_year_id) \
             JOIN classes c ON c.id = v.class_id",
        );
        builder.build().execute(&mut **tx).await?;
    }

    Ok(assignments.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_classes_respects_capacity() {
        let students: Vec<StudentId> = (0..7).map(|_| StudentId::new()).collect();
        let a = ClassId::new();
        let b = ClassId::new();

        let assignments = assign_classes(&students, &[(a, 3), (b, 3)]);
        assert_eq!(assignments.len(), 6);
        assert_eq!(assignments.iter().filter(|(_, c)| *c == a).count(), 3);
        assert_eq!(assignments.iter().filter(|(_, c)| *c == b).count(), 3);
        assert_eq!(assignments[0].0, students[0]);
    }

    #[test]
    fn test_member_tables() {
        assert_eq!(member_table(UserRole::SchoolAdmin), Some("staff"));
        assert_eq!(member_table(UserRole::Teacher), Some("teachers"));
        assert_eq!(member_table(UserRole::Student), None);
        assert_eq!(member_table(UserRole::SystemAdmin), None);
    }
}
