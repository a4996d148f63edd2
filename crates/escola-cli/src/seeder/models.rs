//! Seeding configuration and the generated rows.

use escola_models::UserRole;
use escola_models::classes::Shift;

/// Email domain of every seeded person. `clear-seed` deletes by it.
pub const SEED_EMAIL_DOMAIN: &str = "seed.escola.test";

/// Prefix of every seeded school code.
pub const SEED_SCHOOL_CODE_PREFIX: &str = "SEED-";

/// Password shared by all seeded accounts.
pub const SEED_PASSWORD: &str = "escola123";

pub struct SchoolSeed {
    pub name: String,
    pub code: String,
    pub address: String,
    pub phone: String,
}

#[derive(Clone)]
pub struct PersonSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub role: UserRole,
}

pub struct ClassSeed {
    pub course_idx: usize,
    pub name: String,
    pub shift: Shift,
    pub capacity: i32,
}

/// Everything generated for one school before it is written.
pub struct SchoolPlan {
    pub school: SchoolSeed,
    pub year: i32,
    pub courses: Vec<String>,
    pub classes: Vec<ClassSeed>,
    pub admins: Vec<PersonSeed>,
    pub staff: Vec<PersonSeed>,
    pub teachers: Vec<PersonSeed>,
    pub students: Vec<PersonSeed>,
    pub guardians: Vec<PersonSeed>,
}

#[derive(Clone)]
pub struct MembersPerSchool {
    pub staff: usize,
    pub teachers: usize,
    pub students: usize,
}

impl Default for MembersPerSchool {
    fn default() -> Self {
        Self {
            staff: 3,
            teachers: 8,
            students: 60,
        }
    }
}

#[derive(Clone)]
pub struct SeedConfig {
    pub num_schools: usize,
    pub members: MembersPerSchool,
    pub classes_per_course: usize,
}

impl SeedConfig {
    pub fn new(num_schools: usize) -> Self {
        Self {
            num_schools,
            members: MembersPerSchool::default(),
            classes_per_course: 2,
        }
    }

    pub fn with_members(mut self, members: MembersPerSchool) -> Self {
        self.members = members;
        self
    }

    pub fn with_classes_per_course(mut self, classes_per_course: usize) -> Self {
        self.classes_per_course = classes_per_course.max(1);
        self
    }
}

/// Row counts written by a seeding run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub schools: usize,
    pub classes: usize,
    pub accounts: usize,
    pub enrollments: usize,
}
