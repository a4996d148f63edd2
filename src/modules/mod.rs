pub mod academic_years;
pub mod auth;
pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod feedback;
pub mod guardians;
pub mod health;
pub mod people;
pub mod schools;
pub mod staff;
pub mod students;
pub mod teachers;
pub mod users;
