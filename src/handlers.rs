pub mod academic_calendar;
pub mod applications;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod exports;
pub mod faculties;
pub mod health;
pub mod payments;
pub mod reports;
pub mod settings;
pub mod student_accounts;
pub mod students;
pub mod users;
