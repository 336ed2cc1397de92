pub mod catalog;
pub mod course_enrollment;
pub mod expiration;
pub mod grades;
pub mod linking;
pub mod overview;
pub mod program_course_enrollment;
pub mod program_enrollment;
pub mod reset;
pub mod tabs;
pub mod user;
