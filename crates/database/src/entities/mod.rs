pub mod course;
pub mod course_access_role;
pub mod course_enrollment;
pub mod course_grade;
pub mod organization;
pub mod program;
pub mod program_course_enrollment;
pub mod program_course_run;
pub mod program_curriculum;
pub mod program_enrollment;
pub mod saml_provider;
pub mod user;
pub mod user_social_auth;
