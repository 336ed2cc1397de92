pub mod enrollments;
pub mod pagination;
pub mod programs;
pub mod tabs;
