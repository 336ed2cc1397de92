pub mod bulk_write;
pub mod course_run;
pub mod enrollment_status;
pub mod tab;
pub mod tab_list;
