use crate::{
    entities::course_grade,
    error::ServiceError,
    services::{catalog::CatalogService, program_course_enrollment::ProgramCourseEnrollmentService},
};
use log::warn;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Grade of one program learner in a course run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgramCourseGrade {
    Grade {
        student_key: String,
        passed: bool,
        percent: f64,
        letter_grade: Option<String>,
    },
    Error {
        student_key: String,
        error: String,
    },
}

impl ProgramCourseGrade {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

pub struct GradeService;

impl GradeService {
    /// A page of grades for the linked learners of a program course run
    ///
    /// Learners without a computed grade have no graded work yet and get a
    /// zero, failing grade.
    pub async fn iter_program_course_grades(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        course_key: &str,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProgramCourseGrade>, u64), ServiceError> {
        CatalogService::get_program(db, program_uuid).await?;
        CatalogService::ensure_course_in_program(db, program_uuid, course_key).await?;

        let (enrollments, total) = ProgramCourseEnrollmentService::fetch_program_course_enrollments(
            db,
            program_uuid,
            course_key,
            page,
            per_page,
            true,
        )
        .await?;

        let user_ids: Vec<Uuid> = enrollments
            .iter()
            .filter_map(|(_, program_enrollment)| program_enrollment.user_id)
            .collect();
        let grades: HashMap<Uuid, course_grade::Model> = course_grade::Entity::find()
            .filter(course_grade::Column::CourseKey.eq(course_key))
            .filter(course_grade::Column::UserId.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|grade| (grade.user_id, grade))
            .collect();

        let grades = enrollments
            .into_iter()
            .filter_map(|(_, program_enrollment)| {
                let user_id = program_enrollment.user_id?;
                let student_key = program_enrollment.external_user_key.unwrap_or_default();
                Some(match grades.get(&user_id) {
                    Some(grade) => match &grade.error {
                        Some(error) => {
                            warn!("Grade of {student_key} in {course_key} failed: {error}");
                            ProgramCourseGrade::Error {
                                student_key,
                                error: error.clone(),
                            }
                        }
                        None => ProgramCourseGrade::Grade {
                            student_key,
                            passed: grade.passed,
                            percent: grade.percent,
                            letter_grade: grade.letter_grade.clone(),
                        },
                    },
                    None => ProgramCourseGrade::Grade {
                        student_key,
                        passed: false,
                        percent: 0.0,
                        letter_grade: None,
                    },
                })
            })
            .collect();

        Ok((grades, total))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{
        insert_course, insert_program, insert_program_course_enrollment, insert_program_enrollment,
        insert_user, now, setup_db,
    };
    use models::enrollment_status::{ProgramCourseEnrollmentStatus, ProgramEnrollmentStatus};
    use sea_orm::{ActiveModelTrait, ActiveValue::Set};

    const COURSE: &str = "course-v1:TestX+Grades+1";

    async fn insert_grade(
        db: &DatabaseConnection,
        user_id: Uuid,
        percent: f64,
        error: Option<&str>,
    ) {
        course_grade::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            course_key: Set(COURSE.to_string()),
            percent: Set(percent),
            letter_grade: Set((percent >= 0.5).then(|| "Pass".to_string())),
            passed: Set(percent >= 0.5),
            error: Set(error.map(str::to_string)),
            updated_at: Set(now()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_program_course_grades() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let fixture = insert_program(&db, "TestX", &[COURSE]).await;

        let mut learners = Vec::new();
        for key in ["graded", "broken", "ungraded"] {
            let user = insert_user(&db, key, false).await;
            let enrollment = insert_program_enrollment(&db, &fixture, Some(key), Some(user.id), ProgramEnrollmentStatus::Enrolled)
                .await;
            insert_program_course_enrollment(&db, &enrollment, COURSE, None, ProgramCourseEnrollmentStatus::Active)
                .await;
            learners.push(user);
        }
        let waiting = insert_program_enrollment(&db, &fixture, Some("waiting"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_course_enrollment(&db, &waiting, COURSE, None, ProgramCourseEnrollmentStatus::Active)
            .await;

        insert_grade(&db, learners[0].id, 0.8, None).await;
        insert_grade(&db, learners[1].id, 0.0, Some("Grading timed out")).await;

        let (grades, total) =
            GradeService::iter_program_course_grades(&db, fixture.program.uuid, COURSE, 1, 10)
                .await
                .unwrap();

        assert_eq!(total, 3);
        assert_eq!(
            grades,
            vec![
                ProgramCourseGrade::Grade {
                    student_key: "graded".to_string(),
                    passed: true,
                    percent: 0.8,
                    letter_grade: Some("Pass".to_string()),
                },
                ProgramCourseGrade::Error {
                    student_key: "broken".to_string(),
                    error: "Grading timed out".to_string(),
                },
                ProgramCourseGrade::Grade {
                    student_key: "ungraded".to_string(),
                    passed: false,
                    percent: 0.0,
                    letter_grade: None,
                },
            ]
        );
    }

    #[test]
    fn test_grade_serialization() {
        let error = ProgramCourseGrade::Error {
            student_key: "abc".to_string(),
            error: "boom".to_string(),
        };
        assert!(error.is_error());
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"student_key": "abc", "error": "boom"})
        );
    }
}
