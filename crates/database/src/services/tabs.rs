use crate::{
    entities::{course, course_access_role, course_enrollment, user},
    error::ServiceError,
};
use chrono::Utc;
use futures::try_join;
use log::info;
use models::{
    tab::{CourseSettings, CourseTab, TabContext, TabTypeRegistry, Viewer},
    tab_list::{CourseTabList, TabLocator},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter,
};

pub struct TabService;

impl TabService {
    pub async fn get_course(
        db: &DatabaseConnection,
        course_key: &str,
    ) -> Result<course::Model, ServiceError> {
        course::Entity::find_by_id(course_key.to_string())
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Course {course_key} not found")))
    }

    pub fn settings(course: &course::Model) -> CourseSettings {
        CourseSettings {
            course_key: course.id.clone(),
            syllabus_present: course.syllabus_present,
            discussion_link: course.discussion_link.clone(),
            hide_progress_tab: course.hide_progress_tab,
        }
    }

    /// Loads a course's tabs, falling back to the default set when none are stored
    pub async fn get_tabs(
        db: &DatabaseConnection,
        registry: &TabTypeRegistry,
        course_key: &str,
    ) -> Result<(course::Model, CourseTabList), ServiceError> {
        let course = Self::get_course(db, course_key).await?;
        let tabs = CourseTabList::from_json(registry, &course.tabs)?;
        let tabs = if tabs.is_empty() {
            CourseTabList::initialize_default(registry, &Self::settings(&course))
        } else {
            tabs
        };
        Ok((course, tabs))
    }

    /// Tabs shown to a user, or to an anonymous visitor when `user` is `None`
    pub async fn get_displayable_tabs(
        db: &DatabaseConnection,
        registry: &TabTypeRegistry,
        course_key: &str,
        user: Option<&user::Model>,
    ) -> Result<Vec<CourseTab>, ServiceError> {
        let (course, tabs) = Self::get_tabs(db, registry, course_key).await?;
        let viewer = match user {
            Some(user) => Self::viewer(db, user, course_key).await?,
            None => Viewer::ANONYMOUS,
        };

        let settings = Self::settings(&course);
        let ctx = TabContext {
            course: &settings,
            viewer,
        };
        Ok(tabs.iterate_displayable(&ctx).cloned().collect())
    }

    /// Whether the user may change the course's tabs
    pub async fn can_edit(
        db: &DatabaseConnection,
        user: &user::Model,
        course_key: &str,
    ) -> Result<bool, ServiceError> {
        Ok(Self::viewer(db, user, course_key).await?.is_staff)
    }

    async fn viewer(
        db: &DatabaseConnection,
        user: &user::Model,
        course_key: &str,
    ) -> Result<Viewer, DbErr> {
        let roles = course_access_role::Entity::find()
            .filter(course_access_role::Column::UserId.eq(user.id))
            .filter(course_access_role::Column::CourseKey.eq(course_key))
            .count(db);
        let enrollments = course_enrollment::Entity::find()
            .filter(course_enrollment::Column::UserId.eq(user.id))
            .filter(course_enrollment::Column::CourseKey.eq(course_key))
            .filter(course_enrollment::Column::IsActive.eq(true))
            .count(db);
        let (roles, enrollments) = try_join!(roles, enrollments)?;

        Ok(Viewer {
            is_staff: user.is_staff || roles > 0,
            is_enrolled: enrollments > 0,
        })
    }

    pub async fn reorder_tabs(
        db: &DatabaseConnection,
        registry: &TabTypeRegistry,
        course_key: &str,
        locators: &[TabLocator],
    ) -> Result<CourseTabList, ServiceError> {
        let (course, tabs) = Self::get_tabs(db, registry, course_key).await?;
        let tabs = tabs.reorder(locators)?;
        Self::save_tabs(db, course, &tabs).await?;

        info!("Reordered {} tabs of {course_key}", tabs.len());
        Ok(tabs)
    }

    pub async fn set_tab_visibility(
        db: &DatabaseConnection,
        registry: &TabTypeRegistry,
        course_key: &str,
        locator: &TabLocator,
        is_hidden: bool,
    ) -> Result<CourseTab, ServiceError> {
        let (course, mut tabs) = Self::get_tabs(db, registry, course_key).await?;
        let tab = tabs.set_visibility(locator, is_hidden)?.clone();
        Self::save_tabs(db, course, &tabs).await?;

        info!("Set is_hidden={is_hidden} on tab {locator} of {course_key}");
        Ok(tab)
    }

    async fn save_tabs(
        db: &DatabaseConnection,
        course: course::Model,
        tabs: &CourseTabList,
    ) -> Result<course::Model, DbErr> {
        let mut active = course.into_active_model();
        active.tabs = Set(tabs.to_json());
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(db).await
    }
}
