use crate::tab::{COURSEWARE, CourseSettings, CourseTab, InvalidTabsError, TabContext, TabTypeRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
};
use thiserror::Error;

/// Identifies a tab in a reorder or visibility request
///
/// Serialized as `{"tab_id": "wiki"}` or, for static tabs, as
/// `{"tab_locator": "block-v1:edX+DemoX+Demo+type@static_tab+block@schmug"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabLocator {
    TabId(String),
    TabLocator(String),
}

impl TabLocator {
    fn matches(&self, tab: &CourseTab) -> bool {
        match self {
            Self::TabId(id) => tab.tab_id() == *id,
            Self::TabLocator(locator) => {
                let slug = locator.rsplit("block@").next().unwrap_or(locator);
                tab.tab_type() == "static_tab" && tab.field_str("url_slug") == Some(slug)
            }
        }
    }
}

impl Display for TabLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::TabId(id) => write!(f, "{id}"),
            Self::TabLocator(locator) => write!(f, "{locator}"),
        }
    }
}

/// Reasons a reorder or visibility change is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabEditError {
    #[error("Tab with id_locator '{0}' does not exist.")]
    UnknownTab(String),
    #[error("New list of tabs is not valid: {0}.")]
    InvalidOrder(InvalidTabsError),
    #[error("Cannot set is_hidden attribute on tab of type '{0}'.")]
    NotHideable(String),
}

/// The ordered tabs of a course
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseTabList {
    tabs: Vec<CourseTab>,
}

impl CourseTabList {
    /// Builds a list from already loaded tabs, validating it
    pub fn new(tabs: Vec<CourseTab>) -> Result<Self, InvalidTabsError> {
        Self::validate(&tabs)?;
        Ok(Self { tabs })
    }

    /// Loads the persisted form of a course's tabs
    ///
    /// The first-tab rule is checked on the raw list, so an unknown type in
    /// first position is still rejected; unknown types elsewhere are dropped.
    pub fn from_json(registry: &TabTypeRegistry, value: &Value) -> Result<Self, InvalidTabsError> {
        let raw = match value {
            Value::Null => return Ok(Self::default()),
            Value::Array(raw) => raw,
            _ => return Err(InvalidTabsError::NotAList),
        };

        if let Some(first) = raw.first() {
            let found = first.get("type").and_then(Value::as_str).unwrap_or_default();
            if found != COURSEWARE {
                return Err(InvalidTabsError::FirstTab {
                    found: found.to_string(),
                });
            }
        }

        let mut tabs = Vec::with_capacity(raw.len());
        for value in raw {
            if let Some(tab) = CourseTab::from_json(registry, value)? {
                tabs.push(tab);
            }
        }

        Self::new(tabs)
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.tabs.iter().map(CourseTab::to_json).collect())
    }

    /// Checks the structural rules of a tab list
    pub fn validate(tabs: &[CourseTab]) -> Result<(), InvalidTabsError> {
        let Some(first) = tabs.first() else {
            return Ok(());
        };
        if first.tab_type() != COURSEWARE {
            return Err(InvalidTabsError::FirstTab {
                found: first.tab_type().to_string(),
            });
        }

        let mut seen = HashSet::new();
        for tab in tabs {
            for key in tab.kind().required_keys() {
                if !tab.fields.contains_key(*key) && !(*key == "name" && tab.name.is_some()) {
                    return Err(InvalidTabsError::MissingKey {
                        tab_type: tab.tab_type().to_string(),
                        key: key.to_string(),
                    });
                }
            }

            if !tab.allow_multiple() && !seen.insert(tab.tab_type()) {
                return Err(InvalidTabsError::Duplicate(tab.tab_type().to_string()));
            }
        }

        Ok(())
    }

    /// The tabs a course gets when it has none persisted
    pub fn initialize_default(registry: &TabTypeRegistry, course: &CourseSettings) -> Self {
        let mut types = vec![COURSEWARE, "course_info"];
        if course.syllabus_present {
            types.push("syllabus");
        }

        let mut tabs: Vec<CourseTab> = types
            .into_iter()
            .filter_map(|type_name| registry.load(type_name))
            .collect();

        match course.discussion_link.as_deref().filter(|link| !link.is_empty()) {
            Some(link) => tabs.extend(
                registry
                    .load("external_discussion")
                    .map(|tab| tab.with_field("link", link)),
            ),
            None => tabs.extend(registry.load("discussion")),
        }

        tabs.extend(
            ["wiki", "textbooks", "progress", "dates"]
                .into_iter()
                .filter_map(|type_name| registry.load(type_name)),
        );

        Self { tabs }
    }

    /// Tabs the given viewer is allowed to see, in order
    pub fn iterate_displayable<'a>(
        &'a self,
        ctx: &'a TabContext<'a>,
    ) -> impl Iterator<Item = &'a CourseTab> + 'a {
        self.tabs
            .iter()
            .filter(move |tab| !tab.is_hidden && tab.is_enabled(ctx))
    }

    /// Computes a new order from the tabs a client asked for
    ///
    /// Requested tabs come first, in the requested order. Tabs the client
    /// didn't mention (typically ones its UI doesn't render) follow in their
    /// original relative order. A tab named twice keeps its first position.
    pub fn reorder(&self, locators: &[TabLocator]) -> Result<Self, TabEditError> {
        let mut placed = vec![false; self.tabs.len()];
        let mut tabs = Vec::with_capacity(self.tabs.len());

        for locator in locators {
            let index = self
                .position(locator)
                .ok_or_else(|| TabEditError::UnknownTab(locator.to_string()))?;
            if !placed[index] {
                placed[index] = true;
                tabs.push(self.tabs[index].clone());
            }
        }

        tabs.extend(
            self.tabs
                .iter()
                .zip(&placed)
                .filter(|(_, placed)| !**placed)
                .map(|(tab, _)| tab.clone()),
        );

        Self::new(tabs).map_err(TabEditError::InvalidOrder)
    }

    /// Hides or shows a single tab
    pub fn set_visibility(
        &mut self,
        locator: &TabLocator,
        is_hidden: bool,
    ) -> Result<&CourseTab, TabEditError> {
        let index = self
            .position(locator)
            .ok_or_else(|| TabEditError::UnknownTab(locator.to_string()))?;

        let tab = &mut self.tabs[index];
        if !tab.is_hideable() {
            return Err(TabEditError::NotHideable(tab.tab_type().to_string()));
        }
        tab.is_hidden = is_hidden;

        Ok(tab)
    }

    pub fn position(&self, locator: &TabLocator) -> Option<usize> {
        self.tabs.iter().position(|tab| locator.matches(tab))
    }

    pub fn get_tab_by_id(&self, tab_id: &str) -> Option<&CourseTab> {
        self.tabs.iter().find(|tab| tab.tab_id() == tab_id)
    }

    pub fn get_tab_by_type(&self, tab_type: &str) -> Option<&CourseTab> {
        self.tabs.iter().find(|tab| tab.tab_type() == tab_type)
    }

    pub fn get_tab_by_slug(&self, url_slug: &str) -> Option<&CourseTab> {
        self.tabs
            .iter()
            .find(|tab| tab.tab_type() == "static_tab" && tab.field_str("url_slug") == Some(url_slug))
    }

    /// The discussion tab of the course, internal or external
    pub fn get_discussion(&self) -> Option<&CourseTab> {
        self.get_tab_by_type("external_discussion")
            .or_else(|| self.get_tab_by_type("discussion"))
    }

    pub fn tabs(&self) -> &[CourseTab] {
        &self.tabs
    }

    pub fn into_tabs(self) -> Vec<CourseTab> {
        self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tab::Viewer;
    use serde_json::json;

    fn all_valid_tabs() -> Value {
        json!([
            {"type": "courseware"},
            {"type": "dates"},
            {"type": "discussion", "name": "fake_name"},
            {"type": "external_link", "name": "fake_name", "link": "fake_link"},
            {"type": "external_link", "name": "fake_name", "link": "fake_link"},
            {"type": "textbooks"},
            {"type": "pdf_textbooks"},
            {"type": "html_textbooks"},
            {"type": "progress", "name": "fake_name"},
            {"type": "static_tab", "name": "fake_name", "url_slug": "schlug"},
            {"type": "syllabus"},
        ])
    }

    fn ids(list: &CourseTabList) -> Vec<String> {
        list.tabs().iter().map(CourseTab::tab_id).collect()
    }

    #[test]
    fn test_valid_tab_lists() {
        let registry = TabTypeRegistry::default();
        let valid = [
            json!([]),
            all_valid_tabs(),
            json!([
                {"type": "courseware"},
                {"type": "external_discussion", "name": "fake_name", "link": "fake_link"},
            ]),
        ];

        for value in valid {
            let list = CourseTabList::from_json(&registry, &value).unwrap();
            assert_eq!(list.len(), value.as_array().unwrap().len());
        }
    }

    #[test]
    fn test_invalid_tab_lists() {
        let registry = TabTypeRegistry::default();
        let mut invalid = vec![
            json!([{"type": "unknown_type"}]),
            json!([{"type": "discussion", "name": "fake_name"}, {"type": "courseware"}]),
        ];
        for unique in ["courseware", "textbooks", "pdf_textbooks", "html_textbooks"] {
            invalid.push(json!([{"type": "courseware"}, {"type": unique}, {"type": unique}]));
        }

        for value in invalid {
            assert!(
                CourseTabList::from_json(&registry, &value).is_err(),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        let registry = TabTypeRegistry::default();
        let list = CourseTabList::from_json(
            &registry,
            &json!([{"type": "courseware"}, {"type": "no_such_type"}]),
        )
        .unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_duplicate_error_names_type() {
        let registry = TabTypeRegistry::default();
        let err = CourseTabList::from_json(
            &registry,
            &json!([{"type": "courseware"}, {"type": "wiki"}, {"type": "wiki"}]),
        )
        .unwrap_err();
        assert_eq!(err, InvalidTabsError::Duplicate("wiki".to_string()));
    }

    #[test]
    fn test_get_tab_by_methods() {
        let registry = TabTypeRegistry::default();
        let list = CourseTabList::from_json(&registry, &all_valid_tabs()).unwrap();
        for tab in list.tabs() {
            assert_eq!(list.get_tab_by_type(tab.tab_type()).unwrap().tab_type(), tab.tab_type());
            assert_eq!(list.get_tab_by_id(&tab.tab_id()).unwrap().tab_id(), tab.tab_id());
        }
        assert!(list.get_tab_by_slug("schlug").is_some());
        assert!(list.get_tab_by_slug("missing").is_none());
    }

    #[test]
    fn test_initialize_default_syllabus() {
        let registry = TabTypeRegistry::default();
        let mut course = CourseSettings::default();

        let list = CourseTabList::initialize_default(&registry, &course);
        assert!(list.get_tab_by_type("syllabus").is_none());

        course.syllabus_present = true;
        let list = CourseTabList::initialize_default(&registry, &course);
        assert!(list.get_tab_by_type("syllabus").is_some());
        assert!(CourseTabList::validate(list.tabs()).is_ok());
    }

    #[test]
    fn test_initialize_default_discussion() {
        let registry = TabTypeRegistry::default();
        let mut course = CourseSettings {
            discussion_link: Some("other_discussion_link".to_string()),
            ..CourseSettings::default()
        };

        let list = CourseTabList::initialize_default(&registry, &course);
        assert!(list.get_tab_by_type("external_discussion").is_some());
        assert!(list.get_tab_by_type("discussion").is_none());
        assert_eq!(
            list.get_discussion().unwrap().field_str("link"),
            Some("other_discussion_link")
        );

        course.discussion_link = Some(String::new());
        let list = CourseTabList::initialize_default(&registry, &course);
        assert!(list.get_tab_by_type("external_discussion").is_none());
        assert!(list.get_tab_by_type("discussion").is_some());
    }

    #[test]
    fn test_iterate_displayable_staff_only_static_tab() {
        let registry = TabTypeRegistry::default();
        let list = CourseTabList::from_json(
            &registry,
            &json!([
                {"type": "courseware"},
                {"type": "static_tab", "name": "Static Tab Free", "url_slug": "extra_tab_1", "course_staff_only": false},
                {"type": "static_tab", "name": "Static Tab Instructors Only", "url_slug": "extra_tab_2", "course_staff_only": true},
                {"type": "wiki", "is_hidden": true},
            ]),
        )
        .unwrap();
        let course = CourseSettings::default();

        let learner = TabContext {
            course: &course,
            viewer: Viewer {
                is_staff: false,
                is_enrolled: true,
            },
        };
        let names: Vec<_> = list
            .iterate_displayable(&learner)
            .filter_map(|tab| tab.name.as_deref())
            .collect();
        assert!(names.contains(&"Static Tab Free"));
        assert!(!names.contains(&"Static Tab Instructors Only"));
        assert!(!names.contains(&"Wiki"));

        let staff = TabContext {
            course: &course,
            viewer: Viewer {
                is_staff: true,
                is_enrolled: false,
            },
        };
        let names: Vec<_> = list
            .iterate_displayable(&staff)
            .filter_map(|tab| tab.name.as_deref())
            .collect();
        assert!(names.contains(&"Static Tab Instructors Only"));
    }

    #[test]
    fn test_reorder_appends_unmentioned_tabs() {
        let registry = TabTypeRegistry::default();
        let list = CourseTabList::from_json(&registry, &all_valid_tabs()).unwrap();

        let reordered = list
            .reorder(&[
                TabLocator::TabId("courseware".to_string()),
                TabLocator::TabLocator("block-v1:edX+DemoX+Demo+type@static_tab+block@schlug".to_string()),
                TabLocator::TabId("syllabus".to_string()),
            ])
            .unwrap();

        assert_eq!(
            ids(&reordered)[..4],
            ["courseware", "static_tab_schlug", "syllabus", "dates"]
        );
        assert_eq!(reordered.len(), list.len());
    }

    #[test]
    fn test_reorder_unknown_tab() {
        let registry = TabTypeRegistry::default();
        let list = CourseTabList::from_json(&registry, &all_valid_tabs()).unwrap();

        let err = list
            .reorder(&[TabLocator::TabId("nope".to_string())])
            .unwrap_err();
        assert_eq!(err.to_string(), "Tab with id_locator 'nope' does not exist.");
    }

    #[test]
    fn test_reorder_must_keep_courseware_first() {
        let registry = TabTypeRegistry::default();
        let list = CourseTabList::from_json(&registry, &all_valid_tabs()).unwrap();

        let err = list
            .reorder(&[TabLocator::TabId("dates".to_string())])
            .unwrap_err();
        assert!(matches!(err, TabEditError::InvalidOrder(InvalidTabsError::FirstTab { .. })));
        assert_eq!(
            err.to_string(),
            "New list of tabs is not valid: expected first tab to be of type 'courseware', found 'dates'."
        );
    }

    #[test]
    fn test_set_visibility() {
        let registry = TabTypeRegistry::default();
        let mut list = CourseTabList::initialize_default(&registry, &CourseSettings::default());

        let tab = list
            .set_visibility(&TabLocator::TabId("wiki".to_string()), true)
            .unwrap();
        assert!(tab.is_hidden);
        assert_eq!(
            list.to_json()
                .as_array()
                .unwrap()
                .iter()
                .find(|tab| tab["type"] == "wiki")
                .unwrap()["is_hidden"],
            true
        );

        let err = list
            .set_visibility(&TabLocator::TabId("courseware".to_string()), true)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot set is_hidden attribute on tab of type 'courseware'."
        );
    }
}
