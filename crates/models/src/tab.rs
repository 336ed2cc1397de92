use log::warn;
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};
use thiserror::Error;

/// Type name of the tab that must always come first
pub const COURSEWARE: &str = "courseware";

/// Reasons a tab or list of tabs is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTabsError {
    #[error("expected a list of tabs")]
    NotAList,
    #[error("expected a tab to be a JSON object")]
    NotAnObject,
    #[error("tab is missing its type")]
    MissingType,
    #[error("tab of type '{tab_type}' is missing key '{key}'")]
    MissingKey { tab_type: String, key: String },
    #[error("expected first tab to be of type '{}', found '{found}'", COURSEWARE)]
    FirstTab { found: String },
    #[error("tab of type '{0}' appears more than once")]
    Duplicate(String),
}

/// Course settings that influence which tabs are generated and displayed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseSettings {
    pub course_key: String,
    pub syllabus_present: bool,
    pub discussion_link: Option<String>,
    pub hide_progress_tab: bool,
}

/// Who is looking at the course
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub is_staff: bool,
    pub is_enrolled: bool,
}

impl Viewer {
    pub const ANONYMOUS: Self = Viewer {
        is_staff: false,
        is_enrolled: false,
    };
}

/// Everything a tab type needs to decide whether a tab is shown
#[derive(Debug, Clone, Copy)]
pub struct TabContext<'a> {
    pub course: &'a CourseSettings,
    pub viewer: Viewer,
}

/// A kind of course tab
///
/// Built-in types are registered in [`TabTypeRegistry::default`]; other
/// crates can add their own through [`TabTypeRegistry::register`].
pub trait TabType: Send + Sync + Debug {
    /// Name stored in the `type` key of the persisted tab
    fn type_name(&self) -> &str;

    /// Name used when the persisted tab doesn't carry one
    fn default_name(&self) -> Option<&str> {
        None
    }

    /// Position hint used when a tab is inserted automatically
    fn priority(&self) -> Option<u32> {
        None
    }

    fn is_movable(&self) -> bool {
        true
    }

    fn is_hideable(&self) -> bool {
        false
    }

    fn allow_multiple(&self) -> bool {
        false
    }

    /// Keys a persisted tab of this type must contain
    fn required_keys(&self) -> &[&str] {
        &[]
    }

    fn tab_id(&self, _tab: &CourseTab) -> String {
        self.type_name().to_string()
    }

    /// Absolute URL of the tab, if it has one
    fn link(&self, _tab: &CourseTab, _course_key: &str, _root_url: &str) -> Option<String> {
        None
    }

    fn is_enabled(&self, _tab: &CourseTab, _ctx: &TabContext<'_>) -> bool {
        true
    }
}

/// How a built-in tab builds its URL
#[derive(Debug, Clone, Copy)]
enum LinkKind {
    /// Path below `/courses/{course_key}`
    CoursePath(&'static str),
    /// URL stored on the tab itself
    Field(&'static str),
    /// Path below `/courses/{course_key}` taken from a field on the tab
    FieldPath(&'static str),
}

/// Who can see a built-in tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Everyone,
    EnrolledOrStaff,
    Staff,
}

#[derive(Debug)]
struct BuiltinTabType {
    type_name: &'static str,
    default_name: Option<&'static str>,
    priority: Option<u32>,
    movable: bool,
    hideable: bool,
    multiple: bool,
    required_keys: &'static [&'static str],
    /// Field appended to the type name to form the tab id
    id_key: Option<&'static str>,
    link: LinkKind,
    audience: Audience,
}

impl BuiltinTabType {
    const fn new(type_name: &'static str, default_name: &'static str, path: &'static str) -> Self {
        Self {
            type_name,
            default_name: Some(default_name),
            priority: None,
            movable: true,
            hideable: false,
            multiple: false,
            required_keys: &[],
            id_key: None,
            link: LinkKind::CoursePath(path),
            audience: Audience::Everyone,
        }
    }
}

impl TabType for BuiltinTabType {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn default_name(&self) -> Option<&str> {
        self.default_name
    }

    fn priority(&self) -> Option<u32> {
        self.priority
    }

    fn is_movable(&self) -> bool {
        self.movable
    }

    fn is_hideable(&self) -> bool {
        self.hideable
    }

    fn allow_multiple(&self) -> bool {
        self.multiple
    }

    fn required_keys(&self) -> &[&str] {
        self.required_keys
    }

    fn tab_id(&self, tab: &CourseTab) -> String {
        match self.id_key.and_then(|key| tab.field_str(key)) {
            Some(suffix) => format!("{}_{suffix}", self.type_name),
            None => self.type_name.to_string(),
        }
    }

    fn link(&self, tab: &CourseTab, course_key: &str, root_url: &str) -> Option<String> {
        let root = root_url.trim_end_matches('/');
        match self.link {
            LinkKind::CoursePath(path) => Some(format!("{root}/courses/{course_key}/{path}")),
            LinkKind::Field(key) => tab.field_str(key).map(str::to_string),
            LinkKind::FieldPath(key) => tab
                .field_str(key)
                .map(|slug| format!("{root}/courses/{course_key}/{slug}")),
        }
    }

    fn is_enabled(&self, tab: &CourseTab, ctx: &TabContext<'_>) -> bool {
        if self.type_name == "progress" && ctx.course.hide_progress_tab {
            return false;
        }

        let staff_only = tab
            .fields
            .get("course_staff_only")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if staff_only && !ctx.viewer.is_staff {
            return false;
        }

        match self.audience {
            Audience::Everyone => true,
            Audience::EnrolledOrStaff => ctx.viewer.is_enrolled || ctx.viewer.is_staff,
            Audience::Staff => ctx.viewer.is_staff,
        }
    }
}

fn builtin_tab_types() -> [BuiltinTabType; 15] {
    [
        BuiltinTabType {
            priority: Some(10),
            movable: false,
            ..BuiltinTabType::new(COURSEWARE, "Course", "courseware")
        },
        BuiltinTabType {
            priority: Some(20),
            movable: false,
            ..BuiltinTabType::new("course_info", "Home", "course/")
        },
        BuiltinTabType {
            priority: Some(30),
            audience: Audience::EnrolledOrStaff,
            ..BuiltinTabType::new("dates", "Dates", "dates")
        },
        BuiltinTabType {
            priority: Some(40),
            audience: Audience::EnrolledOrStaff,
            ..BuiltinTabType::new("discussion", "Discussion", "discussion/forum/")
        },
        BuiltinTabType {
            priority: Some(40),
            required_keys: &["link"],
            link: LinkKind::Field("link"),
            ..BuiltinTabType::new("external_discussion", "Discussion", "")
        },
        BuiltinTabType {
            default_name: None,
            multiple: true,
            required_keys: &["name", "link"],
            link: LinkKind::Field("link"),
            ..BuiltinTabType::new("external_link", "", "")
        },
        BuiltinTabType {
            priority: Some(70),
            hideable: true,
            ..BuiltinTabType::new("wiki", "Wiki", "course_wiki")
        },
        BuiltinTabType {
            priority: Some(50),
            ..BuiltinTabType::new("textbooks", "Textbooks", "book/0/")
        },
        BuiltinTabType {
            priority: Some(50),
            ..BuiltinTabType::new("pdf_textbooks", "Textbooks", "pdfbook/0/")
        },
        BuiltinTabType {
            priority: Some(50),
            ..BuiltinTabType::new("html_textbooks", "Textbooks", "htmlbook/0/")
        },
        BuiltinTabType {
            priority: Some(60),
            hideable: true,
            audience: Audience::EnrolledOrStaff,
            ..BuiltinTabType::new("progress", "Progress", "progress")
        },
        BuiltinTabType {
            default_name: None,
            hideable: true,
            multiple: true,
            required_keys: &["name", "url_slug"],
            id_key: Some("url_slug"),
            link: LinkKind::FieldPath("url_slug"),
            ..BuiltinTabType::new("static_tab", "", "")
        },
        BuiltinTabType {
            priority: Some(80),
            ..BuiltinTabType::new("syllabus", "Syllabus", "syllabus")
        },
        BuiltinTabType {
            priority: Some(90),
            hideable: true,
            audience: Audience::EnrolledOrStaff,
            ..BuiltinTabType::new("edxnotes", "Notes", "edxnotes/")
        },
        BuiltinTabType {
            priority: Some(100),
            movable: false,
            audience: Audience::Staff,
            ..BuiltinTabType::new("instructor", "Instructor", "instructor")
        },
    ]
}

/// Lookup table from tab type name to its implementation
#[derive(Clone)]
pub struct TabTypeRegistry {
    types: HashMap<String, Arc<dyn TabType>>,
}

impl Debug for TabTypeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut names: Vec<_> = self.types.keys().collect();
        names.sort();
        f.debug_struct("TabTypeRegistry")
            .field("types", &names)
            .finish()
    }
}

impl Default for TabTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for tab_type in builtin_tab_types() {
            registry.register(tab_type);
        }
        registry
    }
}

impl TabTypeRegistry {
    /// A registry without any tab types
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Adds a tab type, returning the one it replaced
    pub fn register<T: TabType + 'static>(&mut self, tab_type: T) -> Option<Arc<dyn TabType>> {
        self.types
            .insert(tab_type.type_name().to_string(), Arc::new(tab_type))
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn TabType>> {
        self.types.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Creates a tab of the given type with its default name
    pub fn load(&self, type_name: &str) -> Option<CourseTab> {
        self.get(type_name).map(CourseTab::new)
    }
}

/// A single navigational tab of a course
#[derive(Debug, Clone)]
pub struct CourseTab {
    kind: Arc<dyn TabType>,
    pub name: Option<String>,
    pub is_hidden: bool,
    /// Type-specific keys such as `link` or `url_slug`
    pub fields: Map<String, Value>,
}

impl PartialEq for CourseTab {
    fn eq(&self, other: &Self) -> bool {
        self.tab_type() == other.tab_type()
            && self.name == other.name
            && self.is_hidden == other.is_hidden
            && self.fields == other.fields
    }
}

impl CourseTab {
    pub fn new(kind: Arc<dyn TabType>) -> Self {
        let name = kind.default_name().map(str::to_string);
        Self {
            kind,
            name,
            is_hidden: false,
            fields: Map::new(),
        }
    }

    /// Sets a type-specific key
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Loads a tab from its persisted JSON form
    ///
    /// Returns `Ok(None)` for types the registry doesn't know, so a course
    /// keeps working after a plugin providing a tab type is removed.
    pub fn from_json(
        registry: &TabTypeRegistry,
        value: &Value,
    ) -> Result<Option<Self>, InvalidTabsError> {
        let object = value.as_object().ok_or(InvalidTabsError::NotAnObject)?;
        let type_name = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(InvalidTabsError::MissingType)?;

        let Some(kind) = registry.get(type_name) else {
            warn!("Skipping tab of unknown type '{type_name}'");
            return Ok(None);
        };

        for key in kind.required_keys() {
            if !object.contains_key(*key) {
                return Err(InvalidTabsError::MissingKey {
                    tab_type: type_name.to_string(),
                    key: key.to_string(),
                });
            }
        }

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| kind.default_name().map(str::to_string));
        let is_hidden = object
            .get("is_hidden")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let fields = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "type" | "name" | "is_hidden"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Some(Self {
            kind,
            name,
            is_hidden,
            fields,
        }))
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("type".to_string(), Value::from(self.tab_type()));
        if let Some(name) = &self.name {
            object.insert("name".to_string(), Value::from(name.as_str()));
        }
        if self.is_hidden {
            object.insert("is_hidden".to_string(), Value::Bool(true));
        }
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    pub fn tab_type(&self) -> &str {
        self.kind.type_name()
    }

    pub fn kind(&self) -> &Arc<dyn TabType> {
        &self.kind
    }

    pub fn tab_id(&self) -> String {
        self.kind.tab_id(self)
    }

    pub fn is_movable(&self) -> bool {
        self.kind.is_movable()
    }

    pub fn is_hideable(&self) -> bool {
        self.kind.is_hideable()
    }

    pub fn allow_multiple(&self) -> bool {
        self.kind.allow_multiple()
    }

    pub fn priority(&self) -> Option<u32> {
        self.kind.priority()
    }

    pub fn link(&self, course_key: &str, root_url: &str) -> Option<String> {
        self.kind.link(self, course_key, root_url)
    }

    pub fn is_enabled(&self, ctx: &TabContext<'_>) -> bool {
        self.kind.is_enabled(self, ctx)
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct SurveyTab;

    impl TabType for SurveyTab {
        fn type_name(&self) -> &str {
            "survey"
        }

        fn default_name(&self) -> Option<&str> {
            Some("Survey")
        }

        fn is_hideable(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_builtin_types_registered() {
        let registry = TabTypeRegistry::default();
        for name in ["courseware", "course_info", "wiki", "static_tab", "textbooks"] {
            assert!(registry.contains(name), "{name} should be registered");
        }
        assert!(!registry.contains("survey"));
    }

    #[test]
    fn test_register_plugin_type() {
        let mut registry = TabTypeRegistry::default();
        assert!(registry.register(SurveyTab).is_none());

        let tab = CourseTab::from_json(&registry, &json!({"type": "survey"}))
            .unwrap()
            .unwrap();
        assert_eq!(tab.name.as_deref(), Some("Survey"));
        assert!(tab.is_hideable());
        assert_eq!(tab.tab_id(), "survey");
    }

    #[test]
    fn test_from_json_unknown_type_is_skipped() {
        let registry = TabTypeRegistry::default();
        let tab = CourseTab::from_json(&registry, &json!({"type": "no_such_type"})).unwrap();
        assert!(tab.is_none());
    }

    #[test]
    fn test_from_json_missing_required_key() {
        let registry = TabTypeRegistry::default();
        let err = CourseTab::from_json(&registry, &json!({"type": "static_tab", "name": "x"}))
            .unwrap_err();
        assert_eq!(
            err,
            InvalidTabsError::MissingKey {
                tab_type: "static_tab".to_string(),
                key: "url_slug".to_string()
            }
        );

        let err = CourseTab::from_json(&registry, &json!({"name": "x"})).unwrap_err();
        assert_eq!(err, InvalidTabsError::MissingType);
    }

    #[test]
    fn test_static_tab_id_and_link() {
        let registry = TabTypeRegistry::default();
        let tab = CourseTab::from_json(
            &registry,
            &json!({"type": "static_tab", "name": "same", "url_slug": "schmug"}),
        )
        .unwrap()
        .unwrap();

        assert_eq!(tab.tab_id(), "static_tab_schmug");
        assert_eq!(
            tab.link("course-v1:edX+DemoX+Demo", "http://lms/").as_deref(),
            Some("http://lms/courses/course-v1:edX+DemoX+Demo/schmug")
        );
    }

    #[test]
    fn test_external_link_uses_stored_url() {
        let registry = TabTypeRegistry::default();
        let tab = CourseTab::from_json(
            &registry,
            &json!({"type": "external_link", "name": "Docs", "link": "https://docs.example.com"}),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            tab.link("course-v1:edX+DemoX+Demo", "http://lms").as_deref(),
            Some("https://docs.example.com")
        );
        assert!(tab.allow_multiple());
    }

    #[test]
    fn test_json_round_trip_keeps_extra_keys() {
        let registry = TabTypeRegistry::default();
        let value = json!({
            "type": "static_tab",
            "name": "Extra",
            "url_slug": "extra",
            "course_staff_only": true,
            "is_hidden": true,
        });
        let tab = CourseTab::from_json(&registry, &value).unwrap().unwrap();
        assert!(tab.is_hidden);
        assert_eq!(tab.to_json(), value);
    }

    #[test]
    fn test_progress_hidden_by_course_setting() {
        let registry = TabTypeRegistry::default();
        let tab = registry.load("progress").unwrap();
        let mut course = CourseSettings::default();
        let viewer = Viewer {
            is_staff: false,
            is_enrolled: true,
        };

        assert!(tab.is_enabled(&TabContext {
            course: &course,
            viewer
        }));

        course.hide_progress_tab = true;
        assert!(!tab.is_enabled(&TabContext {
            course: &course,
            viewer
        }));
    }

    #[test]
    fn test_dates_tab_requires_enrollment_or_staff() {
        let registry = TabTypeRegistry::default();
        let tab = registry.load("dates").unwrap();
        let course = CourseSettings::default();
        let ctx = |is_staff, is_enrolled| TabContext {
            course: &course,
            viewer: Viewer {
                is_staff,
                is_enrolled,
            },
        };

        assert!(!tab.is_enabled(&ctx(false, false)));
        assert!(tab.is_enabled(&ctx(true, false)));
        assert!(tab.is_enabled(&ctx(false, true)));
    }
}
