use crate::error::ApiError;
use models::{tab::CourseTab, tab_list::TabLocator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TabResponse {
    pub tab_id: String,
    #[serde(rename = "type")]
    pub tab_type: String,
    pub name: Option<String>,
    pub is_hidden: bool,
    pub is_movable: bool,
    pub is_hideable: bool,
    /// Type-specific keys such as `link` or `url_slug`
    #[schema(value_type = Object)]
    pub settings: Map<String, Value>,
}

impl From<&CourseTab> for TabResponse {
    fn from(tab: &CourseTab) -> Self {
        Self {
            tab_id: tab.tab_id(),
            tab_type: tab.tab_type().to_string(),
            name: tab.name.clone(),
            is_hidden: tab.is_hidden,
            is_movable: tab.is_movable(),
            is_hideable: tab.is_hideable(),
            settings: tab.fields.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TabListResponse {
    pub tabs: Vec<TabResponse>,
}

impl<'a> FromIterator<&'a CourseTab> for TabListResponse {
    fn from_iter<I: IntoIterator<Item = &'a CourseTab>>(iter: I) -> Self {
        Self {
            tabs: iter.into_iter().map(TabResponse::from).collect(),
        }
    }
}

/// Either a built-in tab id or the usage key of a static tab
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TabLocatorBody {
    pub tab_id: Option<String>,
    pub tab_locator: Option<String>,
}

impl TryFrom<TabLocatorBody> for TabLocator {
    type Error = ApiError;

    fn try_from(body: TabLocatorBody) -> Result<Self, Self::Error> {
        match (body.tab_id, body.tab_locator) {
            (Some(tab_id), None) => Ok(TabLocator::TabId(tab_id)),
            (None, Some(locator)) => Ok(TabLocator::TabLocator(locator)),
            _ => Err(ApiError::BadRequest(
                "Exactly one of tab_id or tab_locator is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderTabsRequest {
    pub tabs: Vec<TabLocatorBody>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TabSettingsRequest {
    #[serde(flatten)]
    pub locator: TabLocatorBody,
    pub is_hidden: bool,
}
