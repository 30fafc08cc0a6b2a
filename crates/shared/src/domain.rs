use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ProjectId);
id_newtype!(CategoryId);

/// Raw `*_status` flag as the CMS reports it.
///
/// Only an explicit boolean `false` disables a record; a missing flag or any
/// non-boolean value counts as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    Enabled,
    Disabled,
    Absent,
}

impl StatusFlag {
    pub fn from_raw(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Self::Enabled,
            Some(Value::Bool(false)) => Self::Disabled,
            _ => Self::Absent,
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute URL, or empty when the record carries no image.
    pub url: String,
    pub alt: String,
    pub formats: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Option<CategoryId>,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProject {
    pub id: Option<ProjectId>,
    pub document_id: String,
    pub title: String,
    pub subtitle: String,
    /// Rich text from the CMS, passed through without sanitizing.
    pub description: String,
    pub view_link: String,
    pub active: bool,
    pub image: ImageRef,
    pub categories: Vec<CategoryRef>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl CanonicalProject {
    pub fn in_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCategory {
    pub id: Option<CategoryId>,
    pub document_id: String,
    pub name: String,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}
