use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform result wrapper returned by every gateway operation.
///
/// Failures still carry `data`, set to the resource's empty value, so callers
/// can render without unwrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, meta: Map<String, Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            meta,
        }
    }

    pub fn failure(error: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
            meta: Map::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            data: f(self.data),
            error: self.error,
            meta: self.meta,
        }
    }
}

/// Top-level body shape of every CMS response: `{ data, meta }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CmsResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub meta: Option<Value>,
}

impl CmsResponse {
    pub fn meta_object(&self) -> Map<String, Value> {
        match &self.meta {
            Some(Value::Object(meta)) => meta.clone(),
            _ => Map::new(),
        }
    }

    /// Elements of a list response; anything but an array reads as empty.
    pub fn into_list(self) -> Vec<Value> {
        match self.data {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    pub fn into_single(self) -> Option<Value> {
        match self.data {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactFields {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    pub fn all_present(&self) -> bool {
        [&self.name, &self.email, &self.subject, &self.message]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Record-creation body for `POST /contacts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessageRequest {
    pub data: ContactFields,
}
