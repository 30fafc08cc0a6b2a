//! Conversion of raw CMS records into canonical records.
//!
//! The CMS returns the same logical record in several shapes: fields either at
//! the top level or under an `attributes` wrapper, relations either as bare
//! arrays or wrapped in `{ data: [...] }`, and media URLs either absolute or
//! relative to the media host. Every field is resolved through an ordered list
//! of extraction tiers; the first tier yielding a value wins and tiers are
//! never merged.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{
    CanonicalCategory, CanonicalProject, CategoryId, CategoryRef, ImageRef, ProjectId, StatusFlag,
};

/// One extraction strategy for a field.
type Tier<T> = fn(&Value) -> Option<T>;

const IMAGE_URL_TIERS: [Tier<String>; 4] = [
    |body| text_at(body, &["image", "data", "attributes", "formats", "medium", "url"]),
    |body| text_at(body, &["image", "data", "attributes", "url"]),
    |body| text_at(body, &["image", "formats", "medium", "url"]),
    |body| text_at(body, &["image", "url"]),
];

const IMAGE_ALT_TIERS: [Tier<String>; 3] = [
    |body| text_at(body, &["image", "data", "attributes", "alternativeText"]),
    |body| text_at(body, &["image", "alternativeText"]),
    |body| text_at(body, &["title"]),
];

const IMAGE_FORMATS_TIERS: [Tier<Map<String, Value>>; 2] = [
    |body| object_at(body, &["image", "data", "attributes", "formats"]),
    |body| object_at(body, &["image", "formats"]),
];

const RELATION_NAME_TIERS: [Tier<String>; 2] = [
    |item| text_at(item, &["attributes", "name"]),
    |item| text_at(item, &["name"]),
];

const TAG_NAME_TIERS: [Tier<String>; 3] = [
    |item| text_at(item, &["attributes", "name"]),
    |item| text_at(item, &["name"]),
    |item| item.as_str().filter(|name| !name.is_empty()).map(str::to_string),
];

fn first_match<T>(value: &Value, tiers: &[Tier<T>]) -> Option<T> {
    tiers.iter().find_map(|tier| tier(value))
}

fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Non-empty string at `path`. Empty strings fall through to the next tier.
fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    value_at(value, path)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn object_at(value: &Value, path: &[&str]) -> Option<Map<String, Value>> {
    value_at(value, path).and_then(Value::as_object).cloned()
}

fn text_or_default(body: &Value, key: &str) -> String {
    text_at(body, &[key]).unwrap_or_default()
}

fn timestamp(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

fn numeric_id(value: &Value) -> Option<i64> {
    match value.get("id")? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Relation elements, from `field.data[]` first and `field[]` second.
fn relation_items<'a>(body: &'a Value, field: &str) -> &'a [Value] {
    [value_at(body, &[field, "data"]), body.get(field)]
        .into_iter()
        .flatten()
        .find_map(|candidate| candidate.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// The record's field bag: the `attributes` wrapper when present, the record
/// itself otherwise. `None` for anything that is not a JSON object.
fn record_body(raw: &Value) -> Option<&Value> {
    if !raw.is_object() {
        return None;
    }
    match raw.get("attributes") {
        Some(attributes @ Value::Object(_)) => Some(attributes),
        _ => Some(raw),
    }
}

fn status_of(item: &Value, key: &str) -> StatusFlag {
    let raw = value_at(item, &["attributes", key]).or_else(|| item.get(key));
    StatusFlag::from_raw(raw)
}

fn category_ref(item: &Value) -> CategoryRef {
    CategoryRef {
        id: numeric_id(item).map(CategoryId),
        name: first_match(item, &RELATION_NAME_TIERS).unwrap_or_default(),
        active: status_of(item, "category_status").is_active(),
    }
}

/// Rewrites a relative media path onto `media_host`.
///
/// Absolute URLs (any `scheme://` or protocol-relative `//`) pass through and
/// an empty URL stays empty.
pub fn resolve_media_url(url: &str, media_host: &str) -> String {
    if url.is_empty() || has_network_scheme(url) {
        return url.to_string();
    }
    let host = media_host.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{host}{url}")
    } else {
        format!("{host}/{url}")
    }
}

fn has_network_scheme(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    match url.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    media_host: String,
}

impl Normalizer {
    pub fn new(media_host: impl Into<String>) -> Self {
        Self {
            media_host: media_host.into(),
        }
    }

    pub fn project(&self, raw: &Value) -> Option<CanonicalProject> {
        normalize_project(raw, &self.media_host)
    }

    pub fn category(&self, raw: &Value) -> Option<CanonicalCategory> {
        normalize_category(raw)
    }

    pub fn projects(&self, raw: &[Value]) -> Vec<CanonicalProject> {
        raw.iter().filter_map(|item| self.project(item)).collect()
    }

    pub fn categories(&self, raw: &[Value]) -> Vec<CanonicalCategory> {
        raw.iter().filter_map(normalize_category).collect()
    }
}

pub fn normalize_project(raw: &Value, media_host: &str) -> Option<CanonicalProject> {
    let Some(body) = record_body(raw) else {
        debug!("skipping project record that is not an object");
        return None;
    };

    let status = StatusFlag::from_raw(body.get("project_status"));
    if !status.is_active() {
        debug!(id = ?numeric_id(raw), "skipping inactive project");
        return None;
    }

    let image_url = first_match(body, &IMAGE_URL_TIERS).unwrap_or_default();

    Some(CanonicalProject {
        id: numeric_id(raw).map(ProjectId),
        document_id: text_or_default(body, "documentId"),
        title: text_or_default(body, "title"),
        subtitle: text_or_default(body, "subtitle"),
        description: text_or_default(body, "description"),
        view_link: text_or_default(body, "view_link"),
        active: status.is_active(),
        image: ImageRef {
            url: resolve_media_url(&image_url, media_host),
            alt: first_match(body, &IMAGE_ALT_TIERS).unwrap_or_default(),
            formats: first_match(body, &IMAGE_FORMATS_TIERS).unwrap_or_default(),
        },
        categories: relation_items(body, "categories")
            .iter()
            .map(category_ref)
            .collect(),
        tags: relation_items(body, "tags")
            .iter()
            .map(|tag| first_match(tag, &TAG_NAME_TIERS).unwrap_or_default())
            .collect(),
        created_at: timestamp(body, "createdAt"),
        updated_at: timestamp(body, "updatedAt"),
        published_at: timestamp(body, "publishedAt"),
    })
}

pub fn normalize_category(raw: &Value) -> Option<CanonicalCategory> {
    let Some(body) = record_body(raw) else {
        debug!("skipping category record that is not an object");
        return None;
    };

    let status = StatusFlag::from_raw(body.get("category_status"));
    if !status.is_active() {
        debug!(id = ?numeric_id(raw), "skipping inactive category");
        return None;
    }

    Some(CanonicalCategory {
        id: numeric_id(raw).map(CategoryId),
        document_id: text_or_default(body, "documentId"),
        name: text_or_default(body, "name"),
        active: status.is_active(),
        created_at: timestamp(body, "createdAt"),
        updated_at: timestamp(body, "updatedAt"),
        published_at: timestamp(body, "publishedAt"),
    })
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
