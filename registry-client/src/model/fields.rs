//! Required-field lookups over raw registry JSON.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use crate::error::RegistryError;
use crate::model::timestamp::parse_iso8601;

/// Where a field sits in the document, for error messages.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Site<'a> {
    Node(&'a str),
    Service { node: &'a str, service: &'a str },
}

impl Site<'_> {
    pub(crate) fn error(&self, field: &str, detail: impl Into<String>) -> RegistryError {
        match *self {
            Site::Node(node) => RegistryError::MalformedNode {
                node: node.to_string(),
                field: field.to_string(),
                detail: detail.into(),
            },
            Site::Service { node, service } => RegistryError::MalformedService {
                node: node.to_string(),
                service: service.to_string(),
                field: field.to_string(),
                detail: detail.into(),
            },
        }
    }
}

pub(crate) fn as_object<'v>(
    value: &'v Value,
    site: Site<'_>,
    field: &str,
) -> Result<&'v Map<String, Value>, RegistryError> {
    value
        .as_object()
        .ok_or_else(|| site.error(field, format!("expected an object, found {}", kind(value))))
}

pub(crate) fn required<'v>(
    obj: &'v Map<String, Value>,
    site: Site<'_>,
    field: &str,
) -> Result<&'v Value, RegistryError> {
    obj.get(field).ok_or_else(|| site.error(field, "missing"))
}

pub(crate) fn string(
    obj: &Map<String, Value>,
    site: Site<'_>,
    field: &str,
) -> Result<String, RegistryError> {
    let value = required(obj, site, field)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| site.error(field, format!("expected a string, found {}", kind(value))))
}

pub(crate) fn array<'v>(
    obj: &'v Map<String, Value>,
    site: Site<'_>,
    field: &str,
) -> Result<&'v [Value], RegistryError> {
    let value = required(obj, site, field)?;
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| site.error(field, format!("expected an array, found {}", kind(value))))
}

pub(crate) fn strings(
    obj: &Map<String, Value>,
    site: Site<'_>,
    field: &str,
) -> Result<Vec<String>, RegistryError> {
    array(obj, site, field)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| site.error(field, format!("expected strings, found {}", kind(item))))
        })
        .collect()
}

pub(crate) fn timestamp(
    obj: &Map<String, Value>,
    site: Site<'_>,
    field: &str,
) -> Result<DateTime<Utc>, RegistryError> {
    let raw = string(obj, site, field)?;
    parse_iso8601(&raw).ok_or_else(|| site.error(field, format!("'{raw}' is not an ISO-8601 timestamp")))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
