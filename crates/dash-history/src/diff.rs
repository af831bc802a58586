//! Structural diff between configuration documents
//!
//! Objects are compared key by key and recursed into. Arrays and scalars
//! are compared as whole values, so a change anywhere inside a widget list
//! is reported once at the list's path.

use std::fmt;

use dash_schema::TenantConfig;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::HistoryResult;

/// One differing path between two documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigChange {
    /// Dotted path, empty for the document root
    pub path: String,
    /// Value in the first document; `None` when absent there
    pub before: Option<JsonValue>,
    /// Value in the second document; `None` when absent there
    pub after: Option<JsonValue>,
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<JsonValue>| v.as_ref().map_or_else(|| "(absent)".to_string(), ToString::to_string);
        write!(f, "{}: {} -> {}", self.path, show(&self.before), show(&self.after))
    }
}

/// Every path where `a` and `b` differ
///
/// Keys of `a` come first in its order, then keys only `b` has.
#[must_use]
pub fn compare_versions(a: &JsonValue, b: &JsonValue) -> Vec<ConfigChange> {
    let mut changes = Vec::new();
    match (a, b) {
        (JsonValue::Object(a), JsonValue::Object(b)) => diff_objects(a, b, "", &mut changes),
        _ if a != b => changes.push(ConfigChange {
            path: String::new(),
            before: Some(a.clone()),
            after: Some(b.clone()),
        }),
        _ => {}
    }
    changes
}

/// Diff two typed configurations
///
/// # Errors
/// Fails if either configuration cannot be serialized.
pub fn compare_configs(a: &TenantConfig, b: &TenantConfig) -> HistoryResult<Vec<ConfigChange>> {
    Ok(compare_versions(&serde_json::to_value(a)?, &serde_json::to_value(b)?))
}

fn diff_objects(
    a: &Map<String, JsonValue>,
    b: &Map<String, JsonValue>,
    prefix: &str,
    changes: &mut Vec<ConfigChange>,
) {
    let keys = a.keys().chain(b.keys().filter(|k| !a.contains_key(*k)));
    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match (a.get(key), b.get(key)) {
            (Some(JsonValue::Object(x)), Some(JsonValue::Object(y))) => {
                diff_objects(x, y, &path, changes);
            }
            (before, after) if before != after => changes.push(ConfigChange {
                path,
                before: before.cloned(),
                after: after.cloned(),
            }),
            _ => {}
        }
    }
}
