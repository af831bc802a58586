//! Widget type registry
//!
//! Every widget type declares a typed prop schema. Instance props are stored
//! as loose JSON, and the registry resolves them against the declared
//! [`PropKind`]s so editors dispatch on the schema, not on runtime types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{PropError, ValidationIssue};
use crate::model::WidgetInstance;

/// Broad widget grouping used by pickers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    Stats,
    Chart,
    Table,
    List,
    Utility,
}

/// Declared type of a single prop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropKind {
    Text,
    Number { min: Option<f64>, max: Option<f64> },
    Toggle,
    Choice { options: Vec<String> },
}

impl PropKind {
    /// Bounded number
    #[must_use]
    pub fn range(min: f64, max: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Enumerated text
    #[must_use]
    pub fn choice(options: &[&str]) -> Self {
        Self::Choice {
            options: options.iter().map(|o| (*o).to_string()).collect(),
        }
    }

    /// Check a raw value against this kind
    ///
    /// # Errors
    /// Returns a message describing the mismatch.
    pub fn coerce(&self, value: &JsonValue) -> Result<PropValue, String> {
        match (self, value) {
            (Self::Text, JsonValue::String(s)) => Ok(PropValue::Text(s.clone())),
            (Self::Toggle, JsonValue::Bool(b)) => Ok(PropValue::Toggle(*b)),
            (Self::Number { min, max }, JsonValue::Number(n)) => {
                let n = n.as_f64().ok_or_else(|| "number out of range".to_string())?;
                if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                    return Err(format!(
                        "{n} outside [{}, {}]",
                        min.map_or("-inf".into(), |m| m.to_string()),
                        max.map_or("inf".into(), |m| m.to_string()),
                    ));
                }
                Ok(PropValue::Number(n))
            }
            (Self::Choice { options }, JsonValue::String(s)) => {
                if options.iter().any(|o| o == s) {
                    Ok(PropValue::Choice(s.clone()))
                } else {
                    Err(format!("'{s}' is not one of {}", options.join(", ")))
                }
            }
            (kind, other) => Err(format!("expected {} but received {other}", kind.label())),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number { .. } => "number",
            Self::Toggle => "toggle",
            Self::Choice { .. } => "choice",
        }
    }
}

/// A prop value after resolution against its [`PropKind`]
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Toggle(bool),
    Choice(String),
}

/// Declared prop of a widget type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSpec {
    pub key: String,
    pub label: String,
    pub kind: PropKind,
    pub default: JsonValue,
}

impl PropSpec {
    #[must_use]
    pub fn new(key: &str, label: &str, kind: PropKind, default: JsonValue) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            default,
        }
    }
}

/// Widget type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetTypeDef {
    pub id: String,
    pub name: String,
    pub category: WidgetCategory,
    /// Roles allowed to see this type; empty means public
    #[serde(default)]
    pub permissions: Vec<String>,
    pub props: Vec<PropSpec>,
}

impl WidgetTypeDef {
    #[must_use]
    pub fn new(id: &str, name: &str, category: WidgetCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            permissions: Vec::new(),
            props: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_prop(mut self, spec: PropSpec) -> Self {
        self.props.push(spec);
        self
    }

    #[must_use]
    pub fn restricted_to(mut self, roles: &[&str]) -> Self {
        self.permissions = roles.iter().map(|r| (*r).to_string()).collect();
        self
    }

    /// Default props as stored on a new instance
    #[must_use]
    pub fn default_props(&self) -> BTreeMap<String, JsonValue> {
        self.props
            .iter()
            .map(|spec| (spec.key.clone(), spec.default.clone()))
            .collect()
    }
}

/// Props of one instance, typed and default-filled
pub type ResolvedProps = BTreeMap<String, PropValue>;

/// Registry of known widget types
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    types: BTreeMap<String, WidgetTypeDef>,
}

impl WidgetRegistry {
    /// Empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in widget catalog
    #[must_use]
    pub fn with_defaults() -> Self {
        let title = |default: &str| PropSpec::new("title", "Title", PropKind::Text, json!(default));
        let mut registry = Self::new();

        registry.register(
            WidgetTypeDef::new("stats-card", "Stats Card", WidgetCategory::Stats)
                .with_prop(title("Metric"))
                .with_prop(PropSpec::new("value", "Value", PropKind::Text, json!("0")))
                .with_prop(PropSpec::new(
                    "trend",
                    "Trend",
                    PropKind::choice(&["up", "down", "flat"]),
                    json!("flat"),
                ))
                .with_prop(PropSpec::new("showTrend", "Show trend", PropKind::Toggle, json!(true))),
        );
        registry.register(
            WidgetTypeDef::new("line-chart", "Line Chart", WidgetCategory::Chart)
                .with_prop(title("Trend"))
                .with_prop(PropSpec::new("rangeDays", "Range (days)", PropKind::range(1.0, 365.0), json!(30)))
                .with_prop(PropSpec::new("smooth", "Smooth lines", PropKind::Toggle, json!(true))),
        );
        registry.register(
            WidgetTypeDef::new("bar-chart", "Bar Chart", WidgetCategory::Chart)
                .with_prop(title("Breakdown"))
                .with_prop(PropSpec::new("rangeDays", "Range (days)", PropKind::range(1.0, 365.0), json!(30)))
                .with_prop(PropSpec::new("stacked", "Stacked", PropKind::Toggle, json!(false))),
        );
        registry.register(
            WidgetTypeDef::new("recent-activity", "Recent Activity", WidgetCategory::List)
                .with_prop(title("Recent Activity"))
                .with_prop(PropSpec::new("limit", "Items", PropKind::range(1.0, 50.0), json!(5))),
        );
        registry.register(
            WidgetTypeDef::new("user-table", "User Table", WidgetCategory::Table)
                .restricted_to(&["manager"])
                .with_prop(title("Users"))
                .with_prop(PropSpec::new("pageSize", "Page size", PropKind::range(5.0, 100.0), json!(10))),
        );
        registry.register(
            WidgetTypeDef::new("system-health", "System Health", WidgetCategory::Stats)
                .restricted_to(&["admin"])
                .with_prop(PropSpec::new(
                    "refreshSeconds",
                    "Refresh (s)",
                    PropKind::range(5.0, 3600.0),
                    json!(30),
                )),
        );
        registry.register(
            WidgetTypeDef::new("quick-actions", "Quick Actions", WidgetCategory::Utility)
                .with_prop(title("Quick Actions"))
                .with_prop(PropSpec::new("columns", "Columns", PropKind::range(1.0, 4.0), json!(2))),
        );
        registry.register(
            WidgetTypeDef::new("notes", "Notes", WidgetCategory::Utility)
                .with_prop(title("Notes"))
                .with_prop(PropSpec::new("content", "Content", PropKind::Text, json!(""))),
        );
        registry
    }

    /// Register or replace a widget type
    pub fn register(&mut self, def: WidgetTypeDef) {
        self.types.insert(def.id.clone(), def);
    }

    #[inline]
    #[must_use]
    pub fn get(&self, widget_id: &str) -> Option<&WidgetTypeDef> {
        self.types.get(widget_id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, widget_id: &str) -> bool {
        self.types.contains_key(widget_id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate definitions ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &WidgetTypeDef> {
        self.types.values()
    }

    /// New instance of a registered type, carrying its default props
    ///
    /// # Errors
    /// Fails if the type is unknown.
    pub fn instantiate(
        &self,
        instance_id: impl Into<String>,
        widget_id: &str,
        position: crate::model::WidgetPosition,
    ) -> Result<WidgetInstance, PropError> {
        let def = self
            .get(widget_id)
            .ok_or_else(|| PropError::UnknownWidgetType(widget_id.to_string()))?;
        let mut instance = WidgetInstance::new(instance_id, widget_id, position);
        instance.props = def.default_props();
        Ok(instance)
    }

    /// Resolve an instance's props against its declared schema
    ///
    /// Missing props take the declared default; props with no declaration
    /// are ignored.
    ///
    /// # Errors
    /// Fails on an unknown widget type or the first mismatching prop.
    pub fn resolve_props(&self, instance: &WidgetInstance) -> Result<ResolvedProps, PropError> {
        let def = self
            .get(&instance.widget_id)
            .ok_or_else(|| PropError::UnknownWidgetType(instance.widget_id.clone()))?;

        let mut resolved = BTreeMap::new();
        for spec in &def.props {
            let raw = instance.props.get(&spec.key).unwrap_or(&spec.default);
            let value = spec.kind.coerce(raw).map_err(|message| PropError::InvalidProp {
                key: spec.key.clone(),
                message,
            })?;
            resolved.insert(spec.key.clone(), value);
        }
        Ok(resolved)
    }

    /// Every prop problem of an instance, as validation issues under `path`
    #[must_use]
    pub fn check_instance(&self, instance: &WidgetInstance, path: &str) -> Vec<ValidationIssue> {
        let Some(def) = self.get(&instance.widget_id) else {
            return vec![ValidationIssue::new(
                format!("{path}.widgetId"),
                format!("Unknown widget type '{}'", instance.widget_id),
            )];
        };
        def.props
            .iter()
            .filter_map(|spec| {
                let raw = instance.props.get(&spec.key)?;
                spec.kind
                    .coerce(raw)
                    .err()
                    .map(|message| ValidationIssue::new(format!("{path}.props.{}", spec.key), message))
            })
            .collect()
    }
}
