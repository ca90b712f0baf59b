//! Resolved deployment targets

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Reference to one addressable unit, e.g. `magpie/3`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitRef(String);

impl UnitRef {
    pub fn new(name: impl Into<String>) -> Self {
        UnitRef(name.into())
    }

    /// Conventional `<app>/<index>` unit name
    pub fn numbered(application: &str, index: usize) -> Self {
        UnitRef(format!("{}/{}", application, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitRef {
    fn from(name: &str) -> Self {
        UnitRef(name.to_string())
    }
}

/// Declared interface of a single action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON-schema style parameter description; only `required` is enforced
    #[serde(default)]
    pub params: JsonValue,
}

impl ActionSchema {
    /// Schema requiring exactly the given parameter names
    pub fn requiring<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let required: Vec<JsonValue> = required
            .into_iter()
            .map(|name| JsonValue::String(name.into()))
            .collect();
        Self {
            description: None,
            params: serde_json::json!({ "type": "object", "required": required }),
        }
    }

    /// Parameter names the action cannot run without
    pub fn required_parameters(&self) -> Vec<&str> {
        self.params
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }
}

/// Actions offered by an application's units, keyed by action name
pub type ActionCatalog = BTreeMap<String, ActionSchema>;

/// The concrete set of units a test's target resolved to.
///
/// Unit order is stable and decides batch assignment. A target group is
/// immutable once resolved for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetGroup {
    pub model_name: Option<String>,
    pub app_name: String,
    pub units: Vec<UnitRef>,
    pub actions: ActionCatalog,
}

impl TargetGroup {
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn offers(&self, action: &str) -> Option<&ActionSchema> {
        self.actions.get(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_parameters() {
        let schema = ActionSchema::requiring(["operation", "iodepth"]);
        assert_eq!(schema.required_parameters(), vec!["operation", "iodepth"]);

        let schema = ActionSchema {
            description: Some("no params".to_string()),
            params: json!({"type": "object", "properties": {"x": {"type": "string"}}}),
        };
        assert!(schema.required_parameters().is_empty());

        assert!(ActionSchema::default().required_parameters().is_empty());
    }

    #[test]
    fn test_unit_ref() {
        let unit = UnitRef::numbered("magpie", 3);
        assert_eq!(unit.as_str(), "magpie/3");
        assert_eq!(serde_json::to_string(&unit).unwrap(), "\"magpie/3\"");
    }
}
