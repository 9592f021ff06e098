//! Feature records and the table schemas they are written under

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Columns of the activation survey table.
pub const ACTIVATION_HEADERS: [&str; 7] = [
    "Repo Name",
    "Docker",
    "UVX",
    "NPX",
    "Filesystem Access",
    "Credentials",
    "Example Activation Command(s)",
];

/// Columns of the full repository report table.
pub const FULL_HEADERS: [&str; 13] = [
    "Repo Name",
    "Description",
    "Stars",
    "Forks",
    "Docker",
    "UVX",
    "NPX",
    "Filesystem Access",
    "Credentials",
    "License",
    "Example Activation Command(s)",
    "Readme",
    "Tools",
];

/// Result of extracting one entry.
///
/// Three shapes are accepted: a row already aligned to the header, a map
/// keyed by field name, or a typed record reduced to its JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRecord {
    Row(Vec<String>),
    Map(BTreeMap<String, String>),
    Record(Map<String, Value>),
}

impl FeatureRecord {
    /// Reduces any serializable struct to its field-name/value pairs.
    pub fn from_typed<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(FeatureRecord::Record(fields)),
            other => Err(serde::ser::Error::custom(format!(
                "expected a struct, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn has_keyed_view(&self) -> bool {
        !matches!(self, FeatureRecord::Row(_))
    }

    /// Value of `key` rendered as a table cell, if the record has a keyed view
    /// and the field is present.
    pub fn field(&self, key: &str) -> Option<String> {
        match self {
            FeatureRecord::Row(_) => None,
            FeatureRecord::Map(map) => map.get(key).cloned(),
            FeatureRecord::Record(fields) => fields.get(key).map(cell_text),
        }
    }
}

impl From<Vec<String>> for FeatureRecord {
    fn from(row: Vec<String>) -> Self {
        FeatureRecord::Row(row)
    }
}

impl From<BTreeMap<String, String>> for FeatureRecord {
    fn from(map: BTreeMap<String, String>) -> Self {
        FeatureRecord::Map(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Renders a JSON value as CSV cell text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join("\n"),
        Value::Object(_) => value.to_string(),
    }
}

/// Features behind [`ACTIVATION_HEADERS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationFeatureRow {
    pub repo_name: String,
    pub docker: String,
    pub uvx: String,
    pub npx: String,
    pub filesystem_access: String,
    pub credentials: String,
    pub example_activation_commands: String,
}

/// Features behind [`FULL_HEADERS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullFeatureRow {
    pub repo_name: String,
    pub description: String,
    pub license: String,
    pub stars: u64,
    pub forks: u64,
    pub docker: String,
    pub uvx: String,
    pub npx: String,
    pub filesystem_access: String,
    pub credentials: String,
    pub example_activation_commands: String,
    pub readme: String,
    pub tools: String,
}

/// Which table a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeatureSchema {
    #[default]
    Activation,
    Full,
}

impl FeatureSchema {
    pub fn header(&self) -> Vec<String> {
        let columns: &[&str] = match self {
            FeatureSchema::Activation => &ACTIVATION_HEADERS,
            FeatureSchema::Full => &FULL_HEADERS,
        };
        columns.iter().map(|c| c.to_string()).collect()
    }

    /// Validates model output against the typed row and reduces it to a record.
    pub fn parse(&self, value: Value) -> Result<FeatureRecord, serde_json::Error> {
        match self {
            FeatureSchema::Activation => {
                FeatureRecord::from_typed(&serde_json::from_value::<ActivationFeatureRow>(value)?)
            }
            FeatureSchema::Full => {
                FeatureRecord::from_typed(&serde_json::from_value::<FullFeatureRow>(value)?)
            }
        }
    }

    /// Field names of the typed row, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        match self {
            FeatureSchema::Activation => vec![
                "repo_name",
                "docker",
                "uvx",
                "npx",
                "filesystem_access",
                "credentials",
                "example_activation_commands",
            ],
            FeatureSchema::Full => vec![
                "repo_name",
                "description",
                "license",
                "stars",
                "forks",
                "docker",
                "uvx",
                "npx",
                "filesystem_access",
                "credentials",
                "example_activation_commands",
                "readme",
                "tools",
            ],
        }
    }

    /// JSON Schema of the typed row, advertised to the model.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.field_names() {
            let kind = match field {
                "stars" | "forks" => "integer",
                _ => "string",
            };
            properties.insert(field.to_string(), json!({ "type": kind }));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names(),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSchema::Activation => "activation",
            FeatureSchema::Full => "full",
        }
    }
}

impl std::str::FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activation" => Ok(FeatureSchema::Activation),
            "full" => Ok(FeatureSchema::Full),
            other => Err(format!(
                "Invalid schema: {}. Valid options: activation, full",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_typed_keeps_field_names() {
        let row = ActivationFeatureRow {
            repo_name: "acme/server".to_string(),
            docker: "yes".to_string(),
            ..Default::default()
        };
        let record = FeatureRecord::from_typed(&row).unwrap();

        assert!(record.has_keyed_view());
        assert_eq!(record.field("repo_name").as_deref(), Some("acme/server"));
        assert_eq!(record.field("docker").as_deref(), Some("yes"));
        assert_eq!(record.field("uvx").as_deref(), Some(""));
        assert!(record.field("license").is_none());
    }

    #[test]
    fn test_from_typed_rejects_non_struct() {
        assert!(FeatureRecord::from_typed(&vec!["a", "b"]).is_err());
        assert!(FeatureRecord::from_typed(&7).is_err());
    }

    #[test]
    fn test_row_has_no_keyed_view() {
        let record = FeatureRecord::from(vec!["x".to_string()]);
        assert!(!record.has_keyed_view());
        assert!(record.field("repo_name").is_none());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!(false)), "false");
        assert_eq!(cell_text(&json!(["read_file", "write_file"])), "read_file\nwrite_file");
        assert_eq!(cell_text(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_field_names_match_serialized_rows() {
        let activation = FeatureRecord::from_typed(&ActivationFeatureRow::default()).unwrap();
        let full = FeatureRecord::from_typed(&FullFeatureRow::default()).unwrap();

        for (schema, record) in [
            (FeatureSchema::Activation, activation),
            (FeatureSchema::Full, full),
        ] {
            let FeatureRecord::Record(fields) = record else {
                panic!("expected a typed record");
            };
            let mut expected: Vec<&str> = schema.field_names();
            let mut actual: Vec<&str> = fields.keys().map(|k| k.as_str()).collect();
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_parse_full_schema() {
        let record = FeatureSchema::Full
            .parse(json!({
                "repo_name": "acme/server",
                "description": "d",
                "license": "MIT",
                "stars": 12,
                "forks": 1,
                "docker": "no",
                "uvx": "yes",
                "npx": "no",
                "filesystem_access": "no",
                "credentials": "API_KEY",
                "example_activation_commands": "uvx acme-server",
                "readme": "",
                "tools": "search"
            }))
            .unwrap();
        assert_eq!(record.field("stars").as_deref(), Some("12"));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(FeatureSchema::Activation
            .parse(json!({"repo_name": "acme/server"}))
            .is_err());
    }

    #[test]
    fn test_json_schema_lists_required_fields() {
        let schema = FeatureSchema::Full.json_schema();
        assert_eq!(schema["properties"]["stars"]["type"], "integer");
        assert_eq!(schema["required"].as_array().unwrap().len(), 13);
    }

    #[test]
    fn test_schema_from_str() {
        assert_eq!("full".parse::<FeatureSchema>(), Ok(FeatureSchema::Full));
        assert_eq!(
            "Activation".parse::<FeatureSchema>(),
            Ok(FeatureSchema::Activation)
        );
        assert!("csv".parse::<FeatureSchema>().is_err());
    }
}
