//! Wire schema projection
//!
//! The schema embedded in writable links, and used by the HTML forms to pick
//! an input per field.

use crate::core::doc_type::{DocKind, DocType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// JSON-Schema-like description of a [`DocType`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, JsonSchema>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<JsonSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl JsonSchema {
    fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            properties: IndexMap::new(),
            additional_properties: None,
            items: None,
            title: None,
        }
    }
}

impl DocType {
    /// Project this descriptor onto a wire schema
    pub fn to_json_schema(&self) -> JsonSchema {
        match self.kind {
            DocKind::String | DocKind::Key => JsonSchema::typed("string"),
            DocKind::Bool => JsonSchema::typed("boolean"),
            DocKind::Integer | DocKind::Duration | DocKind::Countdown => {
                JsonSchema::typed("integer")
            }
            DocKind::Number => JsonSchema::typed("number"),
            DocKind::Time => JsonSchema::typed("datetime"),
            DocKind::Struct => {
                let mut schema = JsonSchema::typed("object");
                for field in &self.fields {
                    let mut property = field.doc_type.to_json_schema();
                    property.title = Some(field.name.clone());
                    schema.properties.insert(field.name.clone(), property);
                }
                schema
            }
            DocKind::Slice => {
                let mut schema = JsonSchema::typed("array");
                schema.items = self.elem.as_ref().map(|e| Box::new(e.to_json_schema()));
                schema
            }
            DocKind::Map => {
                let mut schema = JsonSchema::typed("object");
                schema.additional_properties =
                    self.value.as_ref().map(|v| Box::new(v.to_json_schema()));
                schema
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::Key;
    use crate::impl_describe;
    use axum::http::Method as HttpMethod;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Score;
    impl_describe!(Score {
        "Points": f64 [POST],
    });

    struct Player;
    impl_describe!(Player {
        "ID": Key,
        "Nick": String [POST, PUT],
        "Joined": DateTime<Utc> [POST],
        "Scores": Vec<Score> [POST],
        "Flags": BTreeMap<String, bool> [POST],
        "Ready": bool [PUT],
    });

    #[test]
    fn test_struct_schema() {
        let schema = DocType::of::<Player>(&HttpMethod::POST)
            .unwrap()
            .to_json_schema();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "Nick": {"type": "string", "title": "Nick"},
                    "Joined": {"type": "datetime", "title": "Joined"},
                    "Scores": {
                        "type": "array",
                        "title": "Scores",
                        "items": {
                            "type": "object",
                            "properties": {
                                "Points": {"type": "number", "title": "Points"}
                            }
                        }
                    },
                    "Flags": {
                        "type": "object",
                        "title": "Flags",
                        "additionalProperties": {"type": "boolean"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_properties_follow_declaration_order() {
        let schema = DocType::of::<Player>(&HttpMethod::GET)
            .unwrap()
            .to_json_schema();
        let keys: Vec<_> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ID", "Nick", "Joined", "Scores", "Flags", "Ready"]);
        assert_eq!(schema.properties["ID"].schema_type, "string");
    }

    #[test]
    fn test_empty_struct_omits_properties() {
        let schema = DocType::of::<Player>(&HttpMethod::DELETE)
            .unwrap()
            .to_json_schema();
        assert_eq!(serde_json::to_value(&schema).unwrap(), json!({"type": "object"}));
    }
}
