// SPDX-License-Identifier: MIT

//! Output schema definitions
//!
//! A lightweight JSON-Schema subset describing what a step is expected to
//! return. Schemas are written in process definitions as a flat mapping from
//! field name to field description:
//!
//! ```yaml
//! score:
//!   type: number
//!   required: true
//!   minimum: 0
//!   maximum: 100
//! severity:
//!   type: string
//!   enum: [low, medium, high]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Declared shape of a step's output object
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputSchema {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldSchema>,
}

/// Definition of a single output field
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Nested fields for `object`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldSchema>>,
    /// Element shape for `array`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Supported field types
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// A single mismatch between an output and its schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// What to do when a step output violates its schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Skip validation entirely
    Ignore,
    /// Log violations and continue
    #[default]
    Warn,
    /// Fail the step
    Enforce,
}

impl FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" | "off" => Ok(SchemaPolicy::Ignore),
            "warn" => Ok(SchemaPolicy::Warn),
            "enforce" | "strict" => Ok(SchemaPolicy::Enforce),
            other => Err(format!("Unknown schema policy: {}", other)),
        }
    }
}

impl OutputSchema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate an output object against [`to_json_schema`](Self::to_json_schema),
    /// returning every violation found
    pub fn validate(&self, output: &Value) -> Vec<SchemaViolation> {
        if self.fields.is_empty() {
            return Vec::new();
        }

        let schema = self.to_json_schema();
        let validator = match jsonschema::validator_for(&schema) {
            Ok(validator) => validator,
            Err(e) => {
                return vec![SchemaViolation {
                    path: "$".to_string(),
                    message: format!("output schema does not compile: {}", e),
                }]
            }
        };

        validator
            .iter_errors(output)
            .map(|error| SchemaViolation {
                path: display_path(&error.instance_path.to_string()),
                message: error.to_string(),
            })
            .collect()
    }

    /// Render as a standard JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        object_schema(&self.fields)
    }

    /// Build a placeholder output that satisfies this schema
    pub fn sample(&self) -> Value {
        sample_object(&self.fields)
    }
}

/// Turn a JSON pointer such as `/tags/1` into `tags[1]`; the root is `$`
fn display_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.parse::<usize>().is_ok() {
            path.push_str(&format!("[{}]", segment));
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }
    if path.is_empty() {
        "$".to_string()
    } else {
        path
    }
}

fn object_schema(fields: &BTreeMap<String, FieldSchema>) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, field)| (name.clone(), field_schema(field)))
        .collect();
    let required: Vec<&String> = fields
        .iter()
        .filter(|(_, f)| f.required)
        .map(|(name, _)| name)
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn field_schema(field: &FieldSchema) -> Value {
    let mut schema = match (&field.properties, &field.items) {
        (Some(props), _) if field.field_type == FieldType::Object => object_schema(props),
        (_, Some(items)) if field.field_type == FieldType::Array => {
            json!({"type": "array", "items": field_schema(items)})
        }
        _ => json!({"type": field.field_type.as_str()}),
    };

    if let Some(allowed) = &field.allowed {
        schema["enum"] = json!(allowed);
    }
    if let Some(min) = field.minimum {
        schema["minimum"] = json!(min);
    }
    if let Some(max) = field.maximum {
        schema["maximum"] = json!(max);
    }
    if let Some(desc) = &field.description {
        schema["description"] = json!(desc);
    }
    schema
}

fn sample_object(fields: &BTreeMap<String, FieldSchema>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, field)| (name.clone(), sample_value(name, field)))
            .collect(),
    )
}

fn sample_value(name: &str, field: &FieldSchema) -> Value {
    if let Some(first) = field.allowed.as_ref().and_then(|a| a.first()) {
        return first.clone();
    }

    match field.field_type {
        FieldType::String => Value::String(format!("<{}>", name)),
        FieldType::Number => json!(field.maximum.or(field.minimum).unwrap_or(0.0)),
        FieldType::Integer => json!(field.maximum.or(field.minimum).unwrap_or(0.0) as i64),
        FieldType::Boolean => Value::Bool(true),
        FieldType::Array => Value::Array(vec![]),
        FieldType::Object => match &field.properties {
            Some(props) => sample_object(props),
            None => Value::Object(Map::new()),
        },
    }
}
