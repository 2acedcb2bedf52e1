//! Form model types produced by the builder.
//!
//! The JSON form of these types is the render contract: keys are camelCase,
//! and empty maps, empty lists and unset optionals are omitted.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::relationship::Relationship;

/// Input type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Map a schema type name. Unknown scalar names fall back to `String`.
    pub fn from_schema_type(schema_type: &str) -> Self {
        match schema_type {
            "integer" => FieldType::Integer,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "array" => FieldType::Array,
            "object" => FieldType::Object,
            _ => FieldType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Array | FieldType::Object)
    }
}

/// Kind of validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationKind {
    Min,
    Max,
    MinLength,
    MaxLength,
    Pattern,
}

/// One validation constraint.
///
/// Numeric thresholds live in `params["value"]` as canonical decimal
/// strings; patterns live in `params["pattern"]` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRule {
    pub kind: ValidationKind,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl ValidationRule {
    pub fn new(kind: ValidationKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// One input in the form tree.
///
/// `nested` is only populated for objects and `items` only for arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Field>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ui_hints: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    /// Object already rendered as a lookup select and retyped to `String`.
    #[serde(skip)]
    pub(crate) lookup: bool,
}

impl Field {
    /// Create a bare field with no attributes set.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            required: false,
            label: String::new(),
            placeholder: None,
            description: None,
            default: None,
            enum_values: Vec::new(),
            nested: Vec::new(),
            items: None,
            validations: Vec::new(),
            metadata: BTreeMap::new(),
            ui_hints: BTreeMap::new(),
            relationship: None,
            lookup: false,
        }
    }

    pub fn ui_hint(&self, key: &str) -> Option<&str> {
        self.ui_hints.get(key).map(String::as_str)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Find a direct child of an object field by name.
    pub fn nested_field(&self, name: &str) -> Option<&Field> {
        self.nested.iter().find(|f| f.name == name)
    }

    pub fn validation(&self, kind: ValidationKind) -> Option<&ValidationRule> {
        self.validations.iter().find(|rule| rule.kind == kind)
    }
}

/// Root of the builder output for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormModel {
    #[serde(rename = "operationID")]
    pub operation_id: String,
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ui_hints: BTreeMap<String, String>,
}

impl FormModel {
    /// Find a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Compact JSON, stable across builds of the same operation.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
