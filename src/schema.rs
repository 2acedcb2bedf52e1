//! Schema intermediate representation.
//!
//! A [`Schema`] is one normalized schema node: `$ref`s are either inlined or
//! left as stubs, `allOf` is merged away, and vendor extensions are kept raw.
//! The tree is finite even for cyclic source documents because the resolver
//! breaks cycles with reference stubs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

/// One resolved schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub required: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_minimum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// JSON pointer of a reference that was not expanded.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Raw `x-*` vendor extensions, keyed by their full name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
}

impl Schema {
    /// Create a stub that only remembers its reference pointer.
    pub fn reference_stub(pointer: impl Into<String>) -> Self {
        Self {
            reference: Some(pointer.into()),
            ..Self::default()
        }
    }

    /// Create a schema of the given type.
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Self::default()
        }
    }

    /// True for a reference that carries no resolved type or properties.
    ///
    /// Stubs must never be expanded further.
    pub fn is_reference_stub(&self) -> bool {
        self.reference.is_some() && self.schema_type.is_none() && self.properties.is_empty()
    }

    /// Declared type, falling back to what an untyped schema implies.
    ///
    /// Untyped schemas with `items` are arrays, untyped leaves take their
    /// inferred scalar type, and everything else is an object.
    pub fn effective_type(&self) -> &str {
        if let Some(declared) = self.schema_type.as_deref() {
            return declared;
        }
        if self.items.is_some() {
            return "array";
        }
        self.inferred_scalar_type().unwrap_or("object")
    }

    pub fn is_array(&self) -> bool {
        self.effective_type() == "array"
    }

    pub fn is_object_like(&self) -> bool {
        self.effective_type() == "object"
    }

    /// Scalar type implied by an untyped leaf.
    ///
    /// Returns `None` when the schema has a declared type or has properties.
    pub fn inferred_scalar_type(&self) -> Option<&'static str> {
        if self.schema_type.is_some() || !self.properties.is_empty() || self.items.is_some() {
            return None;
        }
        if let Some(first) = self.enum_values.first() {
            return Some(match first {
                Value::Bool(_) => "boolean",
                Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
                Value::Number(_) => "number",
                _ => "string",
            });
        }
        if self.format.is_some()
            || self.pattern.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
        {
            return Some("string");
        }
        if self.minimum.is_some() || self.maximum.is_some() {
            return Some("number");
        }
        None
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.contains(property)
    }

    /// Fold a composition branch into this schema.
    ///
    /// Scalar keywords keep the first value written, `required` and
    /// `properties` are unioned with local keys winning, and bounds, enum,
    /// items and extensions are only filled when unset here.
    pub fn merge_branch(&mut self, branch: &Schema) {
        fill(&mut self.schema_type, &branch.schema_type);
        fill(&mut self.format, &branch.format);
        fill(&mut self.description, &branch.description);
        fill(&mut self.default, &branch.default);
        fill(&mut self.pattern, &branch.pattern);

        self.required.extend(branch.required.iter().cloned());
        for (name, property) in &branch.properties {
            self.properties
                .entry(name.clone())
                .or_insert_with(|| property.clone());
        }

        if self.minimum.is_none() && branch.minimum.is_some() {
            self.minimum = branch.minimum;
            self.exclusive_minimum = branch.exclusive_minimum;
        }
        if self.maximum.is_none() && branch.maximum.is_some() {
            self.maximum = branch.maximum;
            self.exclusive_maximum = branch.exclusive_maximum;
        }
        fill(&mut self.min_length, &branch.min_length);
        fill(&mut self.max_length, &branch.max_length);

        if self.enum_values.is_empty() {
            self.enum_values = branch.enum_values.clone();
        }
        if self.items.is_none() {
            self.items = branch.items.clone();
        }
        fill(&mut self.reference, &branch.reference);

        for (key, value) in &branch.extensions {
            self.extensions
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}
