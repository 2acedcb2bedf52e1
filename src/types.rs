//! Build options and shared constants for form model compilation.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::labeler::{Labeler, TitleCaseLabeler};

/// Vendor extension blocks whose nested keys are flattened into dotted metadata.
///
/// Later entries win on collision, so `x-formgen` overrides `x-admin`.
pub const NAMESPACE_EXTENSIONS: &[&str] = &["x-admin", "x-ui", "x-formgen"];

/// Metadata keys that renderers consume directly as UI hints.
///
/// Anything outside this list stays metadata-only.
pub const UI_HINT_KEYS: &[&str] = &[
    "placeholder",
    "label",
    "hint",
    "helpText",
    "inputType",
    "widget",
    "cssClass",
    "cardinality",
    "input",
    "collectionRenderer",
    "layout.section",
    "layout.group",
    "layout.order",
    "layout.width",
    "layout.span",
    "layout.column",
];

/// Default `inputType` hint per schema `format`.
pub const FORMAT_INPUT_TYPES: &[(&str, &str)] = &[
    ("date", "date"),
    ("date-time", "datetime-local"),
    ("time", "time"),
    ("email", "email"),
    ("uri", "url"),
    ("url", "url"),
    ("password", "password"),
    ("binary", "file"),
    ("color", "color"),
];

/// Look up the default `inputType` for a schema format.
pub fn format_input_type(format: &str) -> Option<&'static str> {
    FORMAT_INPUT_TYPES
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, input)| *input)
}

/// Returns the JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options for building a form model.
#[derive(Clone)]
pub struct BuildOptions {
    /// Produces human labels from field names.
    pub labeler: Arc<dyn Labeler>,
    /// When true, `format` drives a default `inputType` hint.
    /// Defaults to true.
    pub format_hints: bool,
}

impl BuildOptions {
    /// Create options with the title-case labeler and format hints enabled.
    pub fn new() -> Self {
        Self {
            labeler: Arc::new(TitleCaseLabeler),
            format_hints: true,
        }
    }

    /// Replace the labeler.
    pub fn with_labeler(mut self, labeler: impl Labeler + 'static) -> Self {
        self.labeler = Arc::new(labeler);
        self
    }

    /// Enable or disable format-derived `inputType` hints.
    pub fn format_hints(mut self, enabled: bool) -> Self {
        self.format_hints = enabled;
        self
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("labeler", &"<dyn Labeler>")
            .field("format_hints", &self.format_hints)
            .finish()
    }
}
