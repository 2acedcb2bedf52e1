//! Vendor extension decoding.
//!
//! Raw `x-*` payloads are arbitrary JSON. This module is the only place that
//! inspects them: everything downstream sees a flat map of dotted keys to
//! canonical strings.
//!
//! # Recognized blocks
//!
//! | Extension | Metadata keys |
//! |-----------|---------------|
//! | `x-relationship` | `relationship.type`, `.target`, `.foreignKey`, `.cardinality`, `.inverse`, `.sourceField` |
//! | `x-endpoint` | `relationship.endpoint.*`, including `params`/`dynamicParams`/`mapping`/`auth` groups |
//! | `x-current-value` | `relationship.current` |
//! | `x-formgen`, `x-admin`, `x-ui` | nested keys flattened with dots |
//! | any other `x-<name>` | `<name>` in lowerCamelCase |

use std::collections::{BTreeMap, BTreeSet};

use heck::ToLowerCamelCase;
use serde_json::{Map, Value};

use crate::types::{json_type_name, NAMESPACE_EXTENSIONS, UI_HINT_KEYS};

pub const RELATIONSHIP_EXTENSION: &str = "x-relationship";
pub const ENDPOINT_EXTENSION: &str = "x-endpoint";
pub const CURRENT_VALUE_EXTENSION: &str = "x-current-value";

pub const META_REF: &str = "$ref";
pub const META_RELATIONSHIP_TYPE: &str = "relationship.type";
pub const META_RELATIONSHIP_TARGET: &str = "relationship.target";
pub const META_RELATIONSHIP_FOREIGN_KEY: &str = "relationship.foreignKey";
pub const META_RELATIONSHIP_CARDINALITY: &str = "relationship.cardinality";
pub const META_RELATIONSHIP_INVERSE: &str = "relationship.inverse";
pub const META_RELATIONSHIP_SOURCE_FIELD: &str = "relationship.sourceField";
pub const META_RELATIONSHIP_CURRENT: &str = "relationship.current";
pub const META_ENDPOINT_PREFIX: &str = "relationship.endpoint.";
pub const META_ENDPOINT_REFRESH_ON: &str = "relationship.endpoint.refreshOn";
pub const META_ENDPOINT_RENDERER: &str = "relationship.endpoint.renderer";

/// Endpoint sub-objects whose keys are kept verbatim under their group.
const ENDPOINT_GROUPS: &[&str] = &["params", "dynamicParams", "mapping", "auth"];

/// Namespace keys that belong to the endpoint block.
const NAMESPACE_ENDPOINT_KEYS: &[&str] = &["labelField", "valueField"];

/// Collect the raw `x-*` keys of a schema or operation object.
pub fn extract_extensions(map: &Map<String, Value>) -> BTreeMap<String, Value> {
    map.iter()
        .filter(|(key, _)| key.starts_with("x-"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Decode raw extensions into flat metadata.
///
/// Plain vendor keys are written first, then namespace blocks, then the
/// dedicated relationship, endpoint and current-value blocks, each phase
/// overriding the previous one. Malformed payloads are skipped.
pub fn decode(extensions: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    for (key, value) in extensions {
        if is_structured_extension(key) {
            continue;
        }
        let Some(name) = key.strip_prefix("x-") else {
            continue;
        };
        if let Some(text) = canonical_string(value) {
            metadata.insert(normalize_key(name), text);
        }
    }

    for namespace in NAMESPACE_EXTENSIONS {
        match extensions.get(*namespace) {
            Some(Value::Object(block)) => decode_namespace(block, &mut metadata),
            Some(other) => skip_malformed(namespace, "object", other),
            None => {}
        }
    }

    if let Some(value) = extensions.get(RELATIONSHIP_EXTENSION) {
        decode_relationship(value, &mut metadata);
    }
    if let Some(value) = extensions.get(ENDPOINT_EXTENSION) {
        decode_endpoint(value, &mut metadata);
    }
    if let Some(value) = extensions.get(CURRENT_VALUE_EXTENSION) {
        decode_current_value(value, &mut metadata);
    }

    metadata
}

/// Keep only the allow-listed UI hint keys.
pub fn filter_ui_hints(metadata: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    metadata
        .iter()
        .filter(|(key, _)| UI_HINT_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// True when any `relationship.endpoint.*` key is present.
pub fn has_endpoint(metadata: &BTreeMap<String, String>) -> bool {
    metadata
        .keys()
        .any(|key| key.starts_with(META_ENDPOINT_PREFIX))
}

/// Render a JSON leaf as a canonical metadata string.
///
/// Strings pass through, booleans become `true`/`false`, numbers use their
/// shortest decimal form, and composites are serialized as JSON. Null has
/// no string form.
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format_decimal(f),
            _ => n.to_string(),
        }),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}

/// Shortest decimal form of a float: `60.0` is `60`, `0.5` is `0.5`.
pub(crate) fn format_decimal(value: f64) -> String {
    value.to_string()
}

/// Normalize an extension key to lowerCamelCase, segment by segment.
///
/// `label-field` and `label_field` both become `labelField`;
/// `layout.section-name` becomes `layout.sectionName`.
pub fn normalize_key(key: &str) -> String {
    key.split('.')
        .map(|segment| segment.to_lower_camel_case())
        .collect::<Vec<_>>()
        .join(".")
}

/// Collapse a key for alias matching: lowercase without `_`, `-` or spaces.
pub(crate) fn alias_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_structured_extension(key: &str) -> bool {
    key == RELATIONSHIP_EXTENSION
        || key == ENDPOINT_EXTENSION
        || key == CURRENT_VALUE_EXTENSION
        || NAMESPACE_EXTENSIONS.contains(&key)
}

fn skip_malformed(key: &str, expected: &str, actual: &Value) {
    tracing::debug!(
        key,
        expected,
        actual = json_type_name(actual),
        "skipping malformed extension payload"
    );
}

fn decode_namespace(block: &Map<String, Value>, metadata: &mut BTreeMap<String, String>) {
    for (key, value) in block {
        let name = normalize_key(key);
        match name.as_str() {
            "relationship" => decode_relationship(value, metadata),
            "endpoint" => decode_endpoint(value, metadata),
            "currentValue" => decode_current_value(value, metadata),
            _ if NAMESPACE_ENDPOINT_KEYS.contains(&name.as_str()) => {
                if let Some(text) = canonical_string(value) {
                    metadata.insert(format!("{META_ENDPOINT_PREFIX}{name}"), text);
                }
            }
            _ => flatten(&name, value, metadata),
        }
    }
}

/// Write nested objects as dotted keys; leaves become canonical strings.
fn flatten(prefix: &str, value: &Value, metadata: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&format!("{prefix}.{}", normalize_key(key)), child, metadata);
            }
        }
        leaf => {
            if let Some(text) = canonical_string(leaf) {
                metadata.insert(prefix.to_string(), text);
            }
        }
    }
}

fn decode_relationship(value: &Value, metadata: &mut BTreeMap<String, String>) {
    let Value::Object(block) = value else {
        skip_malformed(RELATIONSHIP_EXTENSION, "object", value);
        return;
    };

    for (key, value) in block {
        let alias = alias_key(key);
        if alias == "endpoint" {
            decode_endpoint(value, metadata);
            continue;
        }

        let target_key = match alias.as_str() {
            "type" | "kind" | "relationtype" | "relationshiptype" => META_RELATIONSHIP_TYPE,
            "target" | "targetschema" | "schema" | "$ref" | "ref" => META_RELATIONSHIP_TARGET,
            "foreignkey" | "foreignid" | "fk" => META_RELATIONSHIP_FOREIGN_KEY,
            "cardinality" => META_RELATIONSHIP_CARDINALITY,
            "inverse" | "inverseof" | "inversefield" => META_RELATIONSHIP_INVERSE,
            "sourcefield" | "source" => META_RELATIONSHIP_SOURCE_FIELD,
            _ => {
                flatten(&format!("relationship.{}", normalize_key(key)), value, metadata);
                continue;
            }
        };

        let Some(text) = value.as_str() else {
            skip_malformed(key, "string", value);
            continue;
        };

        let text = match target_key {
            META_RELATIONSHIP_TYPE => crate::relationship::RelationshipKind::parse(text)
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_else(|| text.to_string()),
            META_RELATIONSHIP_CARDINALITY => text.to_lowercase(),
            _ => text.to_string(),
        };
        metadata.insert(target_key.to_string(), text);
    }
}

fn decode_endpoint(value: &Value, metadata: &mut BTreeMap<String, String>) {
    let Value::Object(block) = value else {
        skip_malformed(ENDPOINT_EXTENSION, "object", value);
        return;
    };

    let mut refresh_on: BTreeSet<String> = metadata
        .get(META_ENDPOINT_REFRESH_ON)
        .map(|existing| split_list(existing))
        .unwrap_or_default();

    for (key, value) in block {
        let name = normalize_key(key);

        if ENDPOINT_GROUPS.contains(&name.as_str()) {
            let Value::Object(group) = value else {
                skip_malformed(key, "object", value);
                continue;
            };
            for (param, leaf) in group {
                if name == "dynamicParams" {
                    if let Some(template) = leaf.as_str() {
                        refresh_on.extend(field_placeholders(template));
                    }
                }
                if let Some(text) = canonical_string(leaf) {
                    metadata.insert(format!("{META_ENDPOINT_PREFIX}{name}.{param}"), text);
                }
            }
            continue;
        }

        if name == "refreshOn" {
            match value {
                Value::String(list) => refresh_on.extend(split_list(list)),
                Value::Array(names) => {
                    refresh_on.extend(names.iter().filter_map(Value::as_str).map(String::from))
                }
                other => skip_malformed(key, "string or array", other),
            }
            continue;
        }

        flatten(&format!("{META_ENDPOINT_PREFIX}{name}"), value, metadata);
    }

    if !refresh_on.is_empty() {
        let joined = refresh_on.into_iter().collect::<Vec<_>>().join(",");
        metadata.insert(META_ENDPOINT_REFRESH_ON.to_string(), joined);
    }
}

fn decode_current_value(value: &Value, metadata: &mut BTreeMap<String, String>) {
    let text = match value {
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    };
    if let Some(text) = text {
        metadata.insert(META_RELATIONSHIP_CURRENT.to_string(), text);
    }
}

fn split_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Field names referenced as `{{field:<name>}}` inside a template.
fn field_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        if let Some(name) = after[..end].trim().strip_prefix("field:") {
            let name = name.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        rest = &after[end + 2..];
    }
    names
}
