//! Schema resolution - turns raw schema nodes into the [`Schema`] IR.
//!
//! Local `$ref`s are expanded against the document root, `allOf` branches are
//! merged into their parent, and vendor extensions are carried through raw.
//! Reference cycles are broken with stubs, so the result is always finite.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::extensions::extract_extensions;
use crate::loader::{is_local_ref, navigate_fragment};
use crate::schema::Schema;

/// Resolve a single schema node against a document root.
///
/// Uses a fresh cache, so repeated calls never share state.
pub fn resolve(root: &Value, node: &Value) -> Schema {
    Resolver::new(root).resolve(node)
}

/// Converts raw schema nodes into the IR, memoizing referenced definitions.
///
/// A resolver owns one `cache` of completed definitions and one `active` set
/// of definitions currently being expanded. A reference to an active
/// definition is a cycle and resolves to a stub.
///
/// Where a definition's cycle stubs land depends on which definitions were
/// active around it, so an expansion containing stubs is only reused at the
/// top level. Expansions without cycle stubs are reused everywhere.
#[derive(Debug)]
pub struct Resolver<'a> {
    root: &'a Value,
    cache: HashMap<String, CachedSchema>,
    active: HashSet<String>,
    /// Cycle stubs produced so far.
    stubs: usize,
}

#[derive(Debug)]
struct CachedSchema {
    schema: Schema,
    /// No cycle stub anywhere in the expansion.
    self_contained: bool,
}

impl<'a> Resolver<'a> {
    /// Create a resolver that looks up `$ref` pointers inside `root`.
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            cache: HashMap::new(),
            active: HashSet::new(),
            stubs: 0,
        }
    }

    /// Resolve one raw schema node.
    pub fn resolve(&mut self, node: &Value) -> Schema {
        match node {
            Value::Object(map) => self.resolve_object(map),
            // `true` / `{}`-equivalents and malformed nodes carry no constraints
            _ => Schema::default(),
        }
    }

    /// Resolve the definition a pointer refers to.
    ///
    /// Unknown and non-local pointers become stubs.
    pub fn resolve_reference(&mut self, pointer: &str) -> Schema {
        let top_level = self.active.is_empty();
        if let Some(cached) = self.cache.get(pointer) {
            if top_level || cached.self_contained {
                return cached.schema.clone();
            }
        }

        if self.active.contains(pointer) {
            tracing::debug!(pointer, "reference cycle broken with stub");
            self.stubs += 1;
            return Schema::reference_stub(pointer);
        }

        let root = self.root;
        let definition = if is_local_ref(pointer) {
            navigate_fragment(root, pointer).ok()
        } else {
            None
        };
        let Some(definition) = definition else {
            tracing::debug!(pointer, "unresolvable reference left as stub");
            return Schema::reference_stub(pointer);
        };

        let stubs_before = self.stubs;
        self.active.insert(pointer.to_string());
        let schema = self.resolve(definition);
        self.active.remove(pointer);

        let self_contained = self.stubs == stubs_before;
        if top_level || self_contained {
            self.cache.insert(
                pointer.to_string(),
                CachedSchema {
                    schema: schema.clone(),
                    self_contained,
                },
            );
        }
        schema
    }

    fn resolve_object(&mut self, map: &Map<String, Value>) -> Schema {
        let Some(pointer) = map.get("$ref").and_then(Value::as_str) else {
            return self.resolve_inline(map);
        };

        let target = self.resolve_reference(pointer);
        if map.len() == 1 {
            return target;
        }

        // Sibling keywords next to `$ref` override the referenced definition
        let mut local = self.resolve_inline(map);
        local.merge_branch(&target);
        local
    }

    fn resolve_inline(&mut self, map: &Map<String, Value>) -> Schema {
        let mut schema = Schema {
            schema_type: map.get("type").and_then(primary_type),
            format: string_keyword(map, "format"),
            description: string_keyword(map, "description"),
            default: map.get("default").cloned(),
            pattern: string_keyword(map, "pattern"),
            min_length: map.get("minLength").and_then(Value::as_u64),
            max_length: map.get("maxLength").and_then(Value::as_u64),
            extensions: extract_extensions(map),
            ..Schema::default()
        };

        if let Some(Value::Array(values)) = map.get("enum") {
            schema.enum_values = values.clone();
        }

        if let Some(Value::Array(names)) = map.get("required") {
            schema.required = names
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }

        let (minimum, exclusive_minimum) =
            numeric_bound(map.get("minimum"), map.get("exclusiveMinimum"));
        schema.minimum = minimum;
        schema.exclusive_minimum = exclusive_minimum;

        let (maximum, exclusive_maximum) =
            numeric_bound(map.get("maximum"), map.get("exclusiveMaximum"));
        schema.maximum = maximum;
        schema.exclusive_maximum = exclusive_maximum;

        if let Some(Value::Object(properties)) = map.get("properties") {
            for (name, property) in properties {
                let resolved = self.resolve(property);
                schema.properties.insert(name.clone(), resolved);
            }
        }

        match map.get("items") {
            Some(items @ Value::Object(_)) => {
                schema.items = Some(Box::new(self.resolve(items)));
            }
            // Tuple form: the first position stands in for every element
            Some(Value::Array(positions)) => {
                if let Some(first) = positions.first() {
                    schema.items = Some(Box::new(self.resolve(first)));
                }
            }
            _ => {}
        }

        if let Some(Value::Array(branches)) = map.get("allOf") {
            for branch in branches {
                let resolved = self.resolve(branch);
                schema.merge_branch(&resolved);
            }
        }

        schema
    }
}

fn string_keyword(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

/// Pick the schema type; for `["string", "null"]` the first non-null entry wins.
fn primary_type(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(String::from),
        _ => None,
    }
}

/// Combine a bound with its exclusive flag.
///
/// Handles both the boolean form (`exclusiveMinimum: true`) and the numeric
/// form (`exclusiveMinimum: 5`), where the numeric form replaces the bound.
fn numeric_bound(bound: Option<&Value>, exclusive: Option<&Value>) -> (Option<f64>, bool) {
    let bound = bound.and_then(Value::as_f64);
    match exclusive {
        Some(Value::Bool(flag)) => (bound, *flag && bound.is_some()),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(value) => (Some(value), true),
            None => (bound, false),
        },
        _ => (bound, false),
    }
}
