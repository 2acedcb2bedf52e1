//! Operations and the documents they come from.
//!
//! An [`Operation`] is the builder's input: identity, request body schema and
//! vendor extensions. [`Document`] extracts operations from an OpenAPI 3.x
//! document that has already been parsed into a [`Value`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::DocumentError;
use crate::extensions::extract_extensions;
use crate::loader::{fragment_pointer, load_document_str, navigate_fragment};
use crate::resolver::Resolver;
use crate::schema::Schema;

/// HTTP methods recognized under a path item, in output order.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const JSON_CONTENT_TYPE: &str = "application/json";

/// One API operation with its resolved schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operation {
    pub id: String,
    /// Upper-case HTTP method.
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub request_body: Option<Schema>,
    /// Response schemas keyed by status code (`200`, `default`, ...).
    pub response_schemas: BTreeMap<String, Schema>,
    pub extensions: BTreeMap<String, Value>,
}

impl Operation {
    pub fn new(id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_request_body(mut self, schema: Schema) -> Self {
        self.request_body = Some(schema);
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// A parsed OpenAPI (or plain JSON Schema) document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidJson` if the text isn't valid JSON.
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        load_document_str(content).map(Self::new)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolve the schema at a JSON pointer, e.g. `#/components/schemas/Book`.
    ///
    /// The leading `#` is optional.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Pointer` if nothing lives at the pointer.
    pub fn schema(&self, pointer: &str) -> Result<Schema, DocumentError> {
        let pointer = fragment_pointer(pointer);
        navigate_fragment(&self.root, &pointer)?;
        Ok(Resolver::new(&self.root).resolve_reference(&pointer))
    }

    /// Every operation under `paths`, ordered by path then method.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidDocument` if `paths` or a path item is
    /// not an object.
    pub fn operations(&self) -> Result<Vec<Operation>, DocumentError> {
        let paths = match self.root.get("paths") {
            None => return Ok(Vec::new()),
            Some(Value::Object(paths)) => paths,
            Some(_) => {
                return Err(DocumentError::InvalidDocument {
                    message: "paths must be an object".to_string(),
                })
            }
        };

        let mut sorted: Vec<(&String, &Value)> = paths.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut operations = Vec::new();
        for (path, item) in sorted {
            let Value::Object(item) = item else {
                return Err(DocumentError::InvalidDocument {
                    message: format!("path item {path} must be an object"),
                });
            };
            let inherited = extract_extensions(item);

            for method in HTTP_METHODS {
                let Some(Value::Object(raw)) = item.get(*method) else {
                    continue;
                };
                operations.push(self.convert_operation(path, method, raw, &inherited));
            }
        }
        Ok(operations)
    }

    /// Find one operation by id.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::OperationNotFound` if no operation has the id.
    pub fn operation(&self, id: &str) -> Result<Operation, DocumentError> {
        self.operations()?
            .into_iter()
            .find(|op| op.id == id)
            .ok_or_else(|| DocumentError::OperationNotFound { id: id.to_string() })
    }

    fn convert_operation(
        &self,
        path: &str,
        method: &str,
        raw: &Map<String, Value>,
        inherited: &BTreeMap<String, Value>,
    ) -> Operation {
        // One cache per operation: shared definitions expand once
        let mut resolver = Resolver::new(&self.root);

        let id = raw
            .get("operationId")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| generated_operation_id(method, path));

        let request_body = raw
            .get("requestBody")
            .map(|body| self.follow_ref(body))
            .and_then(json_schema_of)
            .map(|schema| resolver.resolve(schema));

        let mut response_schemas = BTreeMap::new();
        if let Some(Value::Object(responses)) = raw.get("responses") {
            for (status, response) in responses {
                if let Some(schema) = json_schema_of(self.follow_ref(response)) {
                    response_schemas.insert(status.clone(), resolver.resolve(schema));
                }
            }
        }

        let mut extensions = inherited.clone();
        extensions.extend(extract_extensions(raw));

        Operation {
            id,
            method: method.to_uppercase(),
            path: path.to_string(),
            summary: raw.get("summary").and_then(Value::as_str).map(String::from),
            description: raw
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            request_body,
            response_schemas,
            extensions,
        }
    }

    /// Follow a `$ref` on a request body or response object, if local.
    fn follow_ref<'a>(&'a self, value: &'a Value) -> &'a Value {
        match value.get("$ref").and_then(Value::as_str) {
            Some(pointer) => navigate_fragment(&self.root, pointer).unwrap_or(value),
            None => value,
        }
    }
}

/// Pick the JSON media type schema, falling back to the first content type.
fn json_schema_of(body: &Value) -> Option<&Value> {
    let Value::Object(content) = body.get("content")? else {
        return None;
    };
    content
        .get(JSON_CONTENT_TYPE)
        .or_else(|| content.values().next())
        .and_then(|media| media.get("schema"))
}

/// `post` + `/books/{id}/reviews` becomes `post_books_id_reviews`.
fn generated_operation_id(method: &str, path: &str) -> String {
    let slug = path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if slug.is_empty() {
        method.to_lowercase()
    } else {
        format!("{}_{}", method.to_lowercase(), slug)
    }
}
