//! Raw document parsing and JSON Pointer navigation.
//!
//! Documents arrive as text or as an already-parsed [`Value`]; fetching them
//! from disk or the network is left to the caller.

use serde_json::Value;

use crate::error::DocumentError;

/// Parse a document from a JSON string.
///
/// # Errors
///
/// Returns `DocumentError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(content).map_err(|source| DocumentError::InvalidJson { source })
}

/// Check if a reference points inside the current document (`#...`).
pub fn is_local_ref(reference: &str) -> bool {
    reference.starts_with('#')
}

/// Normalize a document pointer to fragment form: `components/schemas/Book`,
/// `/components/schemas/Book` and `#/components/schemas/Book` all become the
/// last.
pub fn fragment_pointer(pointer: &str) -> String {
    if pointer.starts_with('#') {
        return pointer.to_string();
    }
    format!("#/{}", pointer.trim_start_matches('/'))
}

/// Navigate a JSON Pointer fragment (e.g. `#/components/schemas/Book`).
///
/// The fragment may start with `#`. An empty pointer addresses the root.
///
/// # Errors
///
/// Returns `DocumentError::Pointer` if any segment is missing.
pub fn navigate_fragment<'a>(root: &'a Value, fragment: &str) -> Result<&'a Value, DocumentError> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(root);
    }

    let mut current = root;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| DocumentError::Pointer {
            pointer: fragment.to_string(),
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_valid_json() {
        let doc = load_document_str(r#"{"openapi": "3.1.0"}"#).unwrap();
        assert_eq!(doc["openapi"], "3.1.0");
    }

    #[test]
    fn load_invalid_json() {
        let result = load_document_str("{not json");
        assert!(matches!(result, Err(DocumentError::InvalidJson { .. })));
    }

    #[test]
    fn navigate_component() {
        let doc = json!({
            "components": { "schemas": { "Book": { "type": "object" } } }
        });
        let book = navigate_fragment(&doc, "#/components/schemas/Book").unwrap();
        assert_eq!(book, &json!({ "type": "object" }));
    }

    #[test]
    fn navigate_root() {
        let doc = json!({ "type": "object" });
        assert_eq!(navigate_fragment(&doc, "#").unwrap(), &doc);
        assert_eq!(navigate_fragment(&doc, "").unwrap(), &doc);
    }

    #[test]
    fn navigate_escaped_segments() {
        let doc = json!({ "paths": { "/books/{id}": { "a~b": 1 } } });
        let value = navigate_fragment(&doc, "#/paths/~1books~1{id}/a~0b").unwrap();
        assert_eq!(value, &json!(1));
    }

    #[test]
    fn navigate_array_index() {
        let doc = json!({ "allOf": [{ "type": "string" }, { "type": "integer" }] });
        let value = navigate_fragment(&doc, "#/allOf/1").unwrap();
        assert_eq!(value["type"], "integer");
    }

    #[test]
    fn navigate_missing_segment() {
        let doc = json!({ "components": {} });
        let result = navigate_fragment(&doc, "#/components/schemas/Missing");
        assert!(matches!(
            result,
            Err(DocumentError::Pointer { pointer }) if pointer == "#/components/schemas/Missing"
        ));
    }

    #[test]
    fn fragment_pointer_forms() {
        assert_eq!(fragment_pointer("components/schemas/Book"), "#/components/schemas/Book");
        assert_eq!(fragment_pointer("/components/schemas/Book"), "#/components/schemas/Book");
        assert_eq!(fragment_pointer("#/components/schemas/Book"), "#/components/schemas/Book");
        assert_eq!(fragment_pointer("#"), "#");
    }

    #[test]
    fn local_ref_detection() {
        assert!(is_local_ref("#/$defs/Book"));
        assert!(!is_local_ref("other.json#/Book"));
    }
}
