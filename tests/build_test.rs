//! Integration tests for form model building.

use formgen::{
    build, resolve, BuildError, BuildOptions, Document, Field, FieldType, FormModel, Operation,
    RelationshipKind, ValidationKind, ValidationRule,
};
use serde_json::{json, Value};

fn operation_with(doc: &Value, body: Value) -> Operation {
    Operation::new("createBook", "POST", "/books").with_request_body(resolve(doc, &body))
}

fn build_body(body: Value) -> FormModel {
    build(&operation_with(&json!({}), body), &BuildOptions::default()).unwrap()
}

fn field<'a>(model: &'a FormModel, name: &str) -> &'a Field {
    model
        .field(name)
        .unwrap_or_else(|| panic!("missing field {name}"))
}

// === Structure ===

mod structure {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn top_level_properties_are_not_wrapped() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "pages": { "type": "integer" }
            }
        }));

        let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["pages", "title"]);
    }

    #[test]
    fn nested_objects_wrap_children() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "publisher": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "founded": { "type": "integer" }
                    }
                }
            }
        }));

        let publisher = field(&model, "publisher");
        assert_eq!(publisher.field_type, FieldType::Object);
        assert!(publisher.items.is_none());
        let names: Vec<&str> = publisher.nested.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["founded", "name"]);
        assert!(publisher.nested_field("name").unwrap().required);
        assert!(!publisher.nested_field("founded").unwrap().required);
    }

    #[test]
    fn array_items_get_synthetic_name() {
        let model = build_body(json!({
            "type": "object",
            "required": ["chapters"],
            "properties": {
                "chapters": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["title"],
                        "properties": { "title": { "type": "string" } }
                    }
                }
            }
        }));

        let chapters = field(&model, "chapters");
        assert_eq!(chapters.field_type, FieldType::Array);
        assert!(chapters.required);
        assert!(chapters.nested.is_empty());

        let item = chapters.items.as_ref().unwrap();
        assert_eq!(item.name, "chaptersItem");
        assert_eq!(item.field_type, FieldType::Object);
        assert!(!item.required);
        assert!(item.nested_field("title").unwrap().required);
    }

    #[test]
    fn scalar_types_map() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "s": { "type": "string" },
                "i": { "type": "integer" },
                "n": { "type": "number" },
                "b": { "type": "boolean", "default": true }
            }
        }));

        assert_eq!(field(&model, "s").field_type, FieldType::String);
        assert_eq!(field(&model, "i").field_type, FieldType::Integer);
        assert_eq!(field(&model, "n").field_type, FieldType::Number);
        let b = field(&model, "b");
        assert_eq!(b.field_type, FieldType::Boolean);
        assert_eq!(b.default, Some(json!(true)));
    }

    #[test]
    fn labels_from_names() {
        let model = build_body(json!({
            "type": "object",
            "properties": { "published_at": { "type": "string", "format": "date-time" } }
        }));
        let published = field(&model, "published_at");
        assert_eq!(published.label, "Published At");
        assert_eq!(published.ui_hint("inputType"), Some("datetime-local"));
    }
}

// === Determinism ===

mod determinism {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_builds_are_identical() {
        let op = operation_with(
            &json!({}),
            json!({
                "type": "object",
                "properties": {
                    "zeta": { "type": "string", "x-formgen": { "b": 1, "a": 2 } },
                    "alpha": { "type": "array", "items": { "type": "integer" } },
                    "mid": { "type": "object", "properties": { "y": {}, "x": {} } }
                }
            }),
        );
        let options = BuildOptions::default();

        let first = build(&op, &options).unwrap().to_json_string().unwrap();
        let second = build(&op, &options).unwrap().to_json_string().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn source_property_order_does_not_leak() {
        let forward = build_body(json!({
            "type": "object",
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "integer" },
                "c": { "type": "boolean" }
            }
        }));
        let reversed = build_body(json!({
            "type": "object",
            "properties": {
                "c": { "type": "boolean" },
                "b": { "type": "integer" },
                "a": { "type": "string" }
            }
        }));

        assert_eq!(
            forward.to_json_string().unwrap(),
            reversed.to_json_string().unwrap()
        );
    }

    #[test]
    fn json_shape() {
        let model = build_body(json!({
            "type": "object",
            "required": ["title"],
            "properties": {
                "title": {
                    "type": "string",
                    "maxLength": 200,
                    "x-formgen": { "placeholder": "Dune" }
                },
                "tags": { "type": "array", "items": { "type": "string", "enum": ["a", "b"] } }
            }
        }));

        let actual: Value = serde_json::from_str(&model.to_json_string().unwrap()).unwrap();
        assert_eq!(
            actual,
            json!({
                "operationID": "createBook",
                "endpoint": "/books",
                "method": "POST",
                "fields": [
                    {
                        "name": "tags",
                        "type": "array",
                        "label": "Tags",
                        "items": {
                            "name": "tagsItem",
                            "type": "string",
                            "label": "Tags Item",
                            "enum": ["a", "b"],
                            "uiHints": { "input": "select" }
                        },
                        "uiHints": { "input": "multiselect" }
                    },
                    {
                        "name": "title",
                        "type": "string",
                        "required": true,
                        "label": "Title",
                        "placeholder": "Dune",
                        "validations": [{ "kind": "maxLength", "params": { "value": "200" } }],
                        "metadata": { "placeholder": "Dune" },
                        "uiHints": { "placeholder": "Dune" }
                    }
                ]
            })
        );
    }
}

// === Cycles ===

mod cycles {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph() -> Value {
        json!({
            "components": { "schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "next": { "$ref": "#/components/schemas/Node" }
                    }
                },
                "Publisher": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "headquarters": { "$ref": "#/components/schemas/Headquarters" }
                    }
                },
                "Headquarters": {
                    "type": "object",
                    "properties": {
                        "city": { "type": "string" },
                        "publisher": { "$ref": "#/components/schemas/Publisher" }
                    }
                }
            }}
        })
    }

    #[test]
    fn self_cycle_becomes_ref_field() {
        let op = operation_with(&graph(), json!({ "$ref": "#/components/schemas/Node" }));
        let model = build(&op, &BuildOptions::default()).unwrap();

        let next = field(&model, "next");
        assert_eq!(next.field_type, FieldType::Object);
        assert!(next.nested.is_empty());
        assert_eq!(
            next.metadata_value("$ref"),
            Some("#/components/schemas/Node")
        );
    }

    #[test]
    fn indirect_cycle_becomes_ref_field() {
        let op = operation_with(&graph(), json!({ "$ref": "#/components/schemas/Publisher" }));
        let model = build(&op, &BuildOptions::default()).unwrap();

        let hq = field(&model, "headquarters");
        assert!(hq.nested_field("city").is_some());
        let back = hq.nested_field("publisher").unwrap();
        assert!(back.nested.is_empty());
        assert_eq!(
            back.metadata_value("$ref"),
            Some("#/components/schemas/Publisher")
        );
    }

    #[test]
    fn unresolved_root_is_single_ref_field() {
        let model = build_body(json!({ "$ref": "#/components/schemas/Elsewhere" }));
        assert_eq!(model.fields.len(), 1);
        assert_eq!(model.fields[0].field_type, FieldType::Object);
        assert_eq!(
            model.fields[0].metadata_value("$ref"),
            Some("#/components/schemas/Elsewhere")
        );
    }
}

// === Validation rules ===

mod validations {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exclusive_minimum_and_plain_maximum() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "price": {
                    "type": "number",
                    "minimum": 0.5,
                    "exclusiveMinimum": true,
                    "maximum": 60
                }
            }
        }));

        assert_eq!(
            field(&model, "price").validations,
            vec![
                ValidationRule::new(ValidationKind::Min)
                    .with_param("value", "0.5")
                    .with_param("exclusive", "true"),
                ValidationRule::new(ValidationKind::Max).with_param("value", "60"),
            ]
        );
    }

    #[test]
    fn pattern_is_verbatim() {
        let model = build_body(json!({
            "type": "object",
            "properties": { "code": { "type": "string", "pattern": "[A-Z]{3}\\.\\d+" } }
        }));
        let rule = field(&model, "code")
            .validation(ValidationKind::Pattern)
            .unwrap();
        assert_eq!(rule.param("pattern"), Some("[A-Z]{3}\\.\\d+"));
    }
}

// === Relationships ===

mod relationships {
    use super::*;
    use pretty_assertions::assert_eq;

    fn author_body(author: Value) -> Value {
        json!({
            "type": "object",
            "properties": {
                "author_id": {
                    "type": "integer",
                    "x-relationship": {
                        "type": "belongsTo",
                        "target": "#/components/schemas/Author",
                        "foreignKey": "author_id"
                    }
                },
                "author": author
            }
        })
    }

    #[test]
    fn source_field_sibling_gets_canonical_data() {
        let model = build_body(author_body(json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "x-relationship": { "sourceField": "author_id" }
        })));

        let author_id = field(&model, "author_id");
        let author = field(&model, "author");
        assert_eq!(author_id.ui_hint("input"), Some("select"));
        assert_eq!(author.ui_hint("input"), Some("subform"));

        let canonical = author_id.relationship.as_ref().unwrap();
        let copied = author.relationship.as_ref().unwrap();
        assert_eq!(copied.target, canonical.target);
        assert_eq!(copied.kind, RelationshipKind::BelongsTo);
        assert_eq!(copied.source_field.as_deref(), Some("author_id"));
        assert_eq!(author.ui_hint("cardinality"), Some("one"));
    }

    #[test]
    fn source_field_with_endpoint_becomes_select() {
        let model = build_body(author_body(json!({
            "type": "object",
            "x-relationship": { "source_field": "author_id" },
            "x-endpoint": { "url": "/authors", "labelField": "name" }
        })));

        let author = field(&model, "author");
        assert_eq!(author.ui_hint("input"), Some("select"));
        assert_eq!(author.field_type, FieldType::String);
        assert_eq!(
            author.relationship.as_ref().unwrap().target,
            "#/components/schemas/Author"
        );
    }

    #[test]
    fn foreign_key_declared_on_rich_field() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "publisher_id": { "type": "string", "format": "uuid" },
                "publisher": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "x-relationship": {
                        "kind": "has-one",
                        "target": "#/components/schemas/Publisher",
                        "foreign_id": "publisher_id",
                        "inverse": "books"
                    }
                }
            }
        }));

        let host = field(&model, "publisher_id");
        let host_rel = host.relationship.as_ref().unwrap();
        assert_eq!(host_rel.kind, RelationshipKind::HasOne);
        assert_eq!(host_rel.target, "#/components/schemas/Publisher");
        assert_eq!(host_rel.inverse.as_deref(), Some("books"));
        assert!(host_rel.source_field.is_none());
        assert_eq!(host.ui_hint("input"), Some("select"));

        let origin = field(&model, "publisher");
        assert_eq!(
            origin.relationship.as_ref().unwrap().source_field.as_deref(),
            Some("publisher_id")
        );
        assert_eq!(origin.ui_hint("input"), Some("subform"));
    }

    #[test]
    fn has_many_lookup_linked_by_source_field() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "tag_ids": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "x-relationship": { "type": "hasMany", "target": "#/components/schemas/Tag" }
                },
                "tags": {
                    "type": "object",
                    "x-relationship": { "type": "hasMany", "sourceField": "tag_ids" },
                    "x-endpoint": { "url": "/tags" }
                }
            }
        }));

        let tags = field(&model, "tags");
        assert_eq!(tags.field_type, FieldType::String);
        assert_eq!(tags.ui_hint("input"), Some("select"));
        assert_eq!(
            tags.relationship.as_ref().unwrap().target,
            "#/components/schemas/Tag"
        );
        assert_eq!(field(&model, "tag_ids").ui_hint("input"), Some("collection"));
    }

    #[test]
    fn unknown_kind_renders_plain() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "owner": { "type": "integer", "x-relationship": { "type": "ownedBy" } }
            }
        }));

        let owner = field(&model, "owner");
        assert!(owner.relationship.is_none());
        assert_eq!(owner.ui_hint("input"), None);
        assert_eq!(owner.metadata_value("relationship.type"), Some("ownedBy"));
    }

    #[test]
    fn has_many_array_propagates_to_items() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "tag_ids": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "x-relationship": { "type": "hasMany", "target": "#/components/schemas/Tag" },
                    "x-endpoint": {
                        "url": "/tags",
                        "dynamicParams": { "genre": "{{field:genre_id}}" }
                    }
                }
            }
        }));

        let tags = field(&model, "tag_ids");
        assert_eq!(tags.ui_hint("input"), Some("collection"));
        assert_eq!(tags.ui_hint("collectionRenderer"), Some("chips"));
        assert_eq!(tags.ui_hint("cardinality"), Some("many"));
        assert_eq!(tags.metadata_value("relationship.endpoint.renderer"), Some("chips"));
        assert_eq!(tags.metadata_value("relationship.endpoint.refreshOn"), Some("genre_id"));

        let item = tags.items.as_ref().unwrap();
        let item_rel = item.relationship.as_ref().unwrap();
        assert_eq!(item_rel.kind, RelationshipKind::HasMany);
        assert!(item_rel.source_field.is_none());
        assert_eq!(item.metadata_value("relationship.endpoint.url"), Some("/tags"));
        assert_eq!(item.ui_hint("input"), Some("collection"));
    }

    #[test]
    fn explicit_renderer_is_kept() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "x-relationship": { "type": "hasMany" },
                    "x-endpoint": { "url": "/tags", "renderer": "table" },
                    "x-collection-renderer": "list"
                }
            }
        }));

        let tags = field(&model, "tags");
        assert_eq!(tags.ui_hint("collectionRenderer"), Some("list"));
        assert_eq!(tags.metadata_value("relationship.endpoint.renderer"), Some("table"));
    }

    #[test]
    fn relationship_on_referenced_definition() {
        let doc = json!({
            "components": { "schemas": {
                "AuthorRef": {
                    "type": "integer",
                    "x-relationship": { "type": "belongsTo", "target": "#/components/schemas/Author" }
                }
            }}
        });
        let op = operation_with(
            &doc,
            json!({
                "type": "object",
                "properties": {
                    "editor_id": { "$ref": "#/components/schemas/AuthorRef", "description": "Editor" }
                }
            }),
        );
        let model = build(&op, &BuildOptions::default()).unwrap();

        let editor = field(&model, "editor_id");
        assert_eq!(editor.description.as_deref(), Some("Editor"));
        assert_eq!(editor.ui_hint("input"), Some("select"));
    }
}

// === Choices ===

mod choices {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn enum_array_is_multi_choice() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "array",
                    "items": { "enum": ["draft", "published"] }
                }
            }
        }));

        let status = field(&model, "status");
        assert_eq!(status.field_type, FieldType::Array);
        let item = status.items.as_ref().unwrap();
        assert_eq!(item.field_type, FieldType::String);
        assert_eq!(item.enum_values, vec![json!("draft"), json!("published")]);
        assert_eq!(status.ui_hint("input"), Some("multiselect"));
    }

    #[test]
    fn explicit_input_beats_choice_hint() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "format": { "type": "string", "enum": ["pdf", "epub"], "x-input": "radio" }
            }
        }));
        assert_eq!(field(&model, "format").ui_hint("input"), Some("radio"));
    }
}

// === Failures ===

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_method() {
        let op = Operation::new("createBook", "", "/books");
        assert_eq!(
            build(&op, &BuildOptions::default()),
            Err(BuildError::MissingMethod {
                operation: "createBook".into()
            })
        );
    }

    #[test]
    fn missing_id() {
        let op = Operation::new("", "POST", "/books");
        assert_eq!(
            build(&op, &BuildOptions::default()),
            Err(BuildError::MissingOperationId)
        );
    }

    #[test]
    fn array_without_items() {
        let op = operation_with(
            &json!({}),
            json!({
                "type": "object",
                "properties": { "tags": { "type": "array" } }
            }),
        );
        let err = build(&op, &BuildOptions::default()).unwrap_err();
        assert_eq!(
            err,
            BuildError::ArrayWithoutItems {
                operation: "createBook".into(),
                path: "/tags".into(),
            }
        );
        assert!(err.to_string().contains("/tags"));
    }

    #[test]
    fn root_array_without_items() {
        let op = operation_with(&json!({}), json!({ "type": "array" }));
        assert!(matches!(
            build(&op, &BuildOptions::default()),
            Err(BuildError::ArrayWithoutItems { path, .. }) if path == "/"
        ));
    }

    #[test]
    fn malformed_extensions_do_not_fail() {
        let model = build_body(json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "x-relationship": ["not", "a", "map"],
                    "x-endpoint": "nope",
                    "x-formgen": 12
                }
            }
        }));
        let title = field(&model, "title");
        assert!(title.relationship.is_none());
        assert!(title.metadata.is_empty());
    }
}

// === Documents ===

mod documents {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIBRARY: &str = r##"{
        "openapi": "3.1.0",
        "paths": {
            "/books": {
                "post": {
                    "operationId": "createBook",
                    "summary": "Add a book",
                    "x-formgen": { "layout": { "section": "Catalog" }, "submitLabel": "Save" },
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/BookInput" }
                            }
                        }
                    },
                    "responses": {}
                }
            }
        },
        "components": {
            "schemas": {
                "Entity": {
                    "type": "object",
                    "properties": { "notes": { "type": "string" } }
                },
                "BookInput": {
                    "allOf": [
                        { "$ref": "#/components/schemas/Entity" },
                        {
                            "type": "object",
                            "required": ["title"],
                            "properties": {
                                "title": { "type": "string", "minLength": 1 },
                                "series": { "$ref": "#/components/schemas/Series" }
                            }
                        }
                    ]
                },
                "Series": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "first_book": { "$ref": "#/components/schemas/BookInput" }
                    }
                }
            }
        }
    }"##;

    #[test]
    fn end_to_end_from_text() {
        let doc = Document::from_json_str(LIBRARY).unwrap();
        let op = doc.operation("createBook").unwrap();
        let model = build(&op, &BuildOptions::default()).unwrap();

        assert_eq!(model.method, "POST");
        assert_eq!(model.endpoint, "/books");
        assert_eq!(model.summary.as_deref(), Some("Add a book"));
        assert_eq!(model.ui_hints.get("layout.section").map(String::as_str), Some("Catalog"));
        assert_eq!(model.metadata.get("submitLabel").map(String::as_str), Some("Save"));

        let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["notes", "series", "title"]);
        assert!(field(&model, "title").required);

        let series = field(&model, "series");
        let first_book = series.nested_field("first_book").unwrap();
        assert_eq!(
            first_book.metadata_value("$ref"),
            Some("#/components/schemas/BookInput")
        );
    }
}
