//! Form model compiler
//!
//! Turns an API operation's request schema into a renderer-agnostic form
//! model: a tree of typed fields with validation rules, relationship
//! metadata and UI hints.
//!
//! Compilation has two stages:
//!
//! 1. [`resolve`] converts raw schema JSON into the [`Schema`] IR, expanding
//!    local `$ref`s, breaking reference cycles with stubs and merging `allOf`.
//! 2. [`build`] walks an [`Operation`]'s request body into [`Field`]s.
//!
//! # Example
//!
//! ```
//! use formgen::{build, resolve, BuildOptions, Operation};
//! use serde_json::json;
//!
//! let body = json!({
//!     "type": "object",
//!     "required": ["title"],
//!     "properties": {
//!         "title": { "type": "string", "maxLength": 200 },
//!         "author_id": {
//!             "type": "integer",
//!             "x-relationship": {
//!                 "type": "belongsTo",
//!                 "target": "#/components/schemas/Author",
//!                 "foreignKey": "author_id"
//!             }
//!         }
//!     }
//! });
//!
//! let operation = Operation::new("createBook", "POST", "/books")
//!     .with_request_body(resolve(&json!({}), &body));
//! let model = build(&operation, &BuildOptions::default()).unwrap();
//!
//! // Properties become top-level fields, sorted by name
//! assert_eq!(model.fields[0].name, "author_id");
//! assert_eq!(model.fields[0].ui_hint("input"), Some("select"));
//! assert!(model.fields[1].required);
//! ```
//!
//! # Relationship inputs
//!
//! | Kind | Field type | `input` hint |
//! |------|------------|--------------|
//! | any | array | `collection` |
//! | any | object with endpoint, no children | `select` (type becomes `string`) |
//! | any | other object | `subform` |
//! | `hasMany` | scalar | `collection` |
//! | `belongsTo` / `hasOne` | scalar | `select` |

mod builder;
mod error;
mod extensions;
mod labeler;
mod loader;
mod model;
mod operation;
mod relationship;
mod resolver;
mod schema;
mod types;

pub use builder::{build, validate_operation, ROOT_ITEMS_NAME, ROOT_VALUE_NAME};
pub use error::{BuildError, DocumentError};
pub use extensions::{
    canonical_string, decode, extract_extensions, filter_ui_hints, has_endpoint, normalize_key,
    CURRENT_VALUE_EXTENSION, ENDPOINT_EXTENSION, META_ENDPOINT_PREFIX, META_ENDPOINT_REFRESH_ON,
    META_ENDPOINT_RENDERER, META_REF, META_RELATIONSHIP_CARDINALITY, META_RELATIONSHIP_CURRENT,
    META_RELATIONSHIP_FOREIGN_KEY, META_RELATIONSHIP_INVERSE, META_RELATIONSHIP_SOURCE_FIELD,
    META_RELATIONSHIP_TARGET, META_RELATIONSHIP_TYPE, RELATIONSHIP_EXTENSION,
};
pub use labeler::{Labeler, TitleCaseLabeler};
pub use loader::{fragment_pointer, load_document_str, navigate_fragment};
pub use model::{Field, FieldType, FormModel, ValidationKind, ValidationRule};
pub use operation::{Document, Operation, HTTP_METHODS};
pub use relationship::{Relationship, RelationshipKind};
pub use resolver::{resolve, Resolver};
pub use schema::Schema;
pub use types::{
    format_input_type, json_type_name, BuildOptions, FORMAT_INPUT_TYPES, NAMESPACE_EXTENSIONS,
    UI_HINT_KEYS,
};
