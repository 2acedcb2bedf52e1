//! Form model building - walks an operation's request schema into fields.

use crate::error::BuildError;
use crate::extensions::{decode, filter_ui_hints, format_decimal, META_REF};
use crate::model::{Field, FieldType, FormModel, ValidationKind, ValidationRule};
use crate::operation::Operation;
use crate::relationship::{apply_relationship_hints, link_siblings, propagate_to_items, Relationship};
use crate::schema::Schema;
use crate::types::{format_input_type, BuildOptions};

/// Field name used when the request body root is an array.
pub const ROOT_ITEMS_NAME: &str = "items";
/// Field name used when the request body root is a scalar or a reference stub.
pub const ROOT_VALUE_NAME: &str = "value";

/// Build the form model for an operation.
///
/// The request body's direct properties become the model's top-level
/// fields, sorted by name.
///
/// # Errors
///
/// Returns `BuildError` if the operation is missing its id, method or path,
/// or if any array schema in the request body has no `items`.
pub fn build(operation: &Operation, options: &BuildOptions) -> Result<FormModel, BuildError> {
    validate_operation(operation)?;
    tracing::debug!(operation = %operation.id, "building form model");

    let builder = FormBuilder { options };
    let fields = operation
        .request_body
        .as_ref()
        .map(|schema| builder.root_fields(schema))
        .unwrap_or_default();

    let metadata = decode(&operation.extensions);
    let ui_hints = filter_ui_hints(&metadata);

    let model = FormModel {
        operation_id: operation.id.clone(),
        endpoint: operation.path.clone(),
        method: operation.method.clone(),
        summary: operation.summary.clone(),
        description: operation.description.clone(),
        fields,
        metadata,
        ui_hints,
    };
    tracing::debug!(
        operation = %model.operation_id,
        fields = model.fields.len(),
        "form model built"
    );
    Ok(model)
}

/// Check the structural preconditions of [`build`] without building.
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_operation(operation: &Operation) -> Result<(), BuildError> {
    if operation.id.trim().is_empty() {
        return Err(BuildError::MissingOperationId);
    }
    if operation.method.trim().is_empty() {
        return Err(BuildError::MissingMethod {
            operation: operation.id.clone(),
        });
    }
    if operation.path.trim().is_empty() {
        return Err(BuildError::MissingPath {
            operation: operation.id.clone(),
        });
    }
    if let Some(schema) = &operation.request_body {
        validate_schema(&operation.id, schema, "")?;
    }
    Ok(())
}

fn validate_schema(operation: &str, schema: &Schema, path: &str) -> Result<(), BuildError> {
    if schema.is_reference_stub() {
        return Ok(());
    }

    if schema.is_array() {
        let Some(items) = &schema.items else {
            return Err(BuildError::ArrayWithoutItems {
                operation: operation.to_string(),
                path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            });
        };
        validate_schema(operation, items, &format!("{path}/items"))?;
    }

    for (name, property) in &schema.properties {
        validate_schema(operation, property, &format!("{path}/{name}"))?;
    }
    Ok(())
}

struct FormBuilder<'a> {
    options: &'a BuildOptions,
}

impl FormBuilder<'_> {
    fn root_fields(&self, schema: &Schema) -> Vec<Field> {
        if schema.is_reference_stub() {
            return vec![self.reference_field(ROOT_VALUE_NAME, schema, false)];
        }
        match schema.effective_type() {
            "object" => self.object_children(schema),
            "array" => {
                let mut field = self.array_field(ROOT_ITEMS_NAME, schema, false);
                propagate_to_items(&mut field);
                vec![field]
            }
            scalar => vec![self.scalar_field(ROOT_VALUE_NAME, scalar, schema, false)],
        }
    }

    fn field_from_schema(&self, name: &str, schema: &Schema, required: bool) -> Field {
        if schema.is_reference_stub() {
            return self.reference_field(name, schema, required);
        }
        match schema.effective_type() {
            "object" => {
                let mut field = Field::new(name, FieldType::Object);
                field.nested = self.object_children(schema);
                self.decorate(&mut field, schema, required);
                field
            }
            "array" => self.array_field(name, schema, required),
            scalar => self.scalar_field(name, scalar, schema, required),
        }
    }

    /// Build, link and propagate the direct children of an object schema.
    fn object_children(&self, schema: &Schema) -> Vec<Field> {
        // `properties` is ordered by name, so output order is stable
        let mut children: Vec<Field> = schema
            .properties
            .iter()
            .map(|(name, property)| {
                self.field_from_schema(name, property, schema.is_required(name))
            })
            .collect();

        link_siblings(&mut children);
        for child in &mut children {
            propagate_to_items(child);
        }
        children
    }

    fn array_field(&self, name: &str, schema: &Schema, required: bool) -> Field {
        let mut field = Field::new(name, FieldType::Array);
        if let Some(items) = &schema.items {
            let item = self.field_from_schema(&format!("{name}Item"), items, false);
            field.items = Some(Box::new(item));
        }
        self.decorate(&mut field, schema, required);
        field
    }

    fn scalar_field(&self, name: &str, scalar: &str, schema: &Schema, required: bool) -> Field {
        let mut field = Field::new(name, FieldType::from_schema_type(scalar));
        self.decorate(&mut field, schema, required);
        field
    }

    /// A reference that was not expanded renders as an object carrying `$ref`.
    fn reference_field(&self, name: &str, schema: &Schema, required: bool) -> Field {
        let mut field = Field::new(name, FieldType::Object);
        if let Some(pointer) = &schema.reference {
            field.metadata.insert(META_REF.to_string(), pointer.clone());
        }
        self.decorate(&mut field, schema, required);
        field
    }

    fn decorate(&self, field: &mut Field, schema: &Schema, required: bool) {
        field.required = required;
        field.format.clone_from(&schema.format);
        field.description.clone_from(&schema.description);
        field.default.clone_from(&schema.default);
        field.enum_values.clone_from(&schema.enum_values);
        field.validations = validation_rules(schema);

        field.metadata.extend(decode(&schema.extensions));
        field.ui_hints = filter_ui_hints(&field.metadata);
        field.relationship = Relationship::from_metadata(&field.metadata);

        if self.options.format_hints {
            apply_format_hints(field);
        }
        apply_relationship_hints(field);
        apply_choice_hints(field);
        promote_metadata(field);

        if field.label.is_empty() {
            field.label = self.options.labeler.label(&field.name);
        }
    }
}

/// Translate schema constraints into validation rules.
fn validation_rules(schema: &Schema) -> Vec<ValidationRule> {
    let mut rules = Vec::new();

    let bounds = [
        (ValidationKind::Min, schema.minimum, schema.exclusive_minimum),
        (ValidationKind::Max, schema.maximum, schema.exclusive_maximum),
    ];
    for (kind, bound, exclusive) in bounds {
        if let Some(value) = bound {
            let mut rule = ValidationRule::new(kind).with_param("value", format_decimal(value));
            if exclusive {
                rule = rule.with_param("exclusive", "true");
            }
            rules.push(rule);
        }
    }

    if let Some(min) = schema.min_length {
        rules.push(ValidationRule::new(ValidationKind::MinLength).with_param("value", min.to_string()));
    }
    if let Some(max) = schema.max_length {
        rules.push(ValidationRule::new(ValidationKind::MaxLength).with_param("value", max.to_string()));
    }
    if let Some(pattern) = &schema.pattern {
        rules.push(ValidationRule::new(ValidationKind::Pattern).with_param("pattern", pattern.clone()));
    }

    rules
}

fn apply_format_hints(field: &mut Field) {
    if field.ui_hints.contains_key("inputType") {
        return;
    }
    if let Some(input_type) = field.format.as_deref().and_then(format_input_type) {
        field
            .ui_hints
            .insert("inputType".to_string(), input_type.to_string());
    }
}

/// Enumerated values become choice inputs unless something else chose already.
fn apply_choice_hints(field: &mut Field) {
    if field.ui_hints.contains_key("input") {
        return;
    }
    let input = match field.field_type {
        FieldType::Array => field
            .items
            .as_ref()
            .filter(|item| !item.enum_values.is_empty())
            .map(|_| "multiselect"),
        scalar if scalar.is_scalar() && !field.enum_values.is_empty() => Some("select"),
        _ => None,
    };
    if let Some(input) = input {
        field.ui_hints.insert("input".to_string(), input.to_string());
    }
}

/// Copy common metadata onto direct attributes when they are unset.
fn promote_metadata(field: &mut Field) {
    if field.placeholder.is_none() {
        field.placeholder = field.metadata.get("placeholder").cloned();
    }
    if field.label.is_empty() {
        if let Some(label) = field.metadata.get("label") {
            field.label.clone_from(label);
        }
    }
    if field.description.is_none() {
        field.description = field
            .metadata
            .get("hint")
            .or_else(|| field.metadata.get("helpText"))
            .cloned();
    }
}
