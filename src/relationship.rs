//! Relationship metadata between fields.
//!
//! Relationships are decoded from the flat `relationship.*` metadata keys,
//! reconciled across sibling fields that point at each other, and turned
//! into rendering hints.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::extensions::{
    alias_key, has_endpoint, META_ENDPOINT_RENDERER, META_RELATIONSHIP_CARDINALITY,
    META_RELATIONSHIP_FOREIGN_KEY, META_RELATIONSHIP_INVERSE, META_RELATIONSHIP_SOURCE_FIELD,
    META_RELATIONSHIP_TARGET, META_RELATIONSHIP_TYPE,
};
use crate::model::{Field, FieldType};

/// Relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    BelongsTo,
    HasOne,
    HasMany,
}

impl RelationshipKind {
    /// Parse a kind, ignoring case and `_`/`-` separators.
    ///
    /// Returns `None` for unrecognized kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match alias_key(s).as_str() {
            "belongsto" => Some(RelationshipKind::BelongsTo),
            "hasone" => Some(RelationshipKind::HasOne),
            "hasmany" => Some(RelationshipKind::HasMany),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::BelongsTo => "belongsTo",
            RelationshipKind::HasOne => "hasOne",
            RelationshipKind::HasMany => "hasMany",
        }
    }

    /// Cardinality implied by the kind.
    pub fn default_cardinality(&self) -> &'static str {
        match self {
            RelationshipKind::BelongsTo | RelationshipKind::HasOne => "one",
            RelationshipKind::HasMany => "many",
        }
    }
}

/// A resolved relationship on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub kind: RelationshipKind,
    /// Schema pointer of the related entity.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    /// Always populated: explicit value lower-cased, or derived from `kind`.
    pub cardinality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
    /// Sibling field that carries the canonical relationship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
}

impl Relationship {
    pub fn new(kind: RelationshipKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            foreign_key: None,
            cardinality: kind.default_cardinality().to_string(),
            inverse: None,
            source_field: None,
        }
    }

    /// Build a relationship from decoded `relationship.*` metadata.
    ///
    /// Returns `None` when no kind is declared or the kind is unrecognized.
    pub fn from_metadata(metadata: &BTreeMap<String, String>) -> Option<Self> {
        let raw_kind = metadata.get(META_RELATIONSHIP_TYPE)?;
        let Some(kind) = RelationshipKind::parse(raw_kind) else {
            tracing::debug!(kind = %raw_kind, "ignoring unrecognized relationship kind");
            return None;
        };

        let text = |key: &str| {
            metadata
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
        };

        let target = text(META_RELATIONSHIP_TARGET).unwrap_or_default();
        let mut relationship = Relationship::new(kind, target);
        relationship.foreign_key = text(META_RELATIONSHIP_FOREIGN_KEY);
        relationship.inverse = text(META_RELATIONSHIP_INVERSE);
        relationship.source_field = text(META_RELATIONSHIP_SOURCE_FIELD);
        if let Some(cardinality) = text(META_RELATIONSHIP_CARDINALITY) {
            relationship.cardinality = cardinality.to_lowercase();
        }
        Some(relationship)
    }

    /// Fill unset attributes from another relationship. Kind and cardinality stay.
    pub fn fill_from(&mut self, other: &Relationship) {
        if self.target.is_empty() {
            self.target.clone_from(&other.target);
        }
        if self.foreign_key.is_none() {
            self.foreign_key.clone_from(&other.foreign_key);
        }
        if self.inverse.is_none() {
            self.inverse.clone_from(&other.inverse);
        }
    }
}

/// Derive `input`, `cardinality` and collection rendering hints.
///
/// An explicit `input` in the field's own metadata is never overridden.
/// Objects that can be looked up through an endpoint and have no children
/// are downgraded to `string` select inputs.
pub(crate) fn apply_relationship_hints(field: &mut Field) {
    let Some(relationship) = &field.relationship else {
        return;
    };
    let kind = relationship.kind;
    field
        .ui_hints
        .insert("cardinality".to_string(), relationship.cardinality.clone());

    let endpoint = has_endpoint(&field.metadata);
    let lookup_object = field.lookup
        || (field.field_type == FieldType::Object && endpoint && field.nested.is_empty());

    let input = match (kind, field.field_type) {
        (_, FieldType::Array) => "collection",
        _ if lookup_object => "select",
        (_, FieldType::Object) => "subform",
        (RelationshipKind::HasMany, _) => "collection",
        _ => "select",
    };

    if !field.metadata.contains_key("input") {
        if lookup_object {
            field.field_type = FieldType::String;
            field.lookup = true;
        }
        field.ui_hints.insert("input".to_string(), input.to_string());
    }

    if kind == RelationshipKind::HasMany && field.field_type == FieldType::Array && endpoint {
        field
            .ui_hints
            .entry("collectionRenderer".to_string())
            .or_insert_with(|| "chips".to_string());
        field
            .metadata
            .entry(META_ENDPOINT_RENDERER.to_string())
            .or_insert_with(|| "chips".to_string());
    }
}

enum Link {
    /// `origin` names `host` as its foreign key; `host` becomes canonical.
    ForeignKey { origin: usize, host: usize },
    /// `origin` declares `host` as the source of its relationship.
    SourceField { origin: usize, host: usize },
}

/// Reconcile relationships declared across sibling fields.
///
/// Links are collected from a snapshot first and applied afterwards, so the
/// result does not depend on the order fields are visited. Foreign-key links
/// run before source-field links so a freshly canonical host can be copied.
pub(crate) fn link_siblings(fields: &mut [Field]) {
    let index: HashMap<&str, usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.as_str(), i))
        .collect();

    let mut foreign_key_links = Vec::new();
    let mut source_links = Vec::new();
    for (origin, field) in fields.iter().enumerate() {
        let foreign_key = field
            .relationship
            .as_ref()
            .and_then(|r| r.foreign_key.as_deref())
            .filter(|fk| *fk != field.name)
            .and_then(|fk| index.get(fk));
        if let Some(&host) = foreign_key {
            foreign_key_links.push(Link::ForeignKey { origin, host });
            continue;
        }

        let source = field
            .metadata_value(META_RELATIONSHIP_SOURCE_FIELD)
            .filter(|source| *source != field.name)
            .and_then(|source| index.get(source));
        if let Some(&host) = source {
            source_links.push(Link::SourceField { origin, host });
        }
    }

    if foreign_key_links.is_empty() && source_links.is_empty() {
        return;
    }

    let mut touched = BTreeSet::new();
    for link in foreign_key_links.into_iter().chain(source_links) {
        match link {
            Link::ForeignKey { origin, host } => {
                let Some(canonical) = fields[origin].relationship.clone() else {
                    continue;
                };
                let mut host_relationship = canonical;
                host_relationship.source_field = None;
                match fields[host].relationship.as_mut() {
                    Some(existing) => existing.fill_from(&host_relationship),
                    None => fields[host].relationship = Some(host_relationship),
                }

                let host_name = fields[host].name.clone();
                if let Some(relationship) = fields[origin].relationship.as_mut() {
                    relationship.source_field = Some(host_name.clone());
                }
                tracing::debug!(origin = %fields[origin].name, host = %host_name, "relationship moved to foreign key field");
                touched.insert(origin);
                touched.insert(host);
            }
            Link::SourceField { origin, host } => {
                let Some(canonical) = fields[host].relationship.clone() else {
                    continue;
                };
                let mut relationship = match fields[origin].relationship.take() {
                    Some(mut own) => {
                        own.fill_from(&canonical);
                        own
                    }
                    None => canonical,
                };
                relationship.source_field = Some(fields[host].name.clone());
                fields[origin].relationship = Some(relationship);
                tracing::debug!(origin = %fields[origin].name, host = %fields[host].name, "relationship copied from source field");
                touched.insert(origin);
                touched.insert(host);
            }
        }
    }

    for i in touched {
        apply_relationship_hints(&mut fields[i]);
    }
}

/// Share an array's relationship with its item field.
///
/// The item gets the relationship without `sourceField`, plus the array's
/// `relationship.*` metadata, unless it declares its own. Nested arrays are
/// handled recursively.
pub(crate) fn propagate_to_items(field: &mut Field) {
    if field.field_type != FieldType::Array {
        return;
    }
    let inherited = field.relationship.clone().map(|mut relationship| {
        relationship.source_field = None;
        relationship
    });
    let Some(item) = field.items.as_deref_mut() else {
        return;
    };

    if let Some(relationship) = inherited {
        for (key, value) in &field.metadata {
            if key.starts_with("relationship.") && key != META_RELATIONSHIP_SOURCE_FIELD {
                item.metadata
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        if item.relationship.is_none() {
            item.relationship = Some(relationship);
        }
        apply_relationship_hints(item);
    }

    propagate_to_items(item);
}
