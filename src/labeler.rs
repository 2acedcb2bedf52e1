//! Field name to human label conversion.

use heck::ToTitleCase;

/// Turns a field name into a label a person would read.
///
/// Implementations must be pure: the same name always yields the same label.
pub trait Labeler: Send + Sync {
    fn label(&self, field_name: &str) -> String;
}

impl<F> Labeler for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn label(&self, field_name: &str) -> String {
        self(field_name)
    }
}

/// Default labeler.
///
/// Splits on `_`, `-`, whitespace and camelCase boundaries, then title-cases
/// each word: `author_id` becomes `Author Id`, `publishedAt` becomes
/// `Published At`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleCaseLabeler;

impl Labeler for TitleCaseLabeler {
    fn label(&self, field_name: &str) -> String {
        field_name.to_title_case()
    }
}
