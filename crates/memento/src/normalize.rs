//! Post-extraction normalization.
//!
//! The only business rule applied outside the prompt: an absent assignee is
//! replaced by the configured default assignee. It runs exactly once per
//! reminder, after extraction and before layout.

use crate::extract::ExtractedFields;

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    default_assignee: Option<String>,
}

impl Normalizer {
    pub fn new(default_assignee: Option<String>) -> Self {
        Self { default_assignee }
    }

    pub fn default_assignee(&self) -> Option<&str> {
        self.default_assignee.as_deref()
    }

    /// Substitute the default assignee when the model reported none.
    ///
    /// An explicit assignee, even an empty one, is left untouched. With no
    /// default configured the field stays absent.
    pub fn apply(&self, mut fields: ExtractedFields) -> ExtractedFields {
        if fields.assignee.is_none() {
            fields.assignee = self.default_assignee.clone();
        }
        fields
    }
}
