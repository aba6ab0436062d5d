//! Form validation shared by post and comment submissions.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("text must not be empty")]
    EmptyText,
}

impl FormError {
    /// Message shown next to the offending field when the form re-renders.
    pub fn field_message(&self) -> &'static str {
        match self {
            FormError::EmptyText => "The text field must be filled in",
        }
    }
}

/// Strip surrounding whitespace and require a non-empty body.
///
/// Applied uniformly to post and comment text, so whitespace-only
/// submissions are rejected the same way everywhere.
pub fn clean_text(raw: &str) -> Result<String, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FormError::EmptyText);
    }
    Ok(trimmed.to_string())
}
