//! Field validation shared by the domain repositories.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// A required field was blank after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTaskText,
    EmptyHabitName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTaskText => write!(f, "task text cannot be empty"),
            Self::EmptyHabitName => write!(f, "habit name cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Returns the trimmed value, or `err` when nothing is left.
pub fn required_text(value: &str, err: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{required_text, ValidationError};

    #[test]
    fn required_text_trims() {
        assert_eq!(
            required_text("  Read  ", ValidationError::EmptyHabitName).unwrap(),
            "Read"
        );
    }

    #[test]
    fn required_text_rejects_whitespace() {
        assert_eq!(
            required_text(" \t\n", ValidationError::EmptyTaskText),
            Err(ValidationError::EmptyTaskText)
        );
    }
}
