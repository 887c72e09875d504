//! Validation module
//!
//! Identifiers (table and column names) cannot be bound as parameters, so every
//! name that reaches generated SQL goes through these types and is emitted quoted.
//! Column names in the analytics tables include spaces, dots and CJK text, so the
//! rules reject only what would break out of a quoted identifier.

use std::fmt;

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains a double quote or control character
    InvalidCharacters(String),
    /// Name is too long
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name is empty or whitespace
    Empty,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => {
                write!(
                    f,
                    "Invalid characters in name '{}': quotes and control characters are not allowed",
                    name.escape_debug()
                )
            }
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} characters (max {})",
                    name, length, max_length
                )
            }
            ValidationError::Empty => {
                write!(f, "Name cannot be empty")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

const MAX_IDENTIFIER_LENGTH: usize = 128;

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length,
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    if name.chars().any(|c| c == '"' || c.is_control()) {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    Ok(())
}

/// Wrap an identifier in double quotes, doubling any embedded quote
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Strip everything except ASCII letters, digits and underscores
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// A validated table name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    /// Create a new validated table name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted form for SQL text
    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated column name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName(String);

impl ValidatedFieldName {
    /// Create a new validated field name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for ValidatedFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_analytics_column_names() {
        for name in ["id", "No.", "video views", "国家、地区", "商品类目-zh", "_private"] {
            assert!(ValidatedFieldName::new(name).is_ok(), "{} rejected", name);
        }
    }

    #[test]
    fn test_rejects_breakout_attempts() {
        assert_eq!(
            ValidatedFieldName::new("name\" OR 1=1 --"),
            Err(ValidationError::InvalidCharacters(
                "name\" OR 1=1 --".to_string()
            ))
        );
        assert!(matches!(
            ValidatedTableName::new("users\n; DROP"),
            Err(ValidationError::InvalidCharacters(_))
        ));
        assert_eq!(ValidatedTableName::new("   "), Err(ValidationError::Empty));
    }

    #[test]
    fn test_rejects_long_names() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(matches!(
            ValidatedTableName::new(&long),
            Err(ValidationError::TooLong { length: 129, .. })
        ));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_identifier("No."), "\"No.\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            ValidatedTableName::new("kol_tribit_total").unwrap().quoted(),
            "\"kol_tribit_total\""
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_identifier("search_volume; DROP"), "search_volumeDROP");
        assert_eq!(sanitize_identifier("达人粉丝数"), "");
    }
}
