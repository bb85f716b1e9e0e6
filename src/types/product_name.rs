// ABOUTME: Validated executable product name.
// ABOUTME: Product names become file names, so path separators and dots are rejected.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductNameError {
    #[error("product name cannot be empty")]
    Empty,

    #[error("product name exceeds maximum length of 64 characters")]
    TooLong,

    #[error("product name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("invalid character in product name: '{0}'")]
    InvalidChar(char),
}

/// Name of an executable target in the manifest (a cargo `bin` target).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductName(String);

impl ProductName {
    pub fn new(value: &str) -> Result<Self, ProductNameError> {
        if value.is_empty() {
            return Err(ProductNameError::Empty);
        }

        if value.len() > 64 {
            return Err(ProductNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ProductNameError::StartsWithHyphen);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(ProductNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ProductName {
    type Error = ProductNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
