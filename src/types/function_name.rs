// ABOUTME: Validated Lambda function and alias names.
// ABOUTME: Enforces the service's character set and length limits before any remote call.

use std::fmt;
use thiserror::Error;

use super::ProductName;

/// Alias used when none is configured.
pub const DEFAULT_ALIAS: &str = "live";

#[derive(Debug, Error)]
pub enum FunctionNameError {
    #[error("function name cannot be empty")]
    Empty,

    #[error("function name exceeds maximum length of 64 characters")]
    TooLong,

    #[error("invalid character in function name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Error)]
pub enum AliasNameError {
    #[error("alias name cannot be empty")]
    Empty,

    #[error("alias name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("alias name cannot be purely numeric: {0}")]
    Numeric(String),

    #[error("invalid character in alias name: '{0}'")]
    InvalidChar(char),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(value: &str) -> Result<Self, FunctionNameError> {
        if value.is_empty() {
            return Err(FunctionNameError::Empty);
        }

        if value.len() > 64 {
            return Err(FunctionNameError::TooLong);
        }

        if let Some(c) = value.chars().find(|c| !is_name_char(*c)) {
            return Err(FunctionNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ProductName> for FunctionName {
    /// Product names are a subset of function names.
    fn from(product: &ProductName) -> Self {
        Self(product.as_str().to_string())
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the routing pointer that carries production traffic.
///
/// Purely numeric names are rejected since they would be indistinguishable
/// from a version qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasName(String);

impl AliasName {
    pub fn new(value: &str) -> Result<Self, AliasNameError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AliasNameError::Empty);
        }

        if trimmed.len() > 128 {
            return Err(AliasNameError::TooLong);
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(AliasNameError::Numeric(trimmed.to_string()));
        }

        if let Some(c) = trimmed.chars().find(|c| !is_name_char(*c)) {
            return Err(AliasNameError::InvalidChar(c));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AliasName {
    /// The `live` alias.
    fn default() -> Self {
        Self(DEFAULT_ALIAS.to_string())
    }
}

impl fmt::Display for AliasName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
