// ABOUTME: Per-deployment rules that decide whether a verification invocation passed.
// ABOUTME: Status code range, function-error tolerance, and payload matching.

use serde::Deserialize;
use serde::de::{self, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::InvocationResult;

/// Inclusive range of acceptable status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub min: i32,
    pub max: i32,
}

impl StatusRange {
    pub fn contains(&self, code: i32) -> bool {
        (self.min..=self.max).contains(&code)
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        StatusRange { min: 200, max: 299 }
    }
}

impl FromStr for StatusRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| format!("invalid status code: {}", v.trim()))
        };

        let range = match s.split_once('-') {
            Some((min, max)) => StatusRange {
                min: parse(min)?,
                max: parse(max)?,
            },
            None => {
                let code = parse(s)?;
                StatusRange {
                    min: code,
                    max: code,
                }
            }
        };

        if range.min > range.max {
            return Err(format!("empty status range: {}", s));
        }
        Ok(range)
    }
}

impl fmt::Display for StatusRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

impl<'de> Deserialize<'de> for StatusRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Ok(StatusRange {
                min: code,
                max: code,
            }),
            Raw::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

/// Payload rules. Every rule that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayloadExpectation {
    /// Response JSON must equal this value.
    #[serde(default)]
    pub equals: Option<Value>,

    /// Response JSON must contain this value as a subset.
    #[serde(default)]
    pub contains: Option<Value>,

    /// Raw response text must contain this string.
    #[serde(default)]
    pub substring: Option<String>,
}

/// What a verification invocation must produce.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Expectation {
    #[serde(default)]
    pub status: StatusRange,

    #[serde(default)]
    pub allow_function_error: bool,

    #[serde(default)]
    pub payload: PayloadExpectation,
}

impl Expectation {
    /// Judge an invocation result, returning the first mismatch found.
    pub fn check(&self, result: &InvocationResult) -> Result<(), String> {
        if !self.status.contains(result.status_code) {
            return Err(format!(
                "status code {} outside expected {}",
                result.status_code, self.status
            ));
        }

        if let Some(ref error) = result.function_error
            && !self.allow_function_error
        {
            return Err(format!(
                "function reported an error ({}): {}",
                error,
                result.payload_text()
            ));
        }

        let rules = &self.payload;
        if let Some(ref needle) = rules.substring
            && !result.payload_text().contains(needle.as_str())
        {
            return Err(format!("payload does not contain {:?}", needle));
        }

        if rules.equals.is_none() && rules.contains.is_none() {
            return Ok(());
        }

        let actual: Value = serde_json::from_slice(&result.payload)
            .map_err(|e| format!("payload is not valid JSON: {}", e))?;

        if let Some(ref expected) = rules.equals
            && &actual != expected
        {
            return Err(format!("payload {} does not equal {}", actual, expected));
        }

        if let Some(ref expected) = rules.contains
            && !json_contains(&actual, expected)
        {
            return Err(format!("payload {} does not contain {}", actual, expected));
        }

        Ok(())
    }
}

/// Subset match: objects need every expected key, arrays need every expected
/// element to be contained by some actual element, scalars must be equal.
fn json_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => expected
            .iter()
            .all(|(k, v)| actual.get(k).is_some_and(|a| json_contains(a, v))),
        (Value::Array(actual), Value::Array(expected)) => expected
            .iter()
            .all(|e| actual.iter().any(|a| json_contains(a, e))),
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    fn result(status: i32, payload: &str) -> InvocationResult {
        InvocationResult {
            function_name: "myapp".to_string(),
            status_code: status,
            payload: Bytes::from(payload.to_string()),
            function_error: None,
            executed_version: Some("2".to_string()),
        }
    }

    #[test]
    fn default_accepts_any_2xx() {
        let expectation = Expectation::default();
        assert!(expectation.check(&result(200, "")).is_ok());
        assert!(expectation.check(&result(204, "")).is_ok());
        assert!(expectation.check(&result(500, "")).is_err());
    }

    #[test]
    fn function_error_fails_unless_allowed() {
        let mut r = result(200, r#"{"errorMessage":"boom"}"#);
        r.function_error = Some("Unhandled".to_string());

        let err = Expectation::default().check(&r).unwrap_err();
        assert!(err.contains("Unhandled"));

        let lenient = Expectation {
            allow_function_error: true,
            ..Default::default()
        };
        assert!(lenient.check(&r).is_ok());
    }

    #[test]
    fn contains_matches_nested_subset() {
        let expectation = Expectation {
            payload: PayloadExpectation {
                contains: Some(json!({"body": {"ok": true}, "tags": ["a"]})),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(
            expectation
                .check(&result(200, r#"{"body":{"ok":true,"n":1},"tags":["b","a"]}"#))
                .is_ok()
        );
        assert!(
            expectation
                .check(&result(200, r#"{"body":{"ok":false},"tags":["a"]}"#))
                .is_err()
        );
    }

    #[test]
    fn equals_requires_exact_json() {
        let expectation = Expectation {
            payload: PayloadExpectation {
                equals: Some(json!({"ok": true})),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(expectation.check(&result(200, r#"{ "ok": true }"#)).is_ok());
        assert!(expectation.check(&result(200, r#"{"ok":true,"x":1}"#)).is_err());
        assert!(expectation.check(&result(200, "not json")).is_err());
    }

    #[test]
    fn status_range_parsing() {
        assert_eq!(
            "200-204".parse::<StatusRange>().unwrap(),
            StatusRange { min: 200, max: 204 }
        );
        assert_eq!(
            "202".parse::<StatusRange>().unwrap(),
            StatusRange { min: 202, max: 202 }
        );
        assert!("300-200".parse::<StatusRange>().is_err());
        assert!("ok".parse::<StatusRange>().is_err());
    }

    #[test]
    fn expectation_from_yaml() {
        let yaml = r#"
status: "200-201"
payload:
  substring: hello
  contains:
    greeting: hello
"#;
        let expectation: Expectation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(expectation.status, StatusRange { min: 200, max: 201 });
        assert_eq!(expectation.payload.substring.as_deref(), Some("hello"));
        assert_eq!(
            expectation.payload.contains,
            Some(json!({"greeting": "hello"}))
        );
    }
}
