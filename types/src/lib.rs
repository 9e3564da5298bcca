//! Request, target, match and response types shared by the trawl engine and CLI.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod search;
pub use search::{
    AggregatedResult, Match, SearchOutcome, SearchRequest, SearchResponse, SearchTarget,
    TargetKind,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Search pattern text: must not be empty. Stored verbatim; whitespace-only patterns are
/// valid regexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::NonEmptyString;

    #[test]
    fn non_empty_string_rejects_only_empty() {
        assert!(NonEmptyString::new("").is_err());
        assert_eq!(NonEmptyString::new("  ").unwrap().as_str(), "  ");
        assert_eq!(NonEmptyString::new("\t").unwrap().as_str(), "\t");
    }

    #[test]
    fn non_empty_string_keeps_surrounding_whitespace() {
        let value = NonEmptyString::new(" foo ").unwrap();
        assert_eq!(value.as_str(), " foo ");
    }

    #[test]
    fn non_empty_string_deserialize_rejects_empty() {
        let result: Result<NonEmptyString, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
        let spaces: NonEmptyString = serde_json::from_str("\"   \"").unwrap();
        assert_eq!(spaces.as_str(), "   ");
    }
}
