//! Search request, match, and response types.

use std::num::NonZeroU64;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{EmptyStringError, NonEmptyString};

/// A single search request.
///
/// `scope_path` absent means "every configured workspace root"; `include_glob` absent means
/// no file filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Case-insensitive regular expression handed to the matcher.
    pub pattern: NonEmptyString,
    /// A single file or directory to restrict the search to.
    #[serde(default, rename = "path", skip_serializing_if = "Option::is_none")]
    pub scope_path: Option<String>,
    /// Glob restricting which files are searched. Ignored for single-file scopes.
    #[serde(default, rename = "include", skip_serializing_if = "Option::is_none")]
    pub include_glob: Option<String>,
}

impl SearchRequest {
    pub fn new(pattern: impl Into<String>) -> Result<Self, EmptyStringError> {
        Ok(Self {
            pattern: NonEmptyString::new(pattern)?,
            scope_path: None,
            include_glob: None,
        })
    }

    #[must_use]
    pub fn with_scope(mut self, path: impl Into<String>) -> Self {
        self.scope_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_include(mut self, glob: impl Into<String>) -> Self {
        self.include_glob = Some(glob.into());
        self
    }

    /// The include glob, treating blank values as absent.
    #[must_use]
    pub fn include(&self) -> Option<&str> {
        self.include_glob
            .as_deref()
            .map(str::trim)
            .filter(|glob| !glob.is_empty())
    }

    /// Human-readable description of where the search ran.
    #[must_use]
    pub fn scope_description(&self) -> String {
        match self.scope_path.as_deref() {
            Some(path) => format!("\"{path}\""),
            None => "the workspace".to_string(),
        }
    }
}

/// What a resolved target path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

/// One absolute path searched as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
}

impl SearchTarget {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: TargetKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Directory that relative match paths fall back to when outside the base directory.
    #[must_use]
    pub fn anchor(&self) -> PathBuf {
        match self.kind {
            TargetKind::Directory => self.path.clone(),
            TargetKind::File => self
                .path
                .parent()
                .map_or_else(|| self.path.clone(), std::path::Path::to_path_buf),
        }
    }
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub file_path: String,
    pub line_number: NonZeroU64,
    /// The line exactly as the matcher printed it (not trimmed).
    pub line_text: String,
}

/// Matches across every target of one request, after the global cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedResult {
    pub matches: Vec<Match>,
    pub truncated: bool,
}

impl AggregatedResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

/// How a request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    Matches,
    NoMatches,
    Cancelled,
    Error,
}

/// The structured answer to a [`SearchRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub report: String,
    pub status: String,
    pub outcome: SearchOutcome,
}

impl SearchResponse {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            report: format!("Search failed: {message}"),
            status: format!("Error: {message}"),
            outcome: SearchOutcome::Error,
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            report: "Search was cancelled before it completed.".to_string(),
            status: "Cancelled".to_string(),
            outcome: SearchOutcome::Cancelled,
        }
    }
}
