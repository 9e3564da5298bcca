//! Search scope resolution and workspace roots.
//!
//! A scope path from a request must already exist, must be a regular file or a directory,
//! and (unless configured otherwise) must live under one of the workspace roots.

use std::fmt;
use std::path::{Path, PathBuf};

use trawl_types::{SearchTarget, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeErrorKind {
    InvalidPath,
    NotFound,
    NotFileOrDirectory,
    OutsideWorkspace,
}

impl fmt::Display for ScopeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScopeErrorKind::InvalidPath => "invalid_path",
            ScopeErrorKind::NotFound => "not_found",
            ScopeErrorKind::NotFileOrDirectory => "not_file_or_directory",
            ScopeErrorKind::OutsideWorkspace => "outside_workspace",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ScopeError {
    pub kind: ScopeErrorKind,
    pub message: String,
}

impl ScopeError {
    pub fn new(kind: ScopeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Turns a user-supplied scope path into exactly one search target.
pub trait ScopeResolver: Send + Sync {
    fn resolve(&self, input: &str) -> Result<SearchTarget, ScopeError>;
}

/// Ordered workspace roots searched when a request has no scope.
pub trait WorkspaceRoots: Send + Sync {
    fn list_roots(&self) -> Vec<PathBuf>;
}

/// Filesystem-backed scope policy over a fixed list of roots.
#[derive(Debug, Clone)]
pub struct WorkspaceScope {
    roots: Vec<PathBuf>,
    working_dir: PathBuf,
    allow_outside_roots: bool,
}

impl WorkspaceScope {
    /// Canonicalize `roots`; every root must exist and be a directory.
    pub fn new(roots: Vec<PathBuf>, allow_outside_roots: bool) -> Result<Self, ScopeError> {
        let mut canonical_roots = Vec::with_capacity(roots.len());
        for root in roots {
            let canonical = std::fs::canonicalize(&root).map_err(|e| {
                ScopeError::new(
                    ScopeErrorKind::NotFound,
                    format!("Workspace root {} is not accessible: {e}", root.display()),
                )
            })?;
            if !canonical.is_dir() {
                return Err(ScopeError::new(
                    ScopeErrorKind::NotFileOrDirectory,
                    format!("Workspace root {} is not a directory", root.display()),
                ));
            }
            if !canonical_roots.contains(&canonical) {
                canonical_roots.push(canonical);
            }
        }
        let working_dir = canonical_roots
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            roots: canonical_roots,
            working_dir,
            allow_outside_roots,
        })
    }

    /// Directory relative scope paths are resolved against. Defaults to the first root.
    #[must_use]
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn is_within_roots(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

impl ScopeResolver for WorkspaceScope {
    fn resolve(&self, input: &str) -> Result<SearchTarget, ScopeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ScopeError::new(
                ScopeErrorKind::InvalidPath,
                "Search path must not be empty",
            ));
        }
        if contains_unsafe_path_chars(trimmed) {
            return Err(ScopeError::new(
                ScopeErrorKind::InvalidPath,
                "Search path contains invalid control characters",
            ));
        }

        let raw = Path::new(trimmed);
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.working_dir.join(raw)
        };
        let canonical = std::fs::canonicalize(&joined).map_err(|_| {
            ScopeError::new(
                ScopeErrorKind::NotFound,
                format!("Path does not exist: {trimmed}"),
            )
        })?;

        let metadata = std::fs::metadata(&canonical).map_err(|e| {
            ScopeError::new(
                ScopeErrorKind::NotFound,
                format!("Cannot access {trimmed}: {e}"),
            )
        })?;
        let kind = if metadata.is_dir() {
            TargetKind::Directory
        } else if metadata.is_file() {
            TargetKind::File
        } else {
            return Err(ScopeError::new(
                ScopeErrorKind::NotFileOrDirectory,
                format!("Path is not a file or directory: {trimmed}"),
            ));
        };

        if !self.allow_outside_roots && !self.is_within_roots(&canonical) {
            return Err(ScopeError::new(
                ScopeErrorKind::OutsideWorkspace,
                format!("Path is outside the workspace: {trimmed}"),
            ));
        }

        Ok(SearchTarget::new(canonical, kind))
    }
}

impl WorkspaceRoots for WorkspaceScope {
    fn list_roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }
}

fn contains_unsafe_path_chars(input: &str) -> bool {
    input.chars().any(is_unsafe_path_char)
}

/// C0/C1 control characters and DEL.
fn is_unsafe_path_char(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001f}' | '\u{007f}' | '\u{0080}'..='\u{009f}')
}
