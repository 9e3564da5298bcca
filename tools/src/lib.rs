//! Search orchestration engine - runs an external matcher over workspace roots and
//! turns its output into a capped, grouped report.
//!
//! Layering, leaf first:
//!
//! ```text
//! search::parser        <path>:<line>:<content> text -> Match
//! search::adapter       one matcher process per target, exit mapping, cancellation
//! search::orchestrator  target resolution, path rewriting, global cap
//! search::format        grouping, ordering, report + status
//! search::SearchEngine  request -> SearchResponse (never fails past this point)
//! ```

pub mod config;
pub mod process;
pub mod provision;
pub mod scope;
pub mod search;

use std::future::Future;
use std::io;
use std::pin::Pin;

pub use config::SearchToolConfig;
pub use provision::{MatcherProvider, ProvisionError, StaticMatcher, SystemMatcher};
pub use scope::{ScopeError, ScopeErrorKind, ScopeResolver, WorkspaceRoots, WorkspaceScope};
pub use search::SearchEngine;
pub use tokio_util::sync::CancellationToken;

/// Future returned by object-safe async seams.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything that can stop a search from producing a result.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid search request: {message}")]
    InvalidRequest { message: String },
    #[error("{0}")]
    Scope(#[from] ScopeError),
    #[error("Search matcher unavailable: {0}")]
    MatcherUnavailable(#[from] ProvisionError),
    #[error("Failed to launch {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: io::Error,
    },
    #[error("{message}")]
    MatcherFailed { message: String },
    #[error("Failed to read matcher output: {0}")]
    Io(#[from] io::Error),
    #[error("Search cancelled")]
    Cancelled,
}

impl SearchError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::{ScopeError, ScopeErrorKind, SearchError};

    #[test]
    fn scope_errors_display_their_message() {
        let err = SearchError::from(ScopeError::new(
            ScopeErrorKind::NotFound,
            "Path does not exist: missing.txt",
        ));
        assert_eq!(err.to_string(), "Path does not exist: missing.txt");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn launch_errors_include_os_text() {
        let err = SearchError::Launch {
            binary: "rg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(err.to_string(), "Failed to launch rg: No such file");
    }
}
