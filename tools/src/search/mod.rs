//! Pattern search over workspace roots backed by ripgrep.

pub mod adapter;
pub mod format;
pub mod orchestrator;
mod parser;

use std::path::PathBuf;
use std::sync::Arc;

use globset::GlobBuilder;
use tokio_util::sync::CancellationToken;
use trawl_types::{AggregatedResult, SearchRequest, SearchResponse};

pub use adapter::{RipgrepAdapter, TargetQuery, TargetSearcher};
pub use format::format_response;
pub use orchestrator::{MultiRootSearch, resolve_targets};

use crate::provision::MatcherProvider;
use crate::scope::{ScopeResolver, WorkspaceRoots};
use crate::{SearchError, SearchToolConfig};

/// Request-level entry point: resolves targets, provisions the matcher, runs the
/// multi-root search, and renders the response.
pub struct SearchEngine {
    config: SearchToolConfig,
    provider: Arc<dyn MatcherProvider>,
    scope: Arc<dyn ScopeResolver>,
    roots: Arc<dyn WorkspaceRoots>,
    base_dir: PathBuf,
}

impl SearchEngine {
    /// `base_dir` is the directory match paths are reported relative to. A `total_cap` of
    /// zero is raised to one.
    pub fn new(
        mut config: SearchToolConfig,
        provider: Arc<dyn MatcherProvider>,
        scope: Arc<dyn ScopeResolver>,
        roots: Arc<dyn WorkspaceRoots>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        config.total_cap = config.total_cap.max(1);
        Self {
            config,
            provider,
            scope,
            roots,
            base_dir: base_dir.into(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SearchToolConfig {
        &self.config
    }

    /// Run one request to completion. Failures and cancellation come back as structured
    /// responses, never as `Err`.
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> SearchResponse {
        match self.try_search(request, cancel).await {
            Ok(result) => format_response(request, &result, self.config.total_cap),
            Err(SearchError::Cancelled) => {
                tracing::info!(pattern = %request.pattern, "Search cancelled");
                SearchResponse::cancelled()
            }
            Err(SearchError::Scope(err)) => {
                tracing::warn!(
                    pattern = %request.pattern,
                    kind = %err.kind,
                    "Scope rejected: {err}"
                );
                SearchResponse::error(err.to_string())
            }
            Err(err) => {
                tracing::warn!(pattern = %request.pattern, "Search failed: {err}");
                SearchResponse::error(err.to_string())
            }
        }
    }

    /// Like [`SearchEngine::search`] but keeps the raw aggregated result and typed error.
    pub async fn try_search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResult, SearchError> {
        if let Some(glob) = request.include() {
            validate_glob(glob)?;
        }

        let targets = resolve_targets(request, self.scope.as_ref(), self.roots.as_ref())?;
        if targets.is_empty() {
            tracing::debug!("No workspace roots configured; nothing to search");
            return Ok(AggregatedResult::default());
        }

        let binary = self.provider.ensure_available().await?;
        let adapter = RipgrepAdapter::new(binary, &self.config);
        let query = TargetQuery {
            pattern: request.pattern.as_str(),
            include_glob: request.include(),
        };

        MultiRootSearch::new(self.base_dir.clone(), self.config.total_cap)
            .run(&adapter, &targets, query, cancel)
            .await
    }
}

fn validate_glob(glob: &str) -> Result<(), SearchError> {
    GlobBuilder::new(glob)
        .build()
        .map(|_| ())
        .map_err(|e| SearchError::InvalidRequest {
            message: format!("Invalid include glob '{glob}': {e}"),
        })
}
