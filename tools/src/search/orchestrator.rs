//! Multi-root search: target resolution, per-target invocation, path rewriting, global cap.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use trawl_types::{AggregatedResult, Match, SearchRequest, SearchTarget, TargetKind};

use super::adapter::{TargetQuery, TargetSearcher};
use crate::SearchError;
use crate::scope::{ScopeResolver, WorkspaceRoots};

/// Expand a request into the ordered list of targets to search.
///
/// A scoped request yields exactly one target (or a scope error, before anything runs);
/// an unscoped one yields one directory target per workspace root.
pub fn resolve_targets(
    request: &SearchRequest,
    scope: &dyn ScopeResolver,
    roots: &dyn WorkspaceRoots,
) -> Result<Vec<SearchTarget>, SearchError> {
    if let Some(path) = request.scope_path.as_deref() {
        return Ok(vec![scope.resolve(path)?]);
    }
    Ok(roots
        .list_roots()
        .into_iter()
        .map(|root| SearchTarget::new(root, TargetKind::Directory))
        .collect())
}

/// Sequential multi-target search with a cap enforced at target boundaries.
#[derive(Debug, Clone)]
pub struct MultiRootSearch {
    base_dir: PathBuf,
    total_cap: usize,
}

impl MultiRootSearch {
    /// A `total_cap` of zero is treated as one.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, total_cap: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            total_cap: total_cap.max(1),
        }
    }

    /// Search `targets` in order.
    ///
    /// After each target's matches are appended, reaching the cap truncates the result to
    /// exactly `total_cap` entries and skips every remaining target. A target is never cut
    /// short mid-run.
    pub async fn run(
        &self,
        searcher: &dyn TargetSearcher,
        targets: &[SearchTarget],
        query: TargetQuery<'_>,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResult, SearchError> {
        let mut result = AggregatedResult::default();

        for (index, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            let found = searcher.search_target(target, query, cancel).await?;
            let anchor = target.anchor();
            result.matches.extend(found.into_iter().map(|m| Match {
                file_path: relative_display(Path::new(&m.file_path), &self.base_dir, &anchor),
                ..m
            }));

            if result.matches.len() >= self.total_cap {
                tracing::info!(
                    found = result.matches.len(),
                    cap = self.total_cap,
                    skipped_targets = targets.len() - index - 1,
                    "Search results capped"
                );
                result.matches.truncate(self.total_cap);
                result.truncated = true;
                break;
            }
        }

        Ok(result)
    }
}

/// Display form of a matched path: relative to `base` when under it, otherwise relative to
/// the target's `anchor`, otherwise unchanged. Always uses `/` separators.
fn relative_display(path: &Path, base: &Path, anchor: &Path) -> String {
    let rel = path
        .strip_prefix(base)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .or_else(|| {
            path.strip_prefix(anchor)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
        })
        .unwrap_or(path);
    normalize_path_text(&rel.to_string_lossy())
}

fn normalize_path_text(path: &str) -> String {
    path.replace('\\', "/")
}
