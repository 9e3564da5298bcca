//! Configuration types used by the search engine.
//!
//! File-level parsing lives in the binary; this is the resolved, validated form.

/// Maximum matches retained across all targets of one request.
pub const DEFAULT_TOTAL_CAP: usize = 20_000;

/// Worker threads handed to the matcher for each target.
pub const DEFAULT_MATCHER_THREADS: usize = 4;

/// Upper bound on captured matcher stderr.
pub const MAX_STDERR_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchToolConfig {
    /// Matcher binary name (looked up on `PATH`) or explicit path.
    pub binary: String,
    pub total_cap: usize,
    pub threads: usize,
}

impl Default for SearchToolConfig {
    fn default() -> Self {
        Self {
            binary: "rg".to_string(),
            total_cap: DEFAULT_TOTAL_CAP,
            threads: DEFAULT_MATCHER_THREADS,
        }
    }
}

impl SearchToolConfig {
    /// Apply optional overrides, clamping values that would make the engine useless.
    #[must_use]
    pub fn with_overrides(
        mut self,
        binary: Option<String>,
        total_cap: Option<usize>,
        threads: Option<usize>,
    ) -> Self {
        if let Some(binary) = binary.filter(|b| !b.trim().is_empty()) {
            self.binary = binary;
        }
        if let Some(cap) = total_cap {
            self.total_cap = cap.max(1);
        }
        if let Some(threads) = threads {
            self.threads = threads.clamp(1, 64);
        }
        self
    }
}
