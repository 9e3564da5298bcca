//! Matcher binary provisioning.
//!
//! The engine asks a [`MatcherProvider`] for an executable path before every search.
//! Failure is fatal for that request.

use std::path::PathBuf;

use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::BoxFut;

/// Minimum ripgrep major version whose output contract we rely on.
const MIN_RIPGREP_MAJOR: u32 = 13;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("'{binary}' was not found: {source}")]
    NotFound {
        binary: String,
        #[source]
        source: which::Error,
    },
    #[error("'{binary}' could not be probed: {message}")]
    ProbeFailed { binary: String, message: String },
    #[error("'{binary}' is not ripgrep 13 or newer (reported: {reported})")]
    Unsupported { binary: String, reported: String },
}

pub trait MatcherProvider: Send + Sync {
    /// Path to a runnable matcher executable.
    fn ensure_available(&self) -> BoxFut<'_, Result<PathBuf, ProvisionError>>;
}

/// Locates the matcher on `PATH` (or at an explicit path), checks its version once,
/// and reuses the result for later requests.
#[derive(Debug)]
pub struct SystemMatcher {
    binary: String,
    resolved: OnceCell<PathBuf>,
}

impl SystemMatcher {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            resolved: OnceCell::new(),
        }
    }
}

impl MatcherProvider for SystemMatcher {
    fn ensure_available(&self) -> BoxFut<'_, Result<PathBuf, ProvisionError>> {
        Box::pin(async move {
            let path = self
                .resolved
                .get_or_try_init(|| probe_backend(&self.binary))
                .await?;
            Ok(path.clone())
        })
    }
}

/// A matcher path that is already known to be good; no lookup, no probe.
#[derive(Debug, Clone)]
pub struct StaticMatcher {
    path: PathBuf,
}

impl StaticMatcher {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MatcherProvider for StaticMatcher {
    fn ensure_available(&self) -> BoxFut<'_, Result<PathBuf, ProvisionError>> {
        Box::pin(async move { Ok(self.path.clone()) })
    }
}

async fn probe_backend(binary: &str) -> Result<PathBuf, ProvisionError> {
    let resolved = which::which(binary).map_err(|source| ProvisionError::NotFound {
        binary: binary.to_string(),
        source,
    })?;
    let output = Command::new(&resolved)
        .arg("--version")
        .output()
        .await
        .map_err(|e| ProvisionError::ProbeFailed {
            binary: binary.to_string(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(ProvisionError::ProbeFailed {
            binary: binary.to_string(),
            message: format!("--version exited with {}", output.status),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("").trim();
    if first_line.to_ascii_lowercase().contains("ripgrep")
        && version_ok(first_line, MIN_RIPGREP_MAJOR)
    {
        tracing::debug!(path = %resolved.display(), version = first_line, "Matcher provisioned");
        return Ok(resolved);
    }
    Err(ProvisionError::Unsupported {
        binary: binary.to_string(),
        reported: first_line.to_string(),
    })
}

fn version_ok(line: &str, min_major: u32) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return false;
    }
    let ver = parts[1];
    let mut nums = ver.split('.');
    let major = nums.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);
    major >= min_major
}

#[cfg(test)]
mod tests {
    use super::{MatcherProvider, ProvisionError, StaticMatcher, SystemMatcher, version_ok};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[cfg(unix)]
    fn write_probe_script(path: &Path, version_line: &str) {
        use std::os::unix::fs::PermissionsExt;

        let content = format!("#!/bin/sh\necho \"{version_line}\"\n");
        fs::write(path, content).expect("write test probe script");
        let mut perms = fs::metadata(path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).expect("set executable bit");
    }

    #[test]
    fn version_ok_compares_major() {
        assert!(version_ok("ripgrep 14.1.0", 13));
        assert!(version_ok("ripgrep 13.0.0 (rev abc)", 13));
        assert!(!version_ok("ripgrep 12.1.1", 13));
        assert!(!version_ok("ripgrep", 13));
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let provider = SystemMatcher::new("trawl-definitely-not-a-real-binary");
        let err = provider.ensure_available().await.unwrap_err();
        assert!(matches!(err, ProvisionError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_accepts_recent_ripgrep() {
        let dir = tempdir().expect("tempdir");
        let script = dir.path().join("rg-probe.sh");
        write_probe_script(&script, "ripgrep 14.1.0");

        let provider = SystemMatcher::new(script.to_str().expect("utf8 path"));
        let path = provider.ensure_available().await.expect("probe succeeds");
        assert!(path.ends_with("rg-probe.sh"));

        // Cached: removing the script does not matter once provisioned.
        fs::remove_file(&script).unwrap();
        assert_eq!(provider.ensure_available().await.unwrap(), path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_rejects_other_tools() {
        let dir = tempdir().expect("tempdir");
        let script = dir.path().join("grep-probe.sh");
        write_probe_script(&script, "grep (GNU grep) 3.11");

        let provider = SystemMatcher::new(script.to_str().expect("utf8 path"));
        let err = provider.ensure_available().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn static_matcher_returns_its_path() {
        let provider = StaticMatcher::new("/opt/bin/rg");
        assert_eq!(
            provider.ensure_available().await.unwrap(),
            PathBuf::from("/opt/bin/rg")
        );
    }
}
