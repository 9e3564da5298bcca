//! One matcher process per search target.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trawl_types::{Match, SearchTarget, TargetKind};

use super::parser::parse_output;
use crate::config::MAX_STDERR_BYTES;
use crate::process::ChildGuard;
use crate::{BoxFut, SearchError, SearchToolConfig};

/// Files and directories never worth searching inside a directory target.
pub(crate) const EXCLUDE_GLOBS: &[&str] = &[
    // Version control metadata
    "!**/.git/**",
    "!**/.svn/**",
    "!**/.hg/**",
    // Dependencies and package caches
    "!**/node_modules/**",
    "!**/bower_components/**",
    "!**/vendor/**",
    "!**/.venv/**",
    "!**/__pycache__/**",
    // Build output
    "!**/target/**",
    "!**/dist/**",
    "!**/build/**",
    "!**/out/**",
    "!**/.next/**",
    // Logs and temporaries
    "!*.log",
    "!*.tmp",
    "!*.temp",
    "!*.swp",
];

/// Pattern and filter shared by every target of one request.
#[derive(Debug, Clone, Copy)]
pub struct TargetQuery<'a> {
    pub pattern: &'a str,
    pub include_glob: Option<&'a str>,
}

/// Searches a single target and returns its matches with absolute paths.
pub trait TargetSearcher: Send + Sync {
    fn search_target<'a>(
        &'a self,
        target: &'a SearchTarget,
        query: TargetQuery<'a>,
        cancel: &'a CancellationToken,
    ) -> BoxFut<'a, Result<Vec<Match>, SearchError>>;
}

/// ripgrep-backed [`TargetSearcher`].
#[derive(Debug, Clone)]
pub struct RipgrepAdapter {
    binary: PathBuf,
    threads: usize,
}

impl RipgrepAdapter {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, config: &SearchToolConfig) -> Self {
        Self {
            binary: binary.into(),
            threads: config.threads,
        }
    }

    async fn run(
        &self,
        target: &SearchTarget,
        query: TargetQuery<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Match>, SearchError> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let args = build_args(target, query, self.threads);
        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        crate::process::set_new_session(&mut cmd);

        tracing::debug!(
            path = %target.path.display(),
            args = args.len(),
            "Spawning matcher"
        );
        let child = cmd.spawn().map_err(|source| SearchError::Launch {
            binary: self.binary.display().to_string(),
            source,
        })?;
        let mut guard = ChildGuard::new(child);

        let stdout = guard
            .child_mut()
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("failed to capture stdout"))?;
        let mut stderr = guard
            .child_mut()
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("failed to capture stderr"))?;

        let stdout_task: JoinHandle<io::Result<Vec<u8>>> = tokio::spawn(async move {
            let mut stdout = stdout;
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await?;
            Ok(buf)
        });
        let stderr_task: JoinHandle<String> = tokio::spawn(async move {
            let mut buf = Vec::with_capacity(1024);
            let _ = (&mut stderr)
                .take(MAX_STDERR_BYTES)
                .read_to_end(&mut buf)
                .await;
            // Keep draining so a chatty matcher never blocks on a full pipe.
            let _ = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                guard.terminate().await;
                stdout_task.abort();
                stderr_task.abort();
                tracing::debug!(path = %target.path.display(), "Matcher cancelled");
                return Err(SearchError::Cancelled);
            }
            status = guard.child_mut().wait() => status?,
        };
        guard.disarm();

        // Exit and cancellation can race; a cancelled request never reports success.
        if cancel.is_cancelled() {
            stdout_task.abort();
            stderr_task.abort();
            return Err(SearchError::Cancelled);
        }

        let stdout = stdout_task.await.map_err(io::Error::other)??;
        let stderr = stderr_task
            .await
            .unwrap_or_else(|e| format!("[stderr task failed: {e}]"));

        match status.code() {
            Some(0) => Ok(parse_output(&String::from_utf8_lossy(&stdout))),
            Some(1) => Ok(Vec::new()),
            code => {
                let message = failure_message(status, &stderr);
                tracing::warn!(path = %target.path.display(), ?code, "{message}");
                Err(SearchError::MatcherFailed { message })
            }
        }
    }
}

impl TargetSearcher for RipgrepAdapter {
    fn search_target<'a>(
        &'a self,
        target: &'a SearchTarget,
        query: TargetQuery<'a>,
        cancel: &'a CancellationToken,
    ) -> BoxFut<'a, Result<Vec<Match>, SearchError>> {
        Box::pin(self.run(target, query, cancel))
    }
}

/// The fixed matcher argument contract for one target.
pub(crate) fn build_args(
    target: &SearchTarget,
    query: TargetQuery<'_>,
    threads: usize,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--no-config",
        "--color=never",
        "--line-number",
        "--no-heading",
        "--with-filename",
        "--ignore-case",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push("--threads".into());
    args.push(threads.max(1).to_string().into());

    if target.kind == TargetKind::Directory {
        if let Some(include) = query.include_glob {
            args.push("--glob".into());
            args.push(include.into());
        }
        for exclude in EXCLUDE_GLOBS {
            args.push("--glob".into());
            args.push((*exclude).into());
        }
    }

    args.push("--regexp".into());
    args.push(query.pattern.into());
    args.push("--".into());
    args.push(target.path.clone().into_os_string());
    args
}

fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    let exit = match status.code() {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    };
    if stderr.is_empty() {
        format!("Matcher exited with {exit}")
    } else {
        format!("Matcher exited with {exit}: {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::{EXCLUDE_GLOBS, TargetQuery, build_args};
    use std::ffi::OsString;
    use trawl_types::{SearchTarget, TargetKind};

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn directory_target_gets_include_and_excludes() {
        let target = SearchTarget::new("/work/repo", TargetKind::Directory);
        let query = TargetQuery {
            pattern: "foo",
            include_glob: Some("*.rs"),
        };
        let args = strings(&build_args(&target, query, 4));

        for flag in [
            "--line-number",
            "--no-heading",
            "--with-filename",
            "--ignore-case",
        ] {
            assert!(args.iter().any(|a| a == flag), "missing {flag}");
        }
        let threads = args.iter().position(|a| a == "--threads").unwrap();
        assert_eq!(args[threads + 1], "4");

        let first_glob = args.iter().position(|a| a == "--glob").unwrap();
        assert_eq!(args[first_glob + 1], "*.rs");
        let glob_count = args.iter().filter(|a| *a == "--glob").count();
        assert_eq!(glob_count, EXCLUDE_GLOBS.len() + 1);
        assert!(args.iter().any(|a| a == "!**/.git/**"));
        assert!(args.iter().any(|a| a == "!**/node_modules/**"));

        let n = args.len();
        assert_eq!(&args[n - 4..], ["--regexp", "foo", "--", "/work/repo"]);
    }

    #[test]
    fn file_target_never_gets_globs() {
        let target = SearchTarget::new("/work/repo/src/lib.rs", TargetKind::File);
        let query = TargetQuery {
            pattern: "foo",
            include_glob: Some("*.py"),
        };
        let args = strings(&build_args(&target, query, 4));

        assert!(!args.iter().any(|a| a == "--glob"));
        assert!(!args.iter().any(|a| a == "*.py"));
        assert_eq!(args.last().map(String::as_str), Some("/work/repo/src/lib.rs"));
    }

    #[test]
    fn pattern_starting_with_dash_stays_a_pattern() {
        let target = SearchTarget::new("/w", TargetKind::Directory);
        let query = TargetQuery {
            pattern: "--help",
            include_glob: None,
        };
        let args = strings(&build_args(&target, query, 2));
        let idx = args.iter().position(|a| a == "--regexp").unwrap();
        assert_eq!(args[idx + 1], "--help");
        assert_eq!(args.iter().filter(|a| *a == "--glob").count(), EXCLUDE_GLOBS.len());
    }
}
