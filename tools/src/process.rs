//! Matcher subprocess management.

/// RAII guard that kills a child process (and its process group on Unix) on drop.
///
/// Wrap a spawned `tokio::process::Child` immediately after `spawn()` so a dropped search
/// future never leaves a matcher running. Call `disarm()` after the process exits normally.
pub struct ChildGuard {
    child: Option<tokio::process::Child>,
}

impl ChildGuard {
    #[must_use]
    pub fn new(child: tokio::process::Child) -> Self {
        Self { child: Some(child) }
    }

    pub fn child_mut(&mut self) -> &mut tokio::process::Child {
        self.child.as_mut().expect("child present")
    }

    pub fn disarm(&mut self) {
        self.child = None;
    }

    /// Kill the child (whole process group on Unix) and reap it.
    pub async fn terminate(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        #[cfg(unix)]
        kill_group(child);
        let _ = child.start_kill();
        if let Err(err) = child.wait().await {
            tracing::debug!("Failed to reap terminated matcher: {err}");
        }
        self.child = None;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        #[cfg(unix)]
        kill_group(child);
        let _ = child.start_kill();
        let _ = child.try_wait();
    }
}

#[cfg(unix)]
fn kill_group(child: &tokio::process::Child) {
    if let Some(pid) = child.id() {
        unsafe {
            if libc::killpg(pid as i32, libc::SIGKILL) == -1 {
                tracing::trace!(pid, "killpg failed, falling back to direct kill");
            }
        }
    }
}

/// Put the child process in its own session (Unix only) so the entire process
/// group can be killed via `killpg` when a search is cancelled.
#[cfg(unix)]
pub fn set_new_session(cmd: &mut tokio::process::Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        cmd.as_std_mut().pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            // Linux-only: the matcher dies with us.
            #[cfg(target_os = "linux")]
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}
