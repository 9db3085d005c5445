//! Helpers for running the external OCR command-line tools.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use super::backend::{CancelFlag, OcrError};

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run `cmd` to completion, killing it if `cancel` is raised.
///
/// stdout is discarded and stderr is captured to `stderr_path` so a chatty
/// tool cannot block on a full pipe while we poll it.
pub fn run_cancellable(
    cmd: &mut Command,
    tool: &str,
    install_hint: &str,
    stderr_path: &Path,
    cancel: &CancelFlag,
    poll_interval: Duration,
) -> Result<(), OcrError> {
    cancel.check()?;

    let stderr = File::create(stderr_path)?;
    let mut child = match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr))
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OcrError::BackendNotAvailable(format!(
                "{} not found ({})",
                tool, install_hint
            )));
        }
        Err(e) => return Err(OcrError::Io(e)),
    };

    loop {
        if cancel.is_cancelled() {
            tracing::debug!("Killing {} (pid {}) after cancellation", tool, child.id());
            let _ = child.kill();
            let _ = child.wait();
            return Err(OcrError::Cancelled);
        }

        match child.try_wait()? {
            Some(status) if status.success() => return Ok(()),
            Some(status) => {
                let stderr = std::fs::read_to_string(stderr_path).unwrap_or_default();
                return Err(OcrError::OcrFailed(format!(
                    "{} exited with {}: {}",
                    tool,
                    status,
                    stderr.trim()
                )));
            }
            None => std::thread::sleep(poll_interval),
        }
    }
}
