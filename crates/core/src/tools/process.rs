//! Deadline-bounded execution of external programs.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::error::ToolError;
use crate::metrics::{TOOL_DURATION, TOOL_INVOCATIONS};

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub(crate) struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program` with an argument vector and waits at most `deadline`.
///
/// No shell is involved. The child is killed if the deadline passes
/// or the returned future is dropped. On unix the child leads its own
/// process group, and a timeout kills the whole group so helpers it
/// spawned (ffmpeg under yt-dlp, for one) do not outlive it.
pub(crate) async fn run_tool(
    tool: &'static str,
    program: &Path,
    args: &[String],
    deadline: Duration,
) -> Result<ToolOutput, ToolError> {
    debug!(tool, program = %program.display(), ?args, "Invoking external tool");
    let start = Instant::now();

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::BinaryNotFound {
                tool,
                path: program.to_path_buf(),
            }
        } else {
            ToolError::Io(e)
        }
    });

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            record(tool, "spawn_failed", start);
            return Err(e);
        }
    };

    let pid = child.id();
    let output = match timeout(deadline, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            // Dropping the wait future drops the child, which kills it
            if let Some(pid) = pid {
                kill_process_group(tool, pid).await;
            }
            warn!(tool, timeout_secs = deadline.as_secs(), "External tool timed out, killed");
            record(tool, "timeout", start);
            return Err(ToolError::Timeout {
                tool,
                timeout_secs: deadline.as_secs(),
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

    if !output.status.success() {
        warn!(
            tool,
            code = ?output.status.code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "External tool failed"
        );
        record(tool, "failed", start);
        return Err(ToolError::Exited {
            tool,
            code: output.status.code(),
            stderr,
        });
    }

    info!(
        tool,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "External tool finished"
    );
    record(tool, "success", start);

    Ok(ToolOutput { stdout, stderr })
}

/// Sends SIGKILL to every process left in the group led by `pid`.
#[cfg(unix)]
async fn kill_process_group(tool: &'static str, pid: u32) {
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", pid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => debug!(tool, pid, "Killed process group"),
        // Nothing left in the group
        Ok(_) => debug!(tool, pid, "Process group already gone"),
        Err(e) => warn!(tool, pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_tool: &'static str, _pid: u32) {}

fn record(tool: &str, result: &str, start: Instant) {
    TOOL_INVOCATIONS.with_label_values(&[tool, result]).inc();
    TOOL_DURATION
        .with_label_values(&[tool])
        .observe(start.elapsed().as_secs_f64());
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_run_tool_success_captures_output() {
        let output = run_tool(
            "sh",
            Path::new("/bin/sh"),
            &sh("echo hello; echo warn >&2"),
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr, "warn");
    }

    #[tokio::test]
    async fn test_run_tool_nonzero_exit_keeps_stderr() {
        let err = run_tool(
            "sh",
            Path::new("/bin/sh"),
            &sh("echo geoblocked >&2; exit 3"),
            Duration::from_secs(10),
        )
        .await
        .unwrap_err();

        match err {
            ToolError::Exited { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "geoblocked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary() {
        let err = run_tool(
            "ghost",
            Path::new("/nonexistent/bin/ghost"),
            &[],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::BinaryNotFound { tool: "ghost", .. }));
    }

    #[tokio::test]
    async fn test_run_tool_timeout_kills_process() {
        let start = Instant::now();
        let err = run_tool(
            "sh",
            Path::new("/bin/sh"),
            &sh("sleep 30"),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { tool: "sh", .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    /// Whether `pid` names a process that has not exited.
    #[cfg(target_os = "linux")]
    fn is_alive(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            // State follows the parenthesised command name; zombies have exited
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_run_tool_timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

        let err = run_tool("sh", Path::new("/bin/sh"), &sh(&script), Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));

        let helper: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let mut alive = true;
        for _ in 0..40 {
            alive = is_alive(helper);
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!alive, "helper process {} outlived the timeout", helper);
    }

    #[tokio::test]
    async fn test_run_tool_does_not_interpret_shell_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("pwned");
        // Passed as a single argv entry to echo, never evaluated by a shell
        let arg = format!("x; touch {}", marker.display());
        let output = run_tool("echo", Path::new("echo"), &[arg.clone()], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), arg);
        assert!(!marker.exists());
    }
}
