// Helper functions shared by the resolver backends

use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to collect output of {program}: {reason}")]
    Io { program: String, reason: String },

    #[error("Timed out after {0}s")]
    TimedOut(u64),
}

/// Run command with timeout, killing the child when the deadline passes
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, CommandError> {
    let io_error = |reason: String| CommandError::Io {
        program: program.to_string(),
        reason,
    };

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| io_error("stdout not captured".to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| io_error("stderr not captured".to_string()))?;

    let mut stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let mut stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    // The deadline covers the pipes too: a grandchild can keep them open
    // after the child itself has exited.
    let collect = async {
        let status = child
            .wait()
            .await
            .map_err(|e| io_error(format!("wait failed: {}", e)))?;
        let stdout = (&mut stdout_task)
            .await
            .map_err(|e| io_error(format!("stdout task failed: {}", e)))?
            .map_err(|e| io_error(format!("stdout read failed: {}", e)))?;
        let stderr = (&mut stderr_task)
            .await
            .map_err(|e| io_error(format!("stderr task failed: {}", e)))?
            .map_err(|e| io_error(format!("stderr read failed: {}", e)))?;
        Ok::<_, CommandError>(std::process::Output {
            status,
            stdout,
            stderr,
        })
    };

    let outcome = timeout(TokioDuration::from_secs(timeout_secs), collect).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(CommandError::TimedOut(timeout_secs))
        }
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`
pub fn truncate_detail(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Write an executable shell script into a fresh temp dir
#[cfg(all(test, unix))]
pub(crate) fn fake_executable(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_detail("ERROR: boom", 200), "ERROR: boom");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(300);
        let cut = truncate_detail(&text, 200);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with("..."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_collects_output() {
        let out = run_output_with_timeout(
            "sh",
            vec!["-c".to_string(), "echo hello; echo oops >&2".to_string()],
            5,
        )
        .await
        .unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
        assert_eq!(String::from_utf8_lossy(&out.stderr).trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_times_out() {
        let res =
            run_output_with_timeout("sh", vec!["-c".to_string(), "sleep 5".to_string()], 1).await;
        assert!(matches!(res, Err(CommandError::TimedOut(1))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_times_out_when_grandchild_holds_pipes() {
        let started = std::time::Instant::now();
        let res = run_output_with_timeout(
            "sh",
            vec!["-c".to_string(), "sleep 6 & echo early".to_string()],
            1,
        )
        .await;
        assert!(matches!(res, Err(CommandError::TimedOut(1))));
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let res = run_output_with_timeout("definitely-not-a-real-binary-xyz", Vec::new(), 1).await;
        assert!(matches!(res, Err(CommandError::Spawn { .. })));
    }
}
