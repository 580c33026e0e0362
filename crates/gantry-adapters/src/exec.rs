//! Subprocess execution
//!
//! Every invocation captures full stdout/stderr and exit code, and is
//! recorded in a running transcript so callers can always see which stage
//! failed. Timeouts and missing executables are distinguished from ordinary
//! non-zero exits because they drive different orchestration branches.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

/// Outcome of one subprocess invocation
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// The bounded wait elapsed; the child was killed
    pub timed_out: bool,
    /// The executable does not exist; treated as "toolchain absent"
    pub not_found: bool,
}

impl CommandOutcome {
    fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_code: 1,
            stdout: String::new(),
            stderr: format!("Command timed out after {:.1}s", timeout.as_secs_f64()),
            timed_out: true,
            not_found: false,
        }
    }

    fn not_found(program: &str) -> Self {
        Self {
            exit_code: 127,
            stdout: String::new(),
            stderr: format!("Command not found: {program}"),
            timed_out: false,
            not_found: true,
        }
    }

    fn spawn_failed(program: &str, err: &std::io::Error) -> Self {
        Self {
            exit_code: 1,
            stdout: String::new(),
            stderr: format!("Failed to run {program}: {err}"),
            timed_out: false,
            not_found: false,
        }
    }
}

/// Run *argv* in *cwd* with a bounded wait.
///
/// Never returns an error: spawn failures, timeouts, and missing
/// executables are all folded into the outcome so the orchestration state
/// machine can branch on them.
pub async fn run_command(argv: &[String], cwd: &Path, timeout: Duration) -> CommandOutcome {
    let Some((program, args)) = argv.split_first() else {
        return CommandOutcome::spawn_failed(
            "<empty>",
            &std::io::Error::new(ErrorKind::InvalidInput, "empty command"),
        );
    };

    debug!(command = %argv.join(" "), cwd = %cwd.display(), "spawning");

    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return CommandOutcome::not_found(program);
        }
        Err(err) => return CommandOutcome::spawn_failed(program, &err),
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Err(_elapsed) => CommandOutcome::timed_out(timeout),
        Ok(Err(err)) => CommandOutcome::spawn_failed(program, &err),
        Ok(Ok(output)) => CommandOutcome {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
            not_found: false,
        },
    }
}

/// Running diagnostic log for one `run_tests` call
///
/// Appended to regardless of outcome, so the final `raw_output` always
/// names the stage (build, execute, parse) that produced a failure.
#[derive(Debug, Default)]
pub struct Transcript {
    parts: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the diagnostic block for one invocation
    pub fn record(&mut self, argv: &[String], outcome: &CommandOutcome) {
        let mut block = vec![
            format!("$ {}", argv.join(" ")),
            format!("exit_code={}", outcome.exit_code),
        ];
        if !outcome.stdout.is_empty() {
            block.push(outcome.stdout.clone());
        }
        if !outcome.stderr.is_empty() {
            block.push(outcome.stderr.clone());
        }
        self.parts.push(block.join("\n"));
    }

    /// Append free-form diagnostic text
    pub fn note(&mut self, text: impl Into<String>) {
        self.parts.push(text.into());
    }

    pub fn render(&self) -> String {
        self.parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_executable_reports_not_found() {
        let outcome = run_command(
            &argv(&["gantry-no-such-binary-xyz"]),
            Path::new("."),
            Duration::from_secs(5),
        )
        .await;

        assert!(outcome.not_found);
        assert!(!outcome.timed_out);
        assert_eq!(outcome.exit_code, 127);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_flagged() {
        let outcome = run_command(
            &argv(&["sleep", "5"]),
            Path::new("."),
            Duration::from_millis(50),
        )
        .await;

        assert!(outcome.timed_out);
        assert!(!outcome.not_found);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_captured() {
        let outcome = run_command(
            &argv(&["echo", "hello"]),
            Path::new("."),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout.trim(), "hello");
    }

    #[test]
    fn test_transcript_block_layout() {
        let mut transcript = Transcript::new();
        transcript.record(
            &argv(&["ctest", "--output-on-failure"]),
            &CommandOutcome {
                exit_code: 2,
                stdout: "1 test failed".to_string(),
                stderr: String::new(),
                timed_out: false,
                not_found: false,
            },
        );
        transcript.note("No Google Test binaries found for direct execution.");

        let rendered = transcript.render();
        assert!(rendered.starts_with("$ ctest --output-on-failure\nexit_code=2\n1 test failed"));
        assert!(rendered.contains("\n\nNo Google Test binaries found"));
    }
}
