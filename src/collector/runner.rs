//! Blocking command execution with a bounded timeout.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::CollectorFailure;
use crate::types::CommandResult;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs `cmd_str` in `cwd`, capturing stdout and stderr separately.
///
/// Uses POSIX shell-style quoting rules via `shell_words::split`. A non-zero
/// exit status is returned as a normal result; only spawn failures and
/// timeouts are errors.
///
/// # Errors
/// Returns `CollectorFailure` if the command cannot be parsed, spawned, or
/// does not finish within `timeout`.
pub fn run_with_timeout(
    cmd_str: &str,
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandResult, CollectorFailure> {
    let start = Instant::now();
    let parts = shell_words::split(cmd_str).map_err(|e| CollectorFailure::BadCommand {
        command: cmd_str.to_string(),
        reason: e.to_string(),
    })?;
    let Some((program, args)) = parts.split_first() else {
        return Err(CollectorFailure::BadCommand {
            command: cmd_str.to_string(),
            reason: "empty command".to_string(),
        });
    };

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CollectorFailure::Spawn {
            command: cmd_str.to_string(),
            reason: e.to_string(),
        })?;

    // Pipes are drained on side threads so a chatty tool cannot fill the
    // buffer and deadlock against our wait loop.
    let out_reader = child.stdout.take().map(spawn_stream_reader);
    let err_reader = child.stderr.take().map(spawn_stream_reader);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                // Readers are left detached: a grandchild may still hold the pipe.
                return Err(CollectorFailure::Timeout {
                    command: cmd_str.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(CollectorFailure::Spawn {
                    command: cmd_str.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    };

    let stdout = join_reader(out_reader);
    let stderr = join_reader(err_reader);

    Ok(CommandResult::new(
        cmd_str.to_string(),
        status.code().unwrap_or(-1),
        stdout,
        stderr,
    ))
}

fn spawn_stream_reader<R: Read + Send + 'static>(mut input: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = input.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn captures_stdout() {
        let result = run_with_timeout("echo hello", &root(), Duration::from_secs(5));
        let result = result.expect("echo should run");
        assert!(result.passed());
        assert!(result.output().contains("hello"));
    }

    #[test]
    fn quoted_args_preserved() {
        let result = run_with_timeout("echo \"a b\" 'c d'", &root(), Duration::from_secs(5))
            .expect("echo should run");
        assert!(result.output().contains("a b c d"));
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let result = run_with_timeout("sh -c 'echo oops >&2; exit 2'", &root(), Duration::from_secs(5))
            .expect("sh should run");
        assert_eq!(result.exit_code(), 2);
        assert_eq!(result.headline(), Some("oops"));
    }

    #[test]
    fn timeout_is_reported() {
        let err = run_with_timeout("sleep 5", &root(), Duration::from_millis(200)).err();
        assert!(matches!(err, Some(CollectorFailure::Timeout { .. })));
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let err = run_with_timeout("nonexistent_binary_xyz_123", &root(), Duration::from_secs(5)).err();
        assert!(matches!(err, Some(CollectorFailure::Spawn { .. })));
    }

    #[test]
    fn empty_and_unbalanced_commands_are_rejected() {
        let err = run_with_timeout("   ", &root(), Duration::from_secs(5)).err();
        assert!(matches!(err, Some(CollectorFailure::BadCommand { .. })));
        let err = run_with_timeout("echo \"open", &root(), Duration::from_secs(5)).err();
        assert!(matches!(err, Some(CollectorFailure::BadCommand { .. })));
    }
}
