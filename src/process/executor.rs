//! Subprocess executor.
//!
//! Runs a command with bounded wall-clock time and captures stdout and stderr
//! separately. Every call produces an [`ExecutionOutcome`]: launch failures and
//! timeouts are encoded in the outcome rather than returned as errors.

use super::{ExecutionOutcome, LAUNCH_FAILURE_EXIT_CODE, ProcessRequest, UNKNOWN_EXIT_CODE};
use chrono::Utc;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Longest sleep between two `try_wait` polls.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Minimum time spent collecting output once the process is gone.
const MIN_DRAIN: Duration = Duration::from_millis(500);

/// Execute a command described by `request`.
///
/// The program is spawned directly (no shell). When the timeout expires the
/// process group receives SIGTERM, then SIGKILL after `kill_grace`. Once the
/// direct child is gone its group is killed, and output collection stops at
/// the request deadline even if an escaped descendant still holds a pipe.
pub fn execute(request: &ProcessRequest<'_>, kill_grace: Duration) -> ExecutionOutcome {
    let started_at = Utc::now();
    let start = Instant::now();
    let command_str = shell_words::join(request.argv);

    let Some((program, args)) = request.argv.split_first() else {
        return ExecutionOutcome {
            command: command_str,
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: "failed to launch command: argument vector is empty".to_string(),
            elapsed: start.elapsed(),
            timed_out: false,
            started_at,
        };
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(request.working_dir)
        .envs(request.env)
        .stdin(if request.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group so a timeout can take down grandchildren too.
        command.process_group(0);
    }

    tracing::debug!(
        command = %command_str,
        cwd = %request.working_dir.display(),
        timeout_secs = request.timeout.as_secs_f64(),
        "spawning"
    );

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(program = %program, error = %e, "failed to launch");
            return ExecutionOutcome {
                command: command_str,
                exit_code: LAUNCH_FAILURE_EXIT_CODE,
                stdout: String::new(),
                stderr: format!(
                    "failed to launch '{}': {}\n\
                     Fix: ensure '{}' is installed and in PATH, or set its path in the config.",
                    program, e, program
                ),
                elapsed: start.elapsed(),
                timed_out: false,
                started_at,
            };
        }
    };

    // The writer is detached: a descendant holding stdin open must not stall the call.
    if let (Some(input), Some(mut pipe)) = (request.stdin, child.stdin.take()) {
        let input = input.to_string();
        thread::spawn(move || {
            // A child that exits without reading stdin closes the pipe; ignore EPIPE.
            let _ = pipe.write_all(input.as_bytes());
        });
    }

    let (chunk_tx, chunk_rx) = mpsc::channel();
    if let Some(pipe) = child.stdout.take() {
        spawn_reader(pipe, Stream::Stdout, chunk_tx.clone());
    }
    if let Some(pipe) = child.stderr.take() {
        spawn_reader(pipe, Stream::Stderr, chunk_tx.clone());
    }
    drop(chunk_tx);

    let (status, timed_out, wait_error) = wait_with_timeout(&mut child, request.timeout, kill_grace);
    if status.is_some() && !timed_out {
        // Background descendants would otherwise keep the output pipes open.
        kill_group(&child);
    }

    let drain_floor = Instant::now() + MIN_DRAIN;
    let drain_until = start
        .checked_add(request.timeout)
        .map_or(drain_floor, |deadline| deadline.max(drain_floor));
    let (stdout, mut stderr, drained) = collect_output(&chunk_rx, drain_until);
    if !drained {
        tracing::warn!(
            command = %command_str,
            "output pipes still open after the process exited; keeping partial output"
        );
    }
    if let Some(e) = wait_error {
        if !stderr.is_empty() && !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        stderr.push_str(&format!("failed to check process status: {}", e));
    }

    let elapsed = start.elapsed();
    let exit_code = status.map(exit_code_of).unwrap_or(UNKNOWN_EXIT_CODE);

    if timed_out {
        tracing::warn!(
            command = %command_str,
            elapsed_secs = elapsed.as_secs_f64(),
            "timed out; process terminated"
        );
    } else {
        tracing::info!(
            command = %command_str,
            exit_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "finished"
        );
    }

    ExecutionOutcome {
        command: command_str,
        exit_code,
        stdout,
        stderr,
        elapsed,
        timed_out,
        started_at,
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Forward everything read from `pipe` as chunks; the sender drops at EOF.
fn spawn_reader<R: Read + Send + 'static>(
    mut pipe: R,
    stream: Stream,
    chunks: mpsc::Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if chunks.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
}

/// Gather output chunks until both readers hit EOF or `deadline` passes.
///
/// Returns (stdout, stderr, whether both streams reached EOF).
fn collect_output(
    chunks: &mpsc::Receiver<(Stream, Vec<u8>)>,
    deadline: Instant,
) -> (String, String, bool) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let drained = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match chunks.recv_timeout(remaining) {
            Ok((Stream::Stdout, bytes)) => stdout.extend_from_slice(&bytes),
            Ok((Stream::Stderr, bytes)) => stderr.extend_from_slice(&bytes),
            Err(RecvTimeoutError::Disconnected) => break true,
            Err(RecvTimeoutError::Timeout) => break false,
        }
    };

    (
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
        drained,
    )
}

/// Wait for a child process with timeout.
///
/// Returns (exit status if reaped, timed_out, status check error).
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    kill_grace: Duration,
) -> (Option<ExitStatus>, bool, Option<std::io::Error>) {
    let start = Instant::now();
    let mut poll_interval = Duration::from_millis(5);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return (Some(status), false, None),
            Ok(None) => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    let status = terminate(child, kill_grace);
                    return (status, true, None);
                }
                thread::sleep(poll_interval.min(timeout - elapsed));
                poll_interval = (poll_interval * 2).min(MAX_POLL_INTERVAL);
            }
            Err(e) => {
                let status = terminate(child, kill_grace);
                return (status, false, Some(e));
            }
        }
    }
}

/// SIGKILL whatever is left in the child's process group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) with a negative pid signals the process group created
    // for this child; it has no memory-safety preconditions.
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

/// Terminate a child: cooperatively first, forcibly after `grace`.
#[cfg(unix)]
fn terminate(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    let pgid = child.id() as libc::pid_t;

    // SAFETY: same as in `kill_group`; only the signal differs.
    unsafe {
        libc::kill(-pgid, libc::SIGTERM);
    }

    let now = Instant::now();
    let deadline = now.checked_add(grace).unwrap_or(now);
    while Instant::now() < deadline {
        if let Ok(Some(status)) = child.try_wait() {
            // Take down any stragglers left in the group.
            kill_group(child);
            return Some(status);
        }
        thread::sleep(Duration::from_millis(20));
    }

    kill_group(child);
    let _ = child.kill();
    child.wait().ok()
}

#[cfg(not(unix))]
fn terminate(child: &mut Child, _grace: Duration) -> Option<ExitStatus> {
    let _ = child.kill();
    child.wait().ok()
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => UNKNOWN_EXIT_CODE,
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(UNKNOWN_EXIT_CODE)
}
