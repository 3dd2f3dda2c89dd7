//! The generic spawn-and-stream supervisor (§4.1).
//!
//! [`stream`] is backend-agnostic: it knows how to launch a child process,
//! forward its stdout through a caller-supplied line parser, echo its
//! stderr, and synthesize a terminal event — nothing about Claude or Codex
//! leaks in here. Each backend adapter supplies the parser and an optional
//! exit hook and gets the full contract of §4.1 for free.

use async_stream::stream;
use futures::Stream;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::{ErrorCode, Event};

/// Bounded channel capacity for the internal stdout/stderr event queue.
const CHANNEL_CAPACITY: usize = 256;
/// Time to wait for a graceful SIGTERM exit before sending SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(5);
/// Maximum bytes captured from a single pipe before further lines on that
/// pipe are dropped (the queue keeps draining the pipe so the child never
/// blocks on a full one; only the resulting events are discarded).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// A line parser: string in, zero/one/many envelope events out. Returning
/// an empty vec means "skip this line" (malformed JSON, unknown tag, etc).
pub type LineParser = Arc<dyn Fn(&str) -> Vec<Event> + Send + Sync>;

/// An exit hook: exit code (`None` if the exit status could not be read at
/// all; on unix a signal-terminated process reports `Some(-1)`, not `None`)
/// plus the full accumulated stderr, producing the terminal event(s).
pub type ExitHook = Arc<dyn Fn(Option<i32>, &str) -> Vec<Event> + Send + Sync>;

/// Everything needed to launch the child process. Backend adapters build
/// this from a [`crate::query::Query`]; the streamer itself is agnostic to
/// how it was produced.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Path to the executable.
    pub program: PathBuf,
    /// Positional/flag arguments.
    pub args: Vec<OsString>,
    /// Working directory, if different from the current process's.
    pub cwd: Option<PathBuf>,
    /// Environment overlay, merged onto the inherited environment (overlay
    /// wins on key collision).
    pub env: HashMap<String, String>,
}

/// Spawns `spec` and streams envelope events per the §4.1 contract.
///
/// Stdin is closed. Stdout is split on LF and fed to `line_parser`; stderr
/// is split on LF and each non-empty trimmed line becomes a `Stderr` event
/// while the full text is accumulated for `exit_hook`. Aborting `signal`
/// sends SIGTERM, arms a 5s SIGKILL fallback, and terminates the stream with
/// `Error{code: Aborted}`. If the consumer drops the returned stream before
/// it completes, the child is killed unconditionally (`kill_on_drop`).
pub fn stream(
    spec: ProcessSpec,
    signal: CancellationToken,
    line_parser: LineParser,
    exit_hook: Option<ExitHook>,
) -> impl Stream<Item = Event> {
    stream! {
        if signal.is_cancelled() {
            yield Event::Error {
                error: "aborted before spawn".to_string(),
                code: ErrorCode::Aborted,
            };
            return;
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                yield Event::Error {
                    error: e.to_string(),
                    code: ErrorCode::ProcessCrashed,
                };
                return;
            }
        };

        let Some(stdout) = child.stdout.take() else {
            yield Event::Error {
                error: "child stdout pipe unavailable".to_string(),
                code: ErrorCode::ProcessCrashed,
            };
            return;
        };
        let Some(stderr) = child.stderr.take() else {
            yield Event::Error {
                error: "child stderr pipe unavailable".to_string(),
                code: ErrorCode::ProcessCrashed,
            };
            return;
        };

        let (tx, mut rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);

        let stdout_tx = tx.clone();
        let parser = Arc::clone(&line_parser);
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut total_bytes = 0usize;
            let mut capped = false;
            while let Ok(Some(line)) = lines.next_line().await {
                total_bytes += line.len();
                if total_bytes > MAX_OUTPUT_BYTES {
                    if !capped {
                        capped = true;
                        let _ = stdout_tx
                            .send(Event::Stderr {
                                data: format!(
                                    "stdout exceeded {MAX_OUTPUT_BYTES} bytes; further lines dropped"
                                ),
                            })
                            .await;
                    }
                    continue;
                }
                if line.is_empty() {
                    continue;
                }
                for event in parser(&line) {
                    if stdout_tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        });

        let stderr_tx = tx.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut accumulated = String::new();
            let mut total_bytes = 0usize;
            let mut capped = false;
            while let Ok(Some(line)) = lines.next_line().await {
                total_bytes += line.len();
                if total_bytes > MAX_OUTPUT_BYTES {
                    if !capped {
                        capped = true;
                        let _ = stderr_tx
                            .send(Event::Stderr {
                                data: format!(
                                    "stderr exceeded {MAX_OUTPUT_BYTES} bytes; further lines dropped"
                                ),
                            })
                            .await;
                    }
                    continue;
                }
                if !accumulated.is_empty() {
                    accumulated.push('\n');
                }
                accumulated.push_str(&line);
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = stderr_tx
                        .send(Event::Stderr { data: trimmed.to_string() })
                        .await;
                }
            }
            accumulated
        });
        drop(tx);

        let mut aborted = false;
        loop {
            tokio::select! {
                biased;
                () = signal.cancelled() => {
                    aborted = true;
                    break;
                }
                received = rx.recv() => {
                    match received {
                        Some(event) => yield event,
                        None => break,
                    }
                }
            }
        }

        // Stop draining the queue before awaiting the reader tasks below: if
        // the channel is full, a reader is parked in `send().await` waiting
        // for capacity only `rx.recv()` frees. Dropping `rx` here makes that
        // `send` return `Err` immediately instead of blocking forever, so
        // the reader tasks always unwind even when the abort happens mid-burst.
        drop(rx);

        let exit_status = if aborted {
            graceful_shutdown(&mut child).await
        } else {
            child.wait().await.ok()
        };

        let stderr_accum = stderr_task.await.unwrap_or_default();
        let _ = stdout_task.await;

        if aborted {
            yield Event::Error {
                error: "aborted".to_string(),
                code: ErrorCode::Aborted,
            };
            return;
        }

        let code = exit_status.and_then(|s| {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                s.code().or_else(|| s.signal().map(|_| -1))
            }
            #[cfg(not(unix))]
            {
                s.code()
            }
        });

        if let Some(hook) = exit_hook {
            for event in hook(code, &stderr_accum) {
                yield event;
            }
        } else if let Some(c) = code {
            if c != 0 {
                let message = if stderr_accum.trim().is_empty() {
                    format!("exit code {c}")
                } else {
                    stderr_accum.clone()
                };
                yield Event::Error {
                    error: message,
                    code: ErrorCode::ProcessCrashed,
                };
            }
        }
    }
}

/// Sends SIGTERM, waits up to [`KILL_GRACE`], then force-kills with SIGKILL.
#[cfg(unix)]
async fn graceful_shutdown(child: &mut Child) -> Option<std::process::ExitStatus> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return None;
    };
    let nix_pid = Pid::from_raw(pid.cast_signed());
    if signal::kill(nix_pid, Signal::SIGTERM).is_err() {
        // Process may have already exited; fall through to wait.
    }

    match tokio::time::timeout(KILL_GRACE, child.wait()).await {
        Ok(status) => status.ok(),
        Err(_) => {
            let _ = child.kill().await;
            child.wait().await.ok()
        }
    }
}

/// Windows: no graceful shutdown mechanism for console processes; terminate
/// immediately.
#[cfg(windows)]
async fn graceful_shutdown(child: &mut Child) -> Option<std::process::ExitStatus> {
    let _ = child.kill().await;
    child.wait().await.ok()
}
