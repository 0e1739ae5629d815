//! Command Runner
//!
//! Runs the translator as a supervised child process. Output from stdout and
//! stderr is merged into one stream of normalized lines and delivered over a
//! channel, followed by exactly one `Finished` event.
//!
//! Cancellation is cooperative: the supervisor notices the flag, stops
//! forwarding output, asks the child to terminate and force-kills it once the
//! grace period runs out.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::core::{decode_line, Invocation};

/// Line emitted after a run was cancelled
pub const INTERRUPTED_MESSAGE: &str = "Translation interrupted by user";

/// Exit code reported for cancelled runs
pub const CANCELLED_EXIT_CODE: i32 = -1;

/// How often the supervisor checks the cancel flag
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Callback invoked after every event, e.g. to wake the UI
pub type EventNotifier = Arc<dyn Fn() + Send + Sync>;

/// Shared cancellation flag for a run
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for one supervised run
#[derive(Clone)]
pub struct RunOptions {
    /// Working directory
    pub working_directory: Option<PathBuf>,
    /// Time between the graceful termination request and the forced kill
    pub grace_period: Duration,
    /// Cancel token to use; a fresh one is created when `None`
    pub cancel: Option<CancelToken>,
    /// Called after each event is queued
    pub notify: Option<EventNotifier>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            working_directory: None,
            grace_period: Duration::from_secs(5),
            cancel: None,
            notify: None,
        }
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("working_directory", &self.working_directory)
            .field("grace_period", &self.grace_period)
            .field("cancel", &self.cancel)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit code; negative signal number when killed by a signal, -1 when cancelled
    pub exit_code: i32,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Wall time from spawn to reap
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == 0
    }

    /// Completion line shown in the console and written to the log
    pub fn summary(&self) -> String {
        let status = if self.success() {
            "completed"
        } else {
            "interrupted or failed"
        };
        format!("Translation {}, return code: {}", status, self.exit_code)
    }
}

/// Events delivered to the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// One normalized output line
    Line(String),
    /// The run is over; nothing follows this event
    Finished(RunOutcome),
}

/// Command runner errors
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Binary '{0}' not found. Install it or add to PATH.")]
    BinaryNotFound(String),

    #[error("Failed to launch process: {0}")]
    LaunchFailed(String),

    #[error("Runner stopped without reporting an exit status")]
    Disconnected,
}

/// Command runner for the translator process
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    /// Environment variables to add
    env_additions: HashMap<String, String>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default().with_env("PYTHONUNBUFFERED", "1").with_env("PYTHONIOENCODING", "utf-8")
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_additions.insert(key.into(), value.into());
        self
    }

    /// Find a binary in PATH
    pub fn which(binary: &str) -> Option<PathBuf> {
        which::which(binary).ok()
    }

    /// Resolve the program to an executable path
    fn resolve_program(program: &str) -> Result<PathBuf, RunError> {
        let path = std::path::Path::new(program);
        if path.components().count() > 1 || path.exists() {
            return Ok(path.to_path_buf());
        }
        Self::which(program).ok_or_else(|| RunError::BinaryNotFound(program.to_string()))
    }

    /// Start the child and its supervisor
    pub fn spawn(
        &self,
        invocation: &Invocation,
        options: &RunOptions,
    ) -> Result<RunHandle, RunError> {
        let program = Self::resolve_program(&invocation.program)?;

        let mut cmd = Command::new(&program);
        cmd.args(&invocation.args);

        if let Some(dir) = &options.working_directory {
            cmd.current_dir(dir);
        }

        for (k, v) in &self.env_additions {
            cmd.env(k, v);
        }

        // stdout and stderr share one pipe so their relative order survives
        let (reader, writer) =
            std::io::pipe().map_err(|e| RunError::LaunchFailed(e.to_string()))?;
        let stderr_writer = writer
            .try_clone()
            .map_err(|e| RunError::LaunchFailed(e.to_string()))?;

        cmd.stdin(Stdio::null());
        cmd.stdout(writer);
        cmd.stderr(stderr_writer);

        // Own process group so termination reaches the interpreter behind `uv run`
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let spawned = cmd.spawn();
        // The command keeps the parent's write ends; close them so EOF arrives
        drop(cmd);
        let child =
            spawned.map_err(|e| RunError::LaunchFailed(format!("{}: {}", program.display(), e)))?;

        let pid = child.id();
        tracing::info!(pid, "Started {}", invocation.display());

        let (line_tx, line_rx) = crossbeam_channel::unbounded();
        spawn_reader(pid, reader, line_tx);

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let cancel = options.cancel.clone().unwrap_or_default();

        let supervisor = Supervisor {
            child,
            lines: line_rx,
            events: event_tx,
            cancel: cancel.clone(),
            grace_period: options.grace_period,
            notify: options.notify.clone(),
            started: Instant::now(),
        };

        let join = std::thread::Builder::new()
            .name(format!("runner-{}", pid))
            .spawn(move || supervisor.run())
            .map_err(|e| RunError::LaunchFailed(e.to_string()))?;

        Ok(RunHandle {
            events: event_rx,
            cancel,
            pid,
            supervisor: Some(join),
        })
    }

    /// Run to completion, feeding each line to `sink`
    pub fn run_blocking(
        &self,
        invocation: &Invocation,
        options: &RunOptions,
        mut sink: impl FnMut(&str),
    ) -> Result<RunOutcome, RunError> {
        let handle = self.spawn(invocation, options)?;

        for event in handle.events().iter() {
            match event {
                RunEvent::Line(line) => sink(&line),
                RunEvent::Finished(outcome) => return Ok(outcome),
            }
        }

        Err(RunError::Disconnected)
    }

    /// Run to completion on the blocking pool
    pub async fn run_async<F>(
        &self,
        invocation: Invocation,
        options: RunOptions,
        sink: F,
    ) -> Result<RunOutcome, RunError>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let runner = self.clone();

        tokio::task::spawn_blocking(move || runner.run_blocking(&invocation, &options, sink))
            .await
            .map_err(|e| RunError::LaunchFailed(e.to_string()))?
    }
}

/// Handle to a running child
pub struct RunHandle {
    events: Receiver<RunEvent>,
    cancel: CancelToken,
    pid: u32,
    supervisor: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Event stream
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Drain the events available right now
    pub fn try_events(&self) -> impl Iterator<Item = RunEvent> + '_ {
        self.events.try_iter()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(pid = self.pid, "Cancellation requested");
        }
        self.cancel.cancel();
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if let Some(join) = self.supervisor.take() {
            if !join.is_finished() {
                self.cancel();
            }
            let _ = join.join();
        }
    }
}

/// Owns the child for the lifetime of a run
struct Supervisor {
    child: Child,
    lines: Receiver<String>,
    events: Sender<RunEvent>,
    cancel: CancelToken,
    grace_period: Duration,
    notify: Option<EventNotifier>,
    started: Instant,
}

impl Supervisor {
    fn run(mut self) {
        let outcome = match self.forward_output() {
            Some(status) => RunOutcome {
                exit_code: exit_code(status),
                cancelled: false,
                elapsed: self.started.elapsed(),
            },
            None => {
                self.shut_down();
                self.emit(RunEvent::Line(INTERRUPTED_MESSAGE.to_string()));
                RunOutcome {
                    exit_code: CANCELLED_EXIT_CODE,
                    cancelled: true,
                    elapsed: self.started.elapsed(),
                }
            }
        };

        tracing::info!(
            pid = self.child.id(),
            exit_code = outcome.exit_code,
            cancelled = outcome.cancelled,
            "Run finished in {:.1}s",
            outcome.elapsed.as_secs_f64()
        );
        self.emit(RunEvent::Finished(outcome));
    }

    /// Relay lines until the child exits. `None` means cancelled.
    fn forward_output(&mut self) -> Option<ExitStatus> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    if !self.emit(RunEvent::Line(line)) {
                        // Nobody is listening anymore
                        self.cancel.cancel();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Pipes closed; the child may still be running
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            match self.child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    tracing::warn!("Failed to poll child: {}", e);
                    return self.child.wait().ok();
                }
            }
        }
    }

    /// Graceful termination, escalating to a kill after the grace period
    fn shut_down(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }

        request_termination(&mut self.child);

        let deadline = Instant::now() + self.grace_period;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(_) => break,
            }
        }

        tracing::warn!(
            pid = self.child.id(),
            "Child ignored termination for {:?}, killing",
            self.grace_period
        );
        force_kill(&mut self.child);
        let _ = self.child.wait();
    }

    fn emit(&self, event: RunEvent) -> bool {
        let delivered = self.events.send(event).is_ok();
        if let Some(notify) = &self.notify {
            notify();
        }
        delivered
    }
}

/// Forward lines from the merged output pipe until EOF
fn spawn_reader<R: Read + Send + 'static>(pid: u32, pipe: R, lines: Sender<String>) {
    let spawned = std::thread::Builder::new()
        .name(format!("runner-{}-output", pid))
        .spawn(move || {
            let mut reader = BufReader::new(pipe);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if lines.send(decode_line(&buf)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(pid, "Reading output failed: {}", e);
                        break;
                    }
                }
            }
        });

    if let Err(e) = spawned {
        tracing::error!(pid, "Failed to start output reader: {}", e);
    }
}

/// Map an exit status the way shells do: the code, or minus the signal number
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    CANCELLED_EXIT_CODE
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGTERM) {
        tracing::debug!("SIGTERM to group {} failed: {}", pgid, e);
        let _ = child.kill();
    }
}

#[cfg(unix)]
fn force_kill(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let _ = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL);
    let _ = child.kill();
}

// No graceful request exists for console-less children; TerminateProcess it is
#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(not(unix))]
fn force_kill(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options_default() {
        let opts = RunOptions::default();
        assert_eq!(opts.grace_period, Duration::from_secs(5));
        assert!(opts.working_directory.is_none());
        assert!(opts.cancel.is_none());
    }

    #[test]
    fn test_command_runner_new_sets_python_env() {
        let runner = CommandRunner::new();
        assert_eq!(
            runner.env_additions.get("PYTHONUNBUFFERED"),
            Some(&"1".to_string())
        );
    }

    #[test]
    fn test_command_runner_with_env() {
        let runner = CommandRunner::new()
            .with_env("FOO", "bar")
            .with_env("BAZ", "qux");

        assert_eq!(runner.env_additions.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(runner.env_additions.get("BAZ"), Some(&"qux".to_string()));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_error_display() {
        let err = RunError::BinaryNotFound("uv".to_string());
        assert!(err.to_string().contains("uv"));
    }

    #[test]
    fn test_missing_binary() {
        let inv = Invocation {
            program: "definitely-not-a-real-translator-binary".to_string(),
            args: vec![],
        };
        let result = CommandRunner::new().spawn(&inv, &RunOptions::default());
        assert!(matches!(result, Err(RunError::BinaryNotFound(_))));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_merged_output_and_exit_code() {
        let mut lines = Vec::new();
        let outcome = CommandRunner::new()
            .run_blocking(
                &sh("echo one; echo two 1>&2; printf '\\033[31mred\\033[0m\\n'; exit 3"),
                &RunOptions::default(),
                |line| lines.push(line.to_string()),
            )
            .unwrap();

        assert_eq!(outcome.exit_code, 3);
        assert!(!outcome.cancelled);
        assert!(!outcome.success());
        assert_eq!(lines, vec!["one", "two", "red"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_and_stderr_keep_order() {
        let script = "i=1; while [ $i -le 10 ]; do echo out$i; echo err$i 1>&2; i=$((i+1)); done";
        let expected: Vec<String> = (1..=10)
            .flat_map(|i| [format!("out{}", i), format!("err{}", i)])
            .collect();

        for _ in 0..20 {
            let mut lines = Vec::new();
            CommandRunner::new()
                .run_blocking(&sh(script), &RunOptions::default(), |line| {
                    lines.push(line.to_string())
                })
                .unwrap();
            assert_eq!(lines, expected);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_dropping_handle_cancels_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("echo started; sleep 3; touch '{}'", marker.display());

        let handle = CommandRunner::new()
            .spawn(&sh(&script), &RunOptions::default())
            .unwrap();
        let first = handle.events().recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(first, RunEvent::Line("started".to_string()));

        let start = Instant::now();
        drop(handle);
        assert!(start.elapsed() < Duration::from_secs(3));

        std::thread::sleep(Duration::from_secs(4));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();

        let mut lines = Vec::new();
        let options = RunOptions {
            working_directory: Some(dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let outcome = CommandRunner::new()
            .run_blocking(&sh("ls"), &options, |line| lines.push(line.to_string()))
            .unwrap();

        assert!(outcome.success());
        assert_eq!(lines, vec!["marker.txt".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_exit_is_negative() {
        let outcome = CommandRunner::new()
            .run_blocking(&sh("kill -KILL $$"), &RunOptions::default(), |_| {})
            .unwrap();
        assert_eq!(outcome.exit_code, -9);
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_terminates_child() {
        let handle = CommandRunner::new()
            .spawn(&sh("echo started; sleep 30"), &RunOptions::default())
            .unwrap();

        let first = handle.events().recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(first, RunEvent::Line("started".to_string()));

        let start = Instant::now();
        handle.cancel();

        let events: Vec<RunEvent> = handle.events().iter().collect();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(
            events.first(),
            Some(&RunEvent::Line(INTERRUPTED_MESSAGE.to_string()))
        );
        match events.last() {
            Some(RunEvent::Finished(outcome)) => {
                assert!(outcome.cancelled);
                assert_eq!(outcome.exit_code, CANCELLED_EXIT_CODE);
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_escalates_to_kill() {
        let options = RunOptions {
            grace_period: Duration::from_millis(300),
            ..RunOptions::default()
        };
        let handle = CommandRunner::new()
            .spawn(&sh("trap '' TERM; echo ready; sleep 30"), &options)
            .unwrap();

        let first = handle.events().recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(first, RunEvent::Line("ready".to_string()));

        let start = Instant::now();
        handle.cancel();
        let finished = handle
            .events()
            .iter()
            .find_map(|e| match e {
                RunEvent::Finished(outcome) => Some(outcome),
                RunEvent::Line(_) => None,
            })
            .unwrap();

        assert!(finished.cancelled);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_cancel_token() {
        let token = CancelToken::new();
        token.cancel();
        let options = RunOptions {
            cancel: Some(token),
            ..RunOptions::default()
        };

        let outcome = CommandRunner::new()
            .run_blocking(&sh("sleep 30"), &options, |_| {})
            .unwrap();
        assert!(outcome.cancelled);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_async() {
        let outcome = tokio_test::block_on(CommandRunner::new().run_async(
            sh("echo async"),
            RunOptions::default(),
            |_| {},
        ));
        assert!(outcome.unwrap().success());
    }
}
