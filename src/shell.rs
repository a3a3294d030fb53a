//! Timeout-bounded execution of external read-only queries (git, lsof, osascript).
//!
//! One [`ShellGateway`] owns a single process slot: commands sent to the same
//! instance run one after another. Providers that must not queue behind each other
//! get their own instance.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::ShellError;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const DEFAULT_SHELL: &str = "/bin/sh";

/// Runs a shell command line and returns its trimmed, non-empty output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command: &str, working_dir: Option<&Path>)
        -> Result<String, ShellError>;
}

pub struct ShellGateway {
    shell: PathBuf,
    timeout: Duration,
    slot: Mutex<()>,
}

impl ShellGateway {
    pub fn new(timeout: Duration) -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            timeout,
            slot: Mutex::new(()),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run_process(
        &self,
        command: &str,
        working_dir: Option<&Path>,
    ) -> Result<String, ShellError> {
        // `exec 2>&1` folds stderr into stdout for every stage of a pipeline.
        let script = format!("exec 2>&1; {command}");

        let mut process = Command::new(&self.shell);
        process
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        // Own process group, so a timeout reaches everything the command started.
        #[cfg(unix)]
        process.process_group(0);
        if let Some(dir) = working_dir {
            process.current_dir(dir);
        }

        let mut child = process
            .spawn()
            .map_err(|err| ShellError::Unknown(format!("failed to spawn: {err}")))?;
        let mut group = ProcessGroupGuard::new(child.id());
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShellError::Unknown("stdout was not captured".into()))?;

        let mut output = Vec::new();
        let (status, read) = tokio::select! {
            finished = async { tokio::join!(child.wait(), stdout.read_to_end(&mut output)) } => finished,
            _ = tokio::time::sleep(self.timeout) => {
                group.kill();
                if let Err(err) = child.kill().await {
                    log_warn!("failed to kill timed out command `{command}`: {err}");
                }
                return Err(ShellError::Timeout);
            }
        };
        group.disarm();

        let status = status.map_err(|err| ShellError::Unknown(err.to_string()))?;
        read.map_err(|err| ShellError::Unknown(err.to_string()))?;

        if !status.success() {
            return Err(ShellError::ExecutionFailed(status.code().unwrap_or(-1)));
        }

        let text = String::from_utf8_lossy(&output).trim().to_string();
        if text.is_empty() {
            return Err(ShellError::EmptyOutput);
        }

        Ok(text)
    }
}

/// Kills the command's process group when dropped, unless disarmed. Covers the
/// caller dropping `execute` before the command finishes.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => log_warn!("failed to kill process group {pgid}: {err}"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

#[async_trait]
impl CommandRunner for ShellGateway {
    async fn execute(
        &self,
        command: &str,
        working_dir: Option<&Path>,
    ) -> Result<String, ShellError> {
        let _slot = self.slot.lock().await;

        let started = Instant::now();
        let result = self.run_process(command, working_dir).await;
        log_debug!(
            "shell `{}` finished in {}ms: {}",
            command,
            started.elapsed().as_millis(),
            match &result {
                Ok(_) => "ok".to_string(),
                Err(err) => err.to_string(),
            }
        );

        result
    }
}

/// Quote a value for inclusion in a `/bin/sh` command line.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn gateway(timeout_ms: u64) -> ShellGateway {
        ShellGateway::new(Duration::from_millis(timeout_ms))
    }

    fn process_alive(pid: &str) -> bool {
        let output = std::process::Command::new("ps")
            .args(["-o", "stat=", "-p", pid])
            .output()
            .unwrap();
        let stat = String::from_utf8_lossy(&output.stdout);
        let stat = stat.trim();
        !stat.is_empty() && !stat.starts_with('Z')
    }

    async fn wait_until_gone(pid: &str) -> bool {
        for _ in 0..20 {
            if !process_alive(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    async fn read_pid(path: &Path) -> String {
        for _ in 0..20 {
            if let Ok(pid) = std::fs::read_to_string(path) {
                if !pid.trim().is_empty() {
                    return pid.trim().to_string();
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("background pid was never written");
    }

    #[tokio::test]
    async fn returns_trimmed_output() {
        let output = gateway(2_000).execute("echo '  hello  '", None).await;
        assert_eq!(output, Ok("hello".to_string()));
    }

    #[tokio::test]
    async fn captures_stderr_with_stdout() {
        let output = gateway(2_000)
            .execute("echo out; echo err 1>&2", None)
            .await
            .unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[tokio::test]
    async fn empty_output_is_surfaced() {
        let output = gateway(2_000).execute("true", None).await;
        assert_eq!(output, Err(ShellError::EmptyOutput));
    }

    #[tokio::test]
    async fn non_zero_exit_is_execution_failure() {
        let output = gateway(2_000).execute("echo nope; exit 3", None).await;
        assert_eq!(output, Err(ShellError::ExecutionFailed(3)));
    }

    #[tokio::test]
    async fn slow_command_times_out_promptly() {
        let started = Instant::now();
        let output = gateway(100).execute("sleep 5", None).await;
        assert_eq!(output, Err(ShellError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));

        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("sleep.pid");
        let command = format!(
            "sleep 30 & echo $! > {}; wait",
            shell_quote(&pidfile.to_string_lossy())
        );
        let output = gateway(300).execute(&command, None).await;
        assert_eq!(output, Err(ShellError::Timeout));

        let pid = read_pid(&pidfile).await;
        assert!(wait_until_gone(&pid).await, "background sleep {pid} outlived the timeout");
    }

    #[tokio::test]
    async fn dropped_command_takes_its_children_along() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("sleep.pid");
        let command = format!(
            "sleep 30 & echo $! > {}; wait",
            shell_quote(&pidfile.to_string_lossy())
        );

        let shell = gateway(60_000);
        let outcome =
            tokio::time::timeout(Duration::from_millis(300), shell.execute(&command, None)).await;
        assert!(outcome.is_err());

        let pid = read_pid(&pidfile).await;
        assert!(wait_until_gone(&pid).await, "background sleep {pid} outlived its caller");
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = gateway(2_000).execute("pwd -P", Some(dir.path())).await.unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(PathBuf::from(output), expected);
    }

    #[tokio::test]
    async fn missing_working_directory_is_unknown_error() {
        let output = gateway(2_000)
            .execute("pwd", Some(Path::new("/definitely/not/here")))
            .await;
        assert!(matches!(output, Err(ShellError::Unknown(_))));
    }

    #[tokio::test]
    async fn commands_on_one_gateway_are_serialized() {
        let shell = Arc::new(gateway(2_000));
        let started = Instant::now();

        let first = {
            let shell = Arc::clone(&shell);
            tokio::spawn(async move { shell.execute("sleep 0.3; echo a", None).await })
        };
        let second = {
            let shell = Arc::clone(&shell);
            tokio::spawn(async move { shell.execute("sleep 0.3; echo b", None).await })
        };

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert!(started.elapsed() >= Duration::from_millis(600));
    }

    #[test]
    fn quotes_embedded_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
