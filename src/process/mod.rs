//! Interpreter process launch (command line, spawn, output capture).

use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{process::Command, time::timeout};

use crate::error::RunError;

pub mod python;

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Human-readable form for logs and error messages.
    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Process-execution boundary. The runner only talks to the OS through this.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(
        &self,
        spec: &CommandSpec,
        limit: Option<Duration>,
    ) -> Result<CommandOutput, RunError>;
}

/// Launches children with `tokio::process`.
///
/// The child runs in its own process group (on Windows its tree is killed with
/// `taskkill /T`) so that a
/// timeout or a dropped future also takes down whatever it started, such as
/// the interpreter under `bash -c "conda run ..."`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

#[async_trait]
impl ProcessLauncher for TokioLauncher {
    async fn launch(
        &self,
        spec: &CommandSpec,
        limit: Option<Duration>,
    ) -> Result<CommandOutput, RunError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(cfg!(unix));
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| RunError::Spawn {
            program: spec.program.clone(),
            source: e,
        })?;
        let mut tree = TreeKill { pid: child.id() };

        let waited = match limit {
            Some(dur) => timeout(dur, child.wait_with_output())
                .await
                .map_err(|_| RunError::Timeout(dur))?,
            None => child.wait_with_output().await,
        };
        tree.disarm();

        let out = waited.map_err(|e| RunError::Wait {
            program: spec.program.clone(),
            source: e,
        })?;

        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

/// Kills the child's process tree on drop unless disarmed.
struct TreeKill {
    pid: Option<u32>,
}

impl TreeKill {
    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for TreeKill {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            tracing::debug!(pid, "killing interpreter process tree");
            kill_tree(pid);
        }
    }
}

#[cfg(unix)]
fn kill_tree(pid: u32) {
    use nix::{
        sys::signal::{killpg, Signal},
        unistd::Pid,
    };
    // The child leads its own group, so the group id is its pid.
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        if e != nix::errno::Errno::ESRCH {
            tracing::warn!(pid, error = %e, "failed to kill process group");
        }
    }
}

#[cfg(windows)]
fn kill_tree(pid: u32) {
    let status = std::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        tracing::warn!(pid, error = %e, "failed to run taskkill");
    }
}

#[cfg(not(any(unix, windows)))]
fn kill_tree(_pid: u32) {}
