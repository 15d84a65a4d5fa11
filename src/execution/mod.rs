//! Script runner: stage the source, run the interpreter, capture stdout.

use std::{env, path::PathBuf, time::Duration, time::Instant};

use crate::{
    error::RunError,
    process::{python::build_command, ProcessLauncher, TokioLauncher},
    utils::strip_final_newline,
};

pub mod python;

use python::{prepare_source, ScriptFile};

pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_ENV_LAUNCHER: &str = "conda";

/// One invocation's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub source_code: String,
    pub arguments: Vec<String>,
    pub interpreter_path: String,
    pub module_path: String,
    pub environment_name: String,
    pub environment_launcher_path: String,
}

impl ScriptRequest {
    pub fn new(source_code: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            arguments: Vec::new(),
            interpreter_path: DEFAULT_INTERPRETER.to_string(),
            module_path: String::new(),
            environment_name: String::new(),
            environment_launcher_path: DEFAULT_ENV_LAUNCHER.to_string(),
        }
    }

    pub fn arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn interpreter_path(mut self, path: impl Into<String>) -> Self {
        self.interpreter_path = path.into();
        self
    }

    pub fn module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = path.into();
        self
    }

    pub fn environment_name(mut self, name: impl Into<String>) -> Self {
        self.environment_name = name.into();
        self
    }

    pub fn environment_launcher_path(mut self, path: impl Into<String>) -> Self {
        self.environment_launcher_path = path.into();
        self
    }
}

/// Knobs that are not part of the request itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Kill the interpreter after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Drop one trailing newline from the captured output.
    pub strip_final_newline: bool,
    /// Where script files go; defaults to the OS temp directory.
    pub script_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
}

/// Run `req` with default options and return the captured stdout.
pub async fn run(req: &ScriptRequest) -> Result<String, RunError> {
    run_with(req, &RunOptions::default(), &TokioLauncher)
        .await
        .map(|r| r.stdout)
}

/// Run `req` through `launcher`.
///
/// The script file is removed before this returns, whatever the outcome.
pub async fn run_with(
    req: &ScriptRequest,
    opts: &RunOptions,
    launcher: &dyn ProcessLauncher,
) -> Result<ExecutionResult, RunError> {
    if req.source_code.is_empty() {
        return Err(RunError::MissingCode);
    }

    let source = prepare_source(&req.source_code, &req.module_path);
    let dir = opts.script_dir.clone().unwrap_or_else(env::temp_dir);
    let script = ScriptFile::create(&dir, &source).await?;

    let spec = build_command(req, script.path());
    tracing::debug!(
        command = %spec.display(),
        script = %script.path().display(),
        "launching python script"
    );

    let started = Instant::now();
    let outcome = match launcher.launch(&spec, opts.timeout).await {
        Ok(out) if out.success => Ok(out.stdout),
        Ok(out) => Err(RunError::Failed {
            command: spec.display(),
            code: out.code,
            stderr: out.stderr,
        }),
        Err(e) => Err(e),
    };

    match (outcome, script.remove()) {
        (Ok(stdout), Ok(())) => {
            tracing::info!(
                elapsed = ?started.elapsed(),
                bytes = stdout.len(),
                "python script finished"
            );
            let stdout = if opts.strip_final_newline {
                strip_final_newline(stdout)
            } else {
                stdout
            };
            Ok(ExecutionResult { stdout })
        }
        (Ok(_), Err(cleanup)) => Err(cleanup),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup)) => {
            tracing::warn!(error = %cleanup, "script cleanup failed after execution error");
            Err(e)
        }
    }
}
