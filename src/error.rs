//! Error types for the script runner and the node adapter.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Coarse classification of a [`RunError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Execution,
    Filesystem,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("No code provided")]
    MissingCode,
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("command failed with exit code {}: {command}\n{stderr}", exit_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("timeout after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("failed to write script file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove script file {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".into())
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCode => ErrorKind::Validation,
            Self::Spawn { .. } | Self::Wait { .. } | Self::Failed { .. } | Self::Timeout(_) => {
                ErrorKind::Execution
            }
            Self::Write { .. } | Self::Cleanup { .. } => ErrorKind::Filesystem,
        }
    }
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("This node can only be run using a native executor (got {0}).")]
    UnsupportedExecutor(String),
    #[error(transparent)]
    Run(#[from] RunError),
}
