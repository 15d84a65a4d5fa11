//! Run Python source as a subprocess and capture its standard output.
//!
//! [`execution::run`] is the core operation; [`node::process`] adapts it to a
//! workflow-graph node.

pub mod config;
pub mod error;
pub mod execution;
pub mod node;
pub mod process;
pub mod utils;

pub use error::{ErrorKind, NodeError, RunError};
pub use execution::{run, run_with, ExecutionResult, RunOptions, ScriptRequest};
