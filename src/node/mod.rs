//! "Run Python Code" graph node: resolves node data and wired inputs into a
//! [`ScriptRequest`] and runs it.
//!
//! Each optional setting has a static value in [`NodeData`] and a toggle that
//! switches it to the graph input of the same name.

use std::{collections::HashMap, fmt};

use serde::Deserialize;

use crate::{
    error::NodeError,
    execution::{run_with, RunOptions, ScriptRequest, DEFAULT_ENV_LAUNCHER, DEFAULT_INTERPRETER},
    process::ProcessLauncher,
    utils::split_args,
};

pub const INPUT_CODE: &str = "code";
pub const INPUT_ARGUMENTS: &str = "arguments";
pub const INPUT_PYTHON_PATH: &str = "python_path";
pub const INPUT_MOD_PATH: &str = "mod_path";
pub const INPUT_CONDA_ENV: &str = "conda_env";

/// The host's execution context. Only `Native` can spawn processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executor {
    Native,
    Browser,
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Native => write!(f, "native"),
            Executor::Browser => write!(f, "browser"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeData {
    pub code: String,
    pub arguments: String,
    pub python_path: String,
    pub mod_path: String,
    pub conda_env: String,
    pub use_arguments_input: bool,
    pub use_python_path_input: bool,
    pub use_mod_path_input: bool,
    pub use_conda_env_input: bool,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            code: String::new(),
            arguments: String::new(),
            python_path: DEFAULT_INTERPRETER.to_string(),
            mod_path: String::new(),
            conda_env: String::new(),
            use_arguments_input: false,
            use_python_path_input: false,
            use_mod_path_input: false,
            use_conda_env_input: false,
        }
    }
}

impl NodeData {
    /// Parse saved node data. A missing `python_path` takes `default_python`
    /// rather than the built-in interpreter name.
    pub fn from_json(text: &str, default_python: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let has_python = value.get(INPUT_PYTHON_PATH).is_some();
        let mut data: NodeData = serde_json::from_value(value)?;
        if !has_python {
            data.python_path = default_python.to_string();
        }
        Ok(data)
    }
}

/// A value arriving on an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    String(String),
    StringArray(Vec<String>),
}

impl InputValue {
    /// Coerce to a single string; arrays are joined with newlines.
    pub fn as_string(&self) -> String {
        match self {
            InputValue::String(s) => s.clone(),
            InputValue::StringArray(v) => v.join("\n"),
        }
    }
}

pub type NodeInputs = HashMap<String, InputValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutputs {
    pub output: String,
}

/// Settings that are not node data but come from the surrounding runtime.
#[derive(Debug, Clone, Default)]
pub struct NodeContext {
    pub run: RunOptions,
    /// Overrides the `conda` launcher.
    pub env_launcher: Option<String>,
}

fn input_or_data(data_value: &str, toggle: bool, inputs: &NodeInputs, port: &str) -> String {
    if toggle {
        if let Some(v) = inputs.get(port) {
            return v.as_string();
        }
    }
    data_value.to_string()
}

/// Resolve node data and inputs into a request.
pub fn resolve_request(data: &NodeData, inputs: &NodeInputs, ctx: &NodeContext) -> ScriptRequest {
    let arguments = match inputs.get(INPUT_ARGUMENTS) {
        Some(InputValue::StringArray(v)) if data.use_arguments_input => v.clone(),
        Some(InputValue::String(s)) if data.use_arguments_input => split_args(s),
        _ => split_args(&data.arguments),
    };

    let code = inputs.get(INPUT_CODE).map(InputValue::as_string).unwrap_or_default();

    let mut python_path = input_or_data(
        &data.python_path,
        data.use_python_path_input,
        inputs,
        INPUT_PYTHON_PATH,
    );
    if python_path.is_empty() {
        python_path = DEFAULT_INTERPRETER.to_string();
    }
    let mod_path = input_or_data(&data.mod_path, data.use_mod_path_input, inputs, INPUT_MOD_PATH);
    let conda_env = input_or_data(&data.conda_env, data.use_conda_env_input, inputs, INPUT_CONDA_ENV);

    ScriptRequest::new(code)
        .arguments(arguments)
        .interpreter_path(python_path)
        .module_path(mod_path)
        .environment_name(conda_env)
        .environment_launcher_path(
            ctx.env_launcher.clone().unwrap_or_else(|| DEFAULT_ENV_LAUNCHER.to_string()),
        )
}

/// Node entry point. Refuses to run outside a native executor.
pub async fn process(
    data: &NodeData,
    inputs: &NodeInputs,
    executor: Executor,
    ctx: &NodeContext,
    launcher: &dyn ProcessLauncher,
) -> Result<NodeOutputs, NodeError> {
    if executor != Executor::Native {
        return Err(NodeError::UnsupportedExecutor(executor.to_string()));
    }
    let req = resolve_request(data, inputs, ctx);
    let res = run_with(&req, &ctx.run, launcher).await?;
    Ok(NodeOutputs { output: res.stdout })
}
