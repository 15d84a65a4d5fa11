//! Python command-line construction (direct or inside a conda environment).

use std::path::Path;

use super::CommandSpec;
use crate::execution::ScriptRequest;

/// Build the command that runs `script` for `req`.
///
/// Without an environment the interpreter is spawned directly. With one, a
/// single shell string `<launcher> run -n <env> <python> <script> <args...>`
/// is handed to the platform shell. That string is not escaped: a value with
/// shell metacharacters is interpreted by the shell.
pub fn build_command(req: &ScriptRequest, script: &Path) -> CommandSpec {
    let script = script.to_string_lossy().into_owned();

    if req.environment_name.is_empty() {
        let mut args = Vec::with_capacity(1 + req.arguments.len());
        args.push(script);
        args.extend(req.arguments.iter().cloned());
        return CommandSpec::new(req.interpreter_path.clone(), args);
    }

    let line = format!(
        "{} run -n {} {} {} {}",
        req.environment_launcher_path,
        req.environment_name,
        req.interpreter_path,
        script,
        req.arguments.join(" ")
    );
    shell_wrap(line)
}

/// Wrap a command string for the platform shell.
pub fn shell_wrap(line: String) -> CommandSpec {
    if cfg!(windows) {
        CommandSpec::new("cmd.exe", vec!["/c".into(), line])
    } else {
        CommandSpec::new("bash", vec!["-c".into(), line])
    }
}
