use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "pyexec", about = "Run Python code in a subprocess and print its stdout", version)]
#[command(group(ArgGroup::new("source").args(["code", "file", "node"]).multiple(false)))]
pub struct Cli {
    /// Python source to run. Read from stdin when omitted and stdin is piped.
    #[arg(value_name = "CODE")]
    pub code: Option<String>,

    /// Read the Python source from a file.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Run a saved node (JSON with code, arguments, python_path, mod_path, conda_env).
    #[arg(long, value_name = "JSON_FILE")]
    pub node: Option<PathBuf>,

    /// Script arguments. A single value is split like a command line;
    /// repeat the flag to pass values verbatim.
    #[arg(short = 'a', long = "args", action = clap::ArgAction::Append, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Python interpreter (defaults to PYEXEC_PYTHON_PATH, then "python").
    #[arg(long = "python")]
    pub python: Option<String>,

    /// Directory inserted at the front of sys.path.
    #[arg(long = "mod-path")]
    pub mod_path: Option<String>,

    /// Run inside this conda environment.
    #[arg(long = "conda-env")]
    pub conda_env: Option<String>,

    /// Environment launcher (defaults to PYEXEC_CONDA_PATH, then "conda").
    #[arg(long = "conda-path")]
    pub conda_path: Option<String>,

    /// Kill the script after this many seconds.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub timeout: Option<u64>,

    /// Drop one trailing newline from the output.
    #[arg(long = "strip-final-newline")]
    pub strip_final_newline: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_args_collect() {
        let cli = Cli::try_parse_from(["pyexec", "print(1)", "-a", "--x", "-a", "1"]).unwrap();
        assert_eq!(cli.code.as_deref(), Some("print(1)"));
        assert_eq!(cli.args, vec!["--x", "1"]);
    }

    #[test]
    fn code_and_file_conflict() {
        assert!(Cli::try_parse_from(["pyexec", "print(1)", "--file", "a.py"]).is_err());
    }
}
