use std::{fs, path::Path, process::Command, time::Duration};

use anyhow::Result;
use pyexec::{
    node::{self, Executor, InputValue, NodeContext, NodeData, NodeInputs},
    process::TokioLauncher,
    run_with, ErrorKind, RunError, RunOptions, ScriptRequest,
};

/// First interpreter on PATH that answers `--version`.
fn find_python() -> Option<&'static str> {
    ["python3", "python"].into_iter().find(|p| {
        Command::new(p)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

fn opts_in(dir: &Path) -> RunOptions {
    RunOptions { script_dir: Some(dir.to_path_buf()), ..Default::default() }
}

fn leftover_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_print_hi() -> Result<()> {
    let Some(python) = find_python() else {
        println!("No python interpreter on PATH, skipping");
        return Ok(());
    };
    let dir = tempfile::tempdir()?;

    let req = ScriptRequest::new("print('hi')").interpreter_path(python);
    let res = run_with(&req, &opts_in(dir.path()), &TokioLauncher).await?;

    assert_eq!(res.stdout.trim_end_matches(['\r', '\n']), "hi");
    assert!(res.stdout.ends_with('\n'));
    assert_eq!(leftover_files(dir.path()), 0);
    Ok(())
}

#[tokio::test]
async fn test_arguments_reach_sys_argv() -> Result<()> {
    let Some(python) = find_python() else {
        println!("No python interpreter on PATH, skipping");
        return Ok(());
    };
    let dir = tempfile::tempdir()?;

    let req = ScriptRequest::new("import sys\nprint('|'.join(sys.argv[1:]))")
        .interpreter_path(python)
        .arguments(vec!["--x".into(), "1".into(), "hello world".into()]);
    let res = run_with(&req, &opts_in(dir.path()), &TokioLauncher).await?;

    assert_eq!(res.stdout.trim_end(), "--x|1|hello world");
    Ok(())
}

#[tokio::test]
async fn test_module_path_is_importable() -> Result<()> {
    let Some(python) = find_python() else {
        println!("No python interpreter on PATH, skipping");
        return Ok(());
    };
    let scripts = tempfile::tempdir()?;
    let modules = tempfile::tempdir()?;
    fs::write(modules.path().join("greeting.py"), "WORD = 'hello from module'\n")?;

    let req = ScriptRequest::new("import greeting\nprint(greeting.WORD)")
        .interpreter_path(python)
        .module_path(modules.path().to_string_lossy());
    let res = run_with(&req, &opts_in(scripts.path()), &TokioLauncher).await?;

    assert_eq!(res.stdout.trim_end(), "hello from module");
    assert_eq!(leftover_files(scripts.path()), 0);
    Ok(())
}

#[tokio::test]
async fn test_script_error_carries_stderr() -> Result<()> {
    let Some(python) = find_python() else {
        println!("No python interpreter on PATH, skipping");
        return Ok(());
    };
    let dir = tempfile::tempdir()?;

    let req = ScriptRequest::new("print('partial')\n1 / 0").interpreter_path(python);
    let err = run_with(&req, &opts_in(dir.path()), &TokioLauncher)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(err.to_string().contains("ZeroDivisionError"), "got: {err}");
    assert_eq!(leftover_files(dir.path()), 0);
    Ok(())
}

#[tokio::test]
async fn test_timeout_kills_and_cleans_up() -> Result<()> {
    let Some(python) = find_python() else {
        println!("No python interpreter on PATH, skipping");
        return Ok(());
    };
    let dir = tempfile::tempdir()?;

    let req = ScriptRequest::new("import time\ntime.sleep(30)").interpreter_path(python);
    let opts = RunOptions { timeout: Some(Duration::from_millis(300)), ..opts_in(dir.path()) };
    let err = run_with(&req, &opts, &TokioLauncher).await.unwrap_err();

    assert!(matches!(err, RunError::Timeout(_)));
    assert_eq!(leftover_files(dir.path()), 0);
    Ok(())
}

#[tokio::test]
async fn test_bad_interpreter_is_spawn_error() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let req = ScriptRequest::new("print(1)").interpreter_path("no-such-python-binary-91c2");
    let err = run_with(&req, &opts_in(dir.path()), &TokioLauncher)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Spawn { .. }), "got {err:?}");
    assert_eq!(leftover_files(dir.path()), 0);
    Ok(())
}

#[tokio::test]
async fn test_node_runs_with_split_arguments() -> Result<()> {
    let Some(python) = find_python() else {
        println!("No python interpreter on PATH, skipping");
        return Ok(());
    };
    let dir = tempfile::tempdir()?;

    let data = NodeData {
        arguments: "a b c".into(),
        python_path: python.into(),
        ..Default::default()
    };
    let mut inputs = NodeInputs::new();
    inputs.insert(
        "code".into(),
        InputValue::String("import sys\nprint(len(sys.argv) - 1)".into()),
    );
    let ctx = NodeContext { run: opts_in(dir.path()), ..Default::default() };

    let out = node::process(&data, &inputs, Executor::Native, &ctx, &TokioLauncher).await?;
    assert_eq!(out.output.trim_end(), "3");
    Ok(())
}
