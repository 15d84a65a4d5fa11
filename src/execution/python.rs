//! Python script staging: module-path prefix and the temporary script file.

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::RunError;

const SCRIPT_PREFIX: &str = "temp_python_script_";
const SCRIPT_SUFFIX: &str = ".py";

/// Prepend a `sys.path` insertion for `module_path` when it is non-empty.
pub fn prepare_source(code: &str, module_path: &str) -> String {
    if module_path.is_empty() {
        return code.to_string();
    }
    format!(
        "import sys\nsys.path.insert(0, \"{}\")\n{}",
        escape_py_string(module_path),
        code
    )
}

/// Escape `s` for a double-quoted Python string literal.
fn escape_py_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// The on-disk script for one invocation.
///
/// Dropping the guard removes the file; [`ScriptFile::remove`] does the same
/// but reports a failure.
#[derive(Debug)]
pub struct ScriptFile {
    path: TempPath,
}

impl ScriptFile {
    /// Create a uniquely named `.py` file in `dir` and write `source` to it.
    pub async fn create(dir: &Path, source: &str) -> Result<Self, RunError> {
        let file = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(SCRIPT_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| RunError::Write {
                path: dir.to_path_buf(),
                source: e,
            })?;
        // Close our handle so the interpreter can open the file on every platform.
        let path = file.into_temp_path();

        if let Err(e) = tokio::fs::write(path.to_path_buf(), source).await {
            return Err(RunError::Write {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> Result<(), RunError> {
        let path: PathBuf = self.path.to_path_buf();
        self.path
            .close()
            .map_err(|e| RunError::Cleanup { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_module_path_leaves_source_alone() {
        assert_eq!(prepare_source("print(1)", ""), "print(1)");
    }

    #[test]
    fn module_path_is_prepended() {
        assert_eq!(
            prepare_source("import foo", "/foo/bar"),
            "import sys\nsys.path.insert(0, \"/foo/bar\")\nimport foo"
        );
    }

    #[test]
    fn windows_paths_are_escaped() {
        let src = prepare_source("x = 1", r"C:\Users\me\lib");
        assert!(src.starts_with("import sys\nsys.path.insert(0, \"C:\\\\Users\\\\me\\\\lib\")\n"));
        assert!(src.ends_with("\nx = 1"));
    }

    #[test]
    fn quotes_in_path_are_escaped() {
        let src = prepare_source("", r#"/odd"dir"#);
        assert!(src.contains(r#"sys.path.insert(0, "/odd\"dir")"#));
    }

    #[tokio::test]
    async fn script_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let script = ScriptFile::create(dir.path(), "print('x')").await.unwrap();
        let path = script.path().to_path_buf();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(SCRIPT_PREFIX));
        assert!(name.ends_with(SCRIPT_SUFFIX));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print('x')");

        script.remove().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropped_guard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let script = ScriptFile::create(dir.path(), "pass").await.unwrap();
            script.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn names_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let a = ScriptFile::create(dir.path(), "a").await.unwrap();
        let b = ScriptFile::create(dir.path(), "b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn missing_dir_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let err = ScriptFile::create(&gone, "pass").await.unwrap_err();
        assert!(matches!(err, RunError::Write { .. }));
    }

    #[tokio::test]
    async fn remove_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = ScriptFile::create(dir.path(), "pass").await.unwrap();
        std::fs::remove_file(script.path()).unwrap();
        let err = script.remove().unwrap_err();
        assert!(matches!(err, RunError::Cleanup { .. }));
    }
}
