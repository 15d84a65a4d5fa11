use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

use crate::execution::{RunOptions, DEFAULT_ENV_LAUNCHER, DEFAULT_INTERPRETER};

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .pyexecrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    if let Some((k, v)) = parse_line(&line) {
                        map.insert(k, v);
                    }
                }
            } else {
                tracing::warn!(path = %config_path.display(), "config file not readable, using defaults");
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Config from explicit pairs on top of the defaults. Ignores disk and env.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in pairs {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, config_path: PathBuf::new() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn python_path(&self) -> String {
        self.get("PYEXEC_PYTHON_PATH")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string())
    }

    pub fn conda_path(&self) -> String {
        self.get("PYEXEC_CONDA_PATH")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENV_LAUNCHER.to_string())
    }

    pub fn log_filter(&self) -> String {
        self.get("PYEXEC_LOG").unwrap_or_else(|| "warn".to_string())
    }

    /// Timeout of 0 or unset means wait forever.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            timeout: self
                .get_u64("PYEXEC_TIMEOUT")
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            strip_final_newline: self.get_bool("PYEXEC_STRIP_FINAL_NEWLINE"),
            script_dir: None,
        }
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (k, v) = line.split_once('=')?;
    Some((k.trim().to_string(), v.trim().to_string()))
}

fn is_config_key(k: &str) -> bool {
    k.starts_with("PYEXEC_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("pyexec").join(".pyexecrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("PYEXEC_PYTHON_PATH".into(), DEFAULT_INTERPRETER.into());
    m.insert("PYEXEC_CONDA_PATH".into(), DEFAULT_ENV_LAUNCHER.into());
    m.insert("PYEXEC_STRIP_FINAL_NEWLINE".into(), "false".into());
    m.insert("PYEXEC_LOG".into(), "warn".into());
    m
}
