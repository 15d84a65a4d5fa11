//! Utilities (argument splitting, output normalization).

use std::sync::LazyLock;

use regex::Regex;

static ARG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:[^\s"]+|"[^"]*")+"#).expect("argument token pattern is valid")
});

/// Split a command-line style string into arguments.
///
/// A token is a maximal run of non-whitespace characters and double-quoted
/// segments, so `a"b c"d` stays one token. Quotes are kept as written.
pub fn split_args(s: &str) -> Vec<String> {
    ARG_TOKEN
        .find_iter(s)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Drop a single trailing `\n` or `\r\n`.
pub fn strip_final_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}
