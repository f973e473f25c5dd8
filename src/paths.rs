use regex::{Captures, Regex};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+|\{[^}]*\})").expect("valid variable regex"));

/// Expands `$NAME` / `${NAME}` references, then a leading `~`.
/// Unknown variables are left as written.
#[must_use]
pub fn expand(input: &str) -> PathBuf {
    let with_vars = expand_vars(input, |name| env::var(name).ok());
    expand_home(&with_vars, env::var("HOME").ok().as_deref())
}

fn expand_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains('$') {
        return input.to_string();
    }

    VAR_PATTERN
        .replace_all(input, |caps: &Captures| {
            let raw = &caps[1];
            let name = raw
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .unwrap_or(raw);
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn expand_home(input: &str, home: Option<&str>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(input);
    };

    if input == "~" {
        PathBuf::from(home)
    } else if let Some(rest) = input.strip_prefix("~/") {
        Path::new(home).join(rest)
    } else {
        PathBuf::from(input)
    }
}

/// Turns raw user input into a search root.
///
/// Empty input selects `cwd`. Anything else is expanded and accepted only if it
/// names an existing directory.
#[must_use]
pub fn resolve_root(input: &str, cwd: &Path) -> Option<PathBuf> {
    let input = input.trim();
    let candidate = if input.is_empty() {
        cwd.to_path_buf()
    } else {
        expand(input)
    };

    if candidate.is_dir() {
        Some(candidate)
    } else {
        log::debug!("rejected search root {}", candidate.display());
        None
    }
}
