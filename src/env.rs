use std::env;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\}|\$(?P<bare>[A-Za-z_][A-Za-z0-9_]*)|%(?P<win>[A-Za-z_][A-Za-z0-9_]*)%")
        .expect("environment reference pattern is valid")
});

/// Expands `$VAR`, `${VAR}`, `%VAR%` and a leading `~`. Unset variables are kept verbatim.
pub fn replace_env_vars(input: &str) -> String {
    replace_with(input, |name| env::var(name).ok())
}

fn replace_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let expanded = ENV_REF.replace_all(input, |caps: &Captures| {
        let name = caps
            .name("braced")
            .or_else(|| caps.name("bare"))
            .or_else(|| caps.name("win"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        lookup(name).unwrap_or_else(|| caps[0].to_string())
    });

    match expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            match lookup("HOME") {
                Some(home) => format!("{home}{rest}"),
                None => expanded.into_owned(),
            }
        }
        _ => expanded.into_owned(),
    }
}
