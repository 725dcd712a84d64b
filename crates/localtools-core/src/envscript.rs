//! Environment script generation (`bin/local-env.sh`).
//!
//! Variable and alias lines are sorted so the script is stable across runs
//! regardless of install order. PATH entries keep the order in which the
//! installables supplied them and go on one trailing line. That line is
//! double-quoted only when a directory contains shell-special characters.

use std::path::{Path, PathBuf};

use localtools_schema::EnvAction;
use tracing::debug;

use crate::installable::Installable;
use crate::{io, paths};

/// Render the environment script for `installs` evaluated against `target`.
pub fn compose<I: Installable>(installs: &[I], target: &Path) -> String {
    let mut lines = Vec::new();
    let mut path_dirs: Vec<PathBuf> = Vec::new();

    for action in installs.iter().flat_map(|i| i.environment(target)) {
        match action {
            EnvAction::SetVariable { name, value } => {
                lines.push(format!("export {name}={}\n", single_quote(&value)));
            }
            EnvAction::SetAlias { command, expansion } => {
                lines.push(format!("alias {command}={}\n", single_quote(&expansion)));
            }
            EnvAction::AddToPath { directory } => path_dirs.push(directory),
        }
    }

    lines.sort();
    if !path_dirs.is_empty() {
        let dirs: Vec<_> = path_dirs.iter().map(|d| d.to_string_lossy()).collect();
        if dirs.iter().any(|d| needs_quoting(d)) {
            let joined = dirs
                .iter()
                .map(|d| double_quote_escape(d))
                .collect::<Vec<_>>()
                .join(":");
            lines.push(format!("export PATH=\"{joined}:$PATH\"\n"));
        } else {
            lines.push(format!("export PATH={}:$PATH\n", dirs.join(":")));
        }
    }
    lines.concat()
}

/// Compose and write `<target>/bin/local-env.sh`, returning its path.
pub async fn write<I: Installable>(installs: &[I], target: &Path) -> std::io::Result<PathBuf> {
    let script = compose(installs, target);
    let path = paths::env_script_path(target);
    io::write_atomic(&path, script.as_bytes()).await?;
    debug!("wrote {}", path.display());
    Ok(path)
}

/// Wrap `value` in single quotes, escaping embedded quotes as `'\''`.
fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

const SHELL_SPECIAL: &[char] = &[
    '"', '\'', '\\', '$', '`', ';', '&', '|', '<', '>', '(', ')', '*', '?', '[', '#', '~', '!',
];

fn needs_quoting(dir: &str) -> bool {
    dir.chars()
        .any(|c| c.is_whitespace() || SHELL_SPECIAL.contains(&c))
}

/// Escape the characters that stay special inside double quotes.
fn double_quote_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
