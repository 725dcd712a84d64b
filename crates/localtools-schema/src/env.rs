//! Environment mutations an installed package needs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One change to the shell environment, emitted into `bin/local-env.sh`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvAction {
    /// `export NAME='value'`
    SetVariable {
        /// Variable name.
        name: String,
        /// Value, emitted single-quoted.
        value: String,
    },
    /// Prepend a directory to `PATH`.
    AddToPath {
        /// Directory to prepend.
        directory: PathBuf,
    },
    /// `alias command='expansion'`
    SetAlias {
        /// The alias name.
        command: String,
        /// What the alias expands to.
        expansion: String,
    },
}

impl EnvAction {
    /// Build a [`EnvAction::SetVariable`].
    pub fn set_variable(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SetVariable {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Build a [`EnvAction::SetVariable`] whose value is a path.
    pub fn set_path_variable(name: impl Into<String>, value: &Path) -> Self {
        Self::set_variable(name, value.to_string_lossy())
    }

    /// Build a [`EnvAction::AddToPath`].
    pub fn add_to_path(directory: impl Into<PathBuf>) -> Self {
        Self::AddToPath {
            directory: directory.into(),
        }
    }

    /// Build a [`EnvAction::SetAlias`].
    pub fn set_alias(command: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self::SetAlias {
            command: command.into(),
            expansion: expansion.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(
            EnvAction::set_variable("JAVA_HOME", "/opt/jdk"),
            EnvAction::SetVariable {
                name: "JAVA_HOME".to_string(),
                value: "/opt/jdk".to_string()
            }
        );
        assert_eq!(
            EnvAction::set_path_variable("PNPM_HOME", Path::new("/p/pnpm/bin")),
            EnvAction::set_variable("PNPM_HOME", "/p/pnpm/bin")
        );
        assert_eq!(
            EnvAction::add_to_path("/p/bin"),
            EnvAction::AddToPath {
                directory: PathBuf::from("/p/bin")
            }
        );
    }

    #[test]
    fn test_tagged_json() {
        let json = serde_json::to_string(&EnvAction::set_alias("pn", "pnpm")).unwrap();
        assert_eq!(json, r#"{"kind":"set_alias","command":"pn","expansion":"pnpm"}"#);
    }
}
