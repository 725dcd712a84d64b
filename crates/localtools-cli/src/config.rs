//! The `localtools.toml` tool list.
//!
//! ```toml
//! [tools]
//! nodejs = "18.16.0"
//! pnpm = { version = "8.1.1", aliases = { pn = "pnpm" }, env = { PNPM_FOO = "1" } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use localtools_core::{BoxedInstallable, InstallableExt};
use localtools_packages::CatalogError;
use localtools_schema::{EnvAction, Platform};
use serde::Deserialize;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "localtools.toml";

/// A parsed `localtools.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Catalog name to tool entry.
    #[serde(default)]
    pub tools: BTreeMap<String, ToolSpec>,
}

/// One `[tools]` entry: a bare version or a table with extras.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    /// `name = "1.2.3"`
    Version(String),
    /// `name = { version = "1.2.3", ... }`
    Detailed {
        /// Version passed to the catalog function.
        version: String,
        /// Extra shell aliases, command to expansion.
        #[serde(default)]
        aliases: BTreeMap<String, String>,
        /// Extra environment variables.
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

impl ToolSpec {
    /// The requested version.
    pub fn version(&self) -> &str {
        match self {
            Self::Version(v) | Self::Detailed { version: v, .. } => v,
        }
    }

    /// Variables then aliases declared for this tool.
    pub fn extra_env(&self) -> Vec<EnvAction> {
        match self {
            Self::Version(_) => Vec::new(),
            Self::Detailed { aliases, env, .. } => env
                .iter()
                .map(|(name, value)| EnvAction::set_variable(name, value))
                .chain(
                    aliases
                        .iter()
                        .map(|(cmd, expansion)| EnvAction::set_alias(cmd, expansion)),
                )
                .collect(),
        }
    }
}

impl Config {
    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Resolve every tool for `platform`, in name order.
    ///
    /// Extra variables and aliases are layered on with `with_env`, which
    /// leaves the identity (and so the manifest) unchanged.
    pub fn resolve(&self, platform: Platform) -> Result<Vec<BoxedInstallable>, CatalogError> {
        self.tools
            .iter()
            .map(|(name, spec)| {
                let install = localtools_packages::resolve(name, spec.version(), platform)?;
                let extra = spec.extra_env();
                if extra.is_empty() {
                    return Ok(install);
                }
                Ok(install.with_env(move |_| extra.clone()).boxed())
            })
            .collect()
    }
}
