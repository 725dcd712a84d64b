//! The package catalog.
//!
//! Each package is a function from a version string to either one
//! installable (platform independent tools) or a per-platform map of them.
//! Everything here is composition of the `localtools-core` primitives.

pub mod cloud;
pub mod runtimes;
pub mod tooling;

use localtools_core::BoxedInstallable;
use localtools_schema::{MultiPlatform, Platform, PlatformError};
use thiserror::Error;

pub use cloud::{adl, aws_vault, awscli, foundry, gcloud, pulumi, terraform};
pub use runtimes::{adoptopenjdk, bun, deno, nodejs, pnpm, yarn};
pub use tooling::{act, bazel, dnit, gradle, lefthook, taskfile};

/// Errors resolving a package from the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No catalog function with that name.
    #[error("Unknown package '{name}' (known: {})", NAMES.join(", "))]
    UnknownPackage {
        /// The requested name.
        name: String,
    },

    /// The package has no variant for the platform.
    #[error("{name} {version}: {source}")]
    Platform {
        /// Package name.
        name: String,
        /// Requested version.
        version: String,
        /// Resolution failure.
        #[source]
        source: PlatformError,
    },
}

/// A catalog entry for one package version.
#[derive(Debug)]
pub enum CatalogEntry {
    /// The same installable on every platform.
    Universal(BoxedInstallable),
    /// Platform-specific variants.
    PerPlatform(MultiPlatform<BoxedInstallable>),
}

impl CatalogEntry {
    /// Pick the installable for `platform`, with the Apple Silicon fallback.
    pub fn resolve(self, platform: Platform) -> Result<BoxedInstallable, PlatformError> {
        match self {
            Self::Universal(install) => Ok(install),
            Self::PerPlatform(variants) => variants.resolve(platform),
        }
    }
}

impl From<BoxedInstallable> for CatalogEntry {
    fn from(install: BoxedInstallable) -> Self {
        Self::Universal(install)
    }
}

impl From<MultiPlatform<BoxedInstallable>> for CatalogEntry {
    fn from(variants: MultiPlatform<BoxedInstallable>) -> Self {
        Self::PerPlatform(variants)
    }
}

/// Package names accepted by [`lookup`].
pub const NAMES: &[&str] = &[
    "act",
    "adl",
    "adoptopenjdk",
    "aws-vault",
    "awscli",
    "bazel",
    "bun",
    "deno",
    "dnit",
    "foundry",
    "gcloud",
    "gradle",
    "lefthook",
    "nodejs",
    "pnpm",
    "pulumi",
    "taskfile",
    "terraform",
    "yarn",
];

/// Build the catalog entry for `name` at `version`.
///
/// Underscores and hyphens are interchangeable in names (`aws_vault`).
pub fn lookup(name: &str, version: &str) -> Option<CatalogEntry> {
    let entry: CatalogEntry = match name.replace('_', "-").as_str() {
        "act" => act(version).into(),
        "adl" => adl(version).into(),
        "adoptopenjdk" => adoptopenjdk(version).into(),
        "aws-vault" => aws_vault(version).into(),
        "awscli" => awscli(version).into(),
        "bazel" => bazel(version).into(),
        "bun" => bun(version).into(),
        "deno" => deno(version).into(),
        "dnit" => dnit(version).into(),
        "foundry" => foundry(version).into(),
        "gcloud" => gcloud(version).into(),
        "gradle" => gradle(version).into(),
        "lefthook" => lefthook(version).into(),
        "nodejs" => nodejs(version).into(),
        "pnpm" => pnpm(version).into(),
        "pulumi" => pulumi(version).into(),
        "taskfile" => taskfile(version).into(),
        "terraform" => terraform(version).into(),
        "yarn" => yarn(version).into(),
        _ => return None,
    };
    Some(entry)
}

/// Look up `name` at `version` and resolve it for `platform`.
pub fn resolve(
    name: &str,
    version: &str,
    platform: Platform,
) -> Result<BoxedInstallable, CatalogError> {
    lookup(name, version)
        .ok_or_else(|| CatalogError::UnknownPackage {
            name: name.to_string(),
        })?
        .resolve(platform)
        .map_err(|source| CatalogError::Platform {
            name: name.to_string(),
            version: version.to_string(),
            source,
        })
}
