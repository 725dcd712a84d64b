//! Host facts captured once per process.
//!
//! Nothing in the core reads process-global state (environment variables,
//! host detection) directly. [`HostContext::detect`] snapshots it at startup
//! and the snapshot is passed by reference from then on, so tests can build
//! a context for any platform and any environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use localtools_schema::{Platform, PlatformError};

use crate::paths;

/// Errors building a [`HostContext`].
#[derive(thiserror::Error, Debug)]
pub enum HostError {
    /// The host is not a supported platform.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Neither a cache override nor a home directory is available.
    #[error("Could not determine a cache directory: $HOME not defined (set {})", paths::CACHE_DIR_ENV)]
    NoCacheDir,
}

/// Detected platform, cache root and environment snapshot.
#[derive(Debug, Clone)]
pub struct HostContext {
    platform: Platform,
    cache_dir: PathBuf,
    env: HashMap<String, String>,
}

impl HostContext {
    /// Snapshot the running process.
    pub fn detect() -> Result<Self, HostError> {
        let platform = Platform::detect()?;
        Self::from_env(platform, std::env::vars().collect())
    }

    /// Build a context from an explicit platform and environment snapshot.
    pub fn from_env(platform: Platform, env: HashMap<String, String>) -> Result<Self, HostError> {
        let cache_dir = paths::cache_root(platform, |k| env.get(k).map(String::as_str))
            .ok_or(HostError::NoCacheDir)?;
        Ok(Self {
            platform,
            cache_dir,
            env,
        })
    }

    /// Replace the cache root.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// The platform packages are resolved for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Root of the shared download cache (may not exist yet).
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// A variable from the environment snapshot.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// True if `<target>/bin` is already an entry of the snapshot's `PATH`.
    pub fn local_bin_on_path(&self, target: &Path) -> bool {
        let bin = paths::bin_dir(target);
        self.var("PATH")
            .is_some_and(|path| std::env::split_paths(path).any(|entry| entry == bin))
    }
}
