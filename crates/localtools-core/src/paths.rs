//! Filesystem layout of a target directory and of the download cache.

use std::path::{Path, PathBuf};

use localtools_schema::Platform;

/// Name of the per-user cache subdirectory.
pub const CACHE_DIR_NAME: &str = "localtools";

/// Environment variable overriding the download cache location.
pub const CACHE_DIR_ENV: &str = "LOCALTOOLS_CACHE_DIR";

/// Executables and symlinks: `<target>/bin`
pub fn bin_dir(target: &Path) -> PathBuf {
    target.join("bin")
}

/// Generated shell environment: `<target>/bin/local-env.sh`
pub fn env_script_path(target: &Path) -> PathBuf {
    bin_dir(target).join("local-env.sh")
}

/// Installed identity list: `<target>/.manifest`
pub fn manifest_path(target: &Path) -> PathBuf {
    target.join(".manifest")
}

/// Join an optional relative subdirectory onto the target directory.
pub fn under(target: &Path, rel_dir: Option<&Path>) -> PathBuf {
    match rel_dir {
        Some(rel) => target.join(rel),
        None => target.to_path_buf(),
    }
}

/// OS-conventional download cache root for `platform`.
///
/// `lookup` reads the environment snapshot. Resolution order:
/// `LOCALTOOLS_CACHE_DIR`, then `~/Library/Caches/localtools` on macOS or
/// `$XDG_CACHE_HOME/localtools` / `~/.cache/localtools` on Linux. The home
/// directory comes from `HOME`, falling back to the OS account database.
///
/// Returns `None` when no home directory can be determined.
pub fn cache_root<'a, F>(platform: Platform, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<&'a str>,
{
    if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }

    let home = lookup("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir);

    match platform {
        Platform::DarwinX86_64 | Platform::DarwinAarch64 => {
            home.map(|h| h.join("Library/Caches").join(CACHE_DIR_NAME))
        }
        Platform::LinuxX86_64 => lookup("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home.map(|h| h.join(".cache")))
            .map(|c| c.join(CACHE_DIR_NAME)),
    }
}
