//! Core library for localtools.
//!
//! Downloads platform-specific archives into a shared cache, unpacks them
//! into a project-local directory and records what was installed so that an
//! unchanged tool set is a no-op on the next run.
//!
//! # Layout of a target directory
//!
//! ```text
//! <target>/
//! ├── bin/
//! │   ├── local-env.sh   # generated environment script
//! │   └── ...            # raw executables and symlinks
//! ├── ...                # unpacked packages
//! └── .manifest          # sorted identities of the installed set
//! ```

pub mod envscript;
pub mod host;
pub mod installable;
pub mod io;
pub mod manifest;
pub mod ops;
pub mod paths;

pub mod reporter;

#[cfg(test)]
mod testing;

pub use host::{HostContext, HostError};
pub use installable::{BoxedInstallable, Installable, InstallableExt};
pub use ops::{Context, InstallError, InstallOutcome, InstallSettings, Installer, install_to};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("localtools/", env!("CARGO_PKG_VERSION"));
