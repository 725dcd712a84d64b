//! Installation operations: shared context, error taxonomy and the
//! orchestrator.

pub mod context;
pub mod error;
pub mod install;

pub use context::{Context, InstallSettings};
pub use error::InstallError;
pub use install::{InstallOutcome, Installer, install_to};
