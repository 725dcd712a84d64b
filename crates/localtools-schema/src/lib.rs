//! Shared types for localtools.
//!
//! Everything here is plain data: no IO, no async. The core crate builds
//! installables out of these types and the catalog crate fills them in.

pub mod download;
pub mod env;
pub mod platform;

// Re-exports
pub use download::*;
pub use env::*;
pub use platform::*;
