//! Installables: identity, an install action and the environment it needs.
//!
//! Every concrete package is one of the primitives in [`primitives`] or
//! [`exec`], optionally wrapped with [`InstallableExt::with_env`] and
//! [`InstallableExt::with_post_install`]. Download, extraction and permission
//! handling live here once; package definitions stay declarative.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use localtools_schema::EnvAction;

use crate::ops::{Context, InstallError};

pub mod decorators;
pub mod exec;
pub mod primitives;

pub use decorators::{EnsureSymlink, PostInstall, RunCommand, WithEnv, WithPostInstall};
pub use exec::{deno_install, script_install};
pub use primitives::{
    binary_install, pkg_package_install, tar_package_install, zipped_binary_install,
    zipped_package_install,
};

/// A package definition: a stable identity, an install action and the
/// environment the installed package needs.
#[async_trait]
pub trait Installable: Send + Sync + fmt::Debug {
    /// Manifest identity: name plus version, unique within an install set.
    fn identity(&self) -> &str;

    /// Materialize the package under `target`.
    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError>;

    /// Environment mutations, evaluated against `target`. Pure.
    fn environment(&self, target: &Path) -> Vec<EnvAction> {
        let _ = target;
        Vec::new()
    }
}

/// Type-erased installable, as stored in catalogs and install sets.
pub type BoxedInstallable = Box<dyn Installable>;

#[async_trait]
impl<T: Installable + ?Sized> Installable for Box<T> {
    fn identity(&self) -> &str {
        (**self).identity()
    }
    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        (**self).install(ctx, target).await
    }
    fn environment(&self, target: &Path) -> Vec<EnvAction> {
        (**self).environment(target)
    }
}

#[async_trait]
impl<T: Installable + ?Sized> Installable for Arc<T> {
    fn identity(&self) -> &str {
        (**self).identity()
    }
    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        (**self).install(ctx, target).await
    }
    fn environment(&self, target: &Path) -> Vec<EnvAction> {
        (**self).environment(target)
    }
}

/// Combinators available on every installable.
pub trait InstallableExt: Installable + Sized {
    /// Same identity and install; environment is this one's followed by `env`'s.
    fn with_env<F>(self, env: F) -> WithEnv<Self, F>
    where
        F: Fn(&Path) -> Vec<EnvAction> + Send + Sync,
    {
        WithEnv::new(self, env)
    }

    /// Same identity and environment; install runs `action` after this one's.
    fn with_post_install<A: PostInstall>(self, action: A) -> WithPostInstall<Self, A> {
        WithPostInstall::new(self, action)
    }

    /// Erase the concrete type.
    fn boxed(self) -> BoxedInstallable
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: Installable> InstallableExt for T {}
