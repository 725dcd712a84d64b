//! Wrappers that extend an installable without changing its identity.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use localtools_schema::EnvAction;
use tracing::debug;

use super::Installable;
use crate::io::process;
use crate::ops::{Context, InstallError};

/// Adds environment actions after the inner installable's own.
pub struct WithEnv<I, F> {
    inner: I,
    env: F,
}

impl<I, F> WithEnv<I, F> {
    /// Wrap `inner`; see [`InstallableExt::with_env`](super::InstallableExt::with_env).
    pub fn new(inner: I, env: F) -> Self {
        Self { inner, env }
    }
}

impl<I: fmt::Debug, F> fmt::Debug for WithEnv<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithEnv")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<I, F> Installable for WithEnv<I, F>
where
    I: Installable,
    F: Fn(&Path) -> Vec<EnvAction> + Send + Sync,
{
    fn identity(&self) -> &str {
        self.inner.identity()
    }

    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        self.inner.install(ctx, target).await
    }

    fn environment(&self, target: &Path) -> Vec<EnvAction> {
        let mut actions = self.inner.environment(target);
        actions.extend((self.env)(target));
        actions
    }
}

/// A step run after an installable's own install action.
#[async_trait]
pub trait PostInstall: Send + Sync + fmt::Debug {
    /// Run against the freshly installed `target`.
    async fn run(&self, ctx: &Context, target: &Path) -> Result<(), InstallError>;
}

/// Runs `action` once the inner install has succeeded.
#[derive(Debug)]
pub struct WithPostInstall<I, A> {
    inner: I,
    action: A,
}

impl<I, A> WithPostInstall<I, A> {
    /// Wrap `inner`; see [`InstallableExt::with_post_install`](super::InstallableExt::with_post_install).
    pub fn new(inner: I, action: A) -> Self {
        Self { inner, action }
    }
}

#[async_trait]
impl<I: Installable, A: PostInstall> Installable for WithPostInstall<I, A> {
    fn identity(&self) -> &str {
        self.inner.identity()
    }

    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        self.inner.install(ctx, target).await?;
        self.action.run(ctx, target).await
    }

    fn environment(&self, target: &Path) -> Vec<EnvAction> {
        self.inner.environment(target)
    }
}

/// Create or replace the symlink `<target>/<link>` pointing at
/// `<target>/<points_to>`.
#[derive(Debug, Clone)]
pub struct EnsureSymlink {
    link: PathBuf,
    points_to: PathBuf,
}

impl EnsureSymlink {
    /// Both paths are relative to the target directory.
    pub fn new(link: impl Into<PathBuf>, points_to: impl Into<PathBuf>) -> Self {
        Self {
            link: link.into(),
            points_to: points_to.into(),
        }
    }
}

#[async_trait]
impl PostInstall for EnsureSymlink {
    async fn run(&self, _ctx: &Context, target: &Path) -> Result<(), InstallError> {
        let link = target.join(&self.link);
        let points_to = target.join(&self.points_to);

        if let Some(parent) = link.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::symlink_metadata(&link).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                if tokio::fs::read_link(&link).await? == points_to {
                    return Ok(());
                }
                tokio::fs::remove_file(&link).await?;
            }
            Ok(meta) if meta.is_dir() => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("{} exists and is a directory", link.display()),
                )
                .into());
            }
            Ok(_) => tokio::fs::remove_file(&link).await?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        debug!("linking {} -> {}", link.display(), points_to.display());
        symlink(&points_to, &link).await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(original, link).await
}

#[cfg(not(unix))]
async fn symlink(_original: &Path, link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("cannot create symlink {} on this platform", link.display()),
    ))
}

/// Run a command after install. Each `{target}` in an argument is replaced
/// with the target directory.
#[derive(Debug, Clone)]
pub struct RunCommand {
    program: String,
    args: Vec<String>,
}

impl RunCommand {
    /// `program` is looked up on `PATH` unless it contains a slash.
    pub fn new<S: Into<String>>(program: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn resolved_args(&self, target: &Path) -> Vec<String> {
        let target = target.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{target}", &target))
            .collect()
    }
}

#[async_trait]
impl PostInstall for RunCommand {
    async fn run(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        let args = self.resolved_args(target);
        process::run(&self.program, &args, ctx.settings.process_timeout).await?;
        Ok(())
    }
}
