//! Installation orchestration.
//!
//! [`install_to`] is the entry point: skip everything when the manifest says
//! the requested set is already installed, otherwise run every install in
//! order and commit by writing the environment script and then the manifest.
//! Any failure aborts the pass before the commit, so the next run retries
//! the whole set.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::installable::Installable;
use crate::ops::{Context, InstallError};
use crate::{envscript, manifest, paths};

/// What an install pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The manifest matched; nothing was touched.
    UpToDate,
    /// Every installable ran and the target was committed.
    Installed {
        /// Number of installables that ran.
        count: usize,
    },
}

/// Runs install passes against a shared [`Context`].
#[derive(Debug, Clone, Copy)]
pub struct Installer<'a> {
    ctx: &'a Context,
    force: bool,
}

impl<'a> Installer<'a> {
    /// An installer that skips up-to-date targets.
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx, force: false }
    }

    /// Reinstall even when the manifest matches.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Install `installs` into `target` unless already up to date.
    pub async fn install_to<I: Installable>(
        &self,
        installs: &[I],
        target: &Path,
    ) -> Result<InstallOutcome, InstallError> {
        let reporter = &self.ctx.reporter;

        if !self.force && manifest::is_up_to_date(installs, target).await {
            info!("{} is up to date ({} tools)", target.display(), installs.len());
            reporter.up_to_date(installs.len());
            return Ok(InstallOutcome::UpToDate);
        }

        warn_duplicates(installs);

        let start = Instant::now();
        reporter.starting(installs.len());
        tokio::fs::create_dir_all(paths::bin_dir(target)).await?;

        for install in installs {
            let identity = install.identity();
            reporter.installing(identity);
            install
                .install(self.ctx, target)
                .await
                .map_err(|e| e.context(identity))?;
            reporter.installed(identity);
        }

        let script = envscript::write(installs, target).await?;
        info!("wrote {}", script.display());
        manifest::write(installs, target).await?;

        reporter.summary(installs.len(), start.elapsed().as_secs_f64());
        Ok(InstallOutcome::Installed {
            count: installs.len(),
        })
    }
}

/// Install `installs` into `target` unless the manifest says they already are.
pub async fn install_to<I: Installable>(
    ctx: &Context,
    installs: &[I],
    target: &Path,
) -> Result<InstallOutcome, InstallError> {
    Installer::new(ctx).install_to(installs, target).await
}

fn warn_duplicates<I: Installable>(installs: &[I]) {
    let ids = manifest::identities(installs);
    for pair in ids.windows(2) {
        if pair[0] == pair[1] {
            warn!("{} is requested more than once", pair[0]);
        }
    }
}
