//! local-setup - install a project's tools into a local directory
//!
//! Reads the tool list from `localtools.toml`, resolves each tool for the
//! host platform and installs the set into `LOCALDIR`:
//!
//! ```text
//! LOCALDIR/
//! ├── bin/
//! │   ├── local-env.sh   # source this
//! │   └── ...            # executables and symlinks
//! ├── ...                # unpacked packages
//! └── .manifest          # identities of the installed set
//! ```
//!
//! A second run with an unchanged tool list does nothing.

pub mod config;
pub mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use localtools_core::{
    Context, HostContext, InstallOutcome, InstallSettings, Installer, NullReporter, Reporter,
    manifest, paths,
};
use localtools_schema::Platform;
use tracing::debug;

use crate::config::{Config, DEFAULT_CONFIG};
use crate::ui::ConsoleReporter;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "local-setup")]
#[command(author, version, about = "Install a project's tools into a local directory")]
pub struct Cli {
    /// Directory to install into
    #[arg(value_name = "LOCALDIR")]
    pub localdir: PathBuf,

    /// Tool list to install
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Reinstall even if the directory is up to date
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Resolve the tool list and report what would happen
    #[arg(long)]
    pub dry_run: bool,

    /// Resolve packages for this platform instead of the host's
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Per-download timeout in seconds (0 disables) [env: `LOCALTOOLS_DOWNLOAD_TIMEOUT`]
    #[arg(long, value_name = "SECS")]
    pub download_timeout: Option<u64>,

    /// Per-subprocess timeout in seconds (0 disables) [env: `LOCALTOOLS_PROCESS_TIMEOUT`]
    #[arg(long, value_name = "SECS")]
    pub process_timeout: Option<u64>,

    /// Suppress progress output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also show cache hits and extraction steps
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn settings(&self, host: &HostContext) -> InstallSettings {
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        let defaults = InstallSettings::from_host(host);
        InstallSettings {
            download_timeout: self.download_timeout.map_or(defaults.download_timeout, secs),
            process_timeout: self.process_timeout.map_or(defaults.process_timeout, secs),
        }
    }

    fn reporter(&self) -> Arc<dyn Reporter> {
        if self.quiet {
            Arc::new(NullReporter)
        } else {
            Arc::new(ConsoleReporter::new(self.verbose))
        }
    }
}

fn detect_host(platform: Option<Platform>) -> Result<HostContext> {
    let host = match platform {
        Some(platform) => HostContext::from_env(platform, std::env::vars().collect()),
        None => HostContext::detect(),
    };
    host.context("Failed to inspect the host")
}

/// Run one `local-setup` invocation.
pub async fn run(cli: Cli) -> Result<()> {
    let host = detect_host(cli.platform)?;
    let target = std::path::absolute(&cli.localdir)
        .with_context(|| format!("Invalid directory {}", cli.localdir.display()))?;
    debug!(platform = %host.platform(), target = %target.display(), "starting");

    let config = Config::load(&cli.config)?;
    let installs = config
        .resolve(host.platform())
        .with_context(|| format!("Failed to resolve tools from {}", cli.config.display()))?;

    if cli.dry_run {
        return dry_run(&installs, &target, cli.force).await;
    }

    let settings = cli.settings(&host);
    let client = reqwest::Client::builder()
        .user_agent(localtools_core::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;
    let on_path = host.local_bin_on_path(&target);
    let ctx = Context::new(host, client, cli.reporter(), settings);

    let outcome = Installer::new(&ctx)
        .force(cli.force)
        .install_to(&installs, &target)
        .await?;
    debug!(?outcome, "finished");

    if !on_path && !cli.quiet {
        print_path_hint(&target);
    }
    Ok(())
}

async fn dry_run(
    installs: &[localtools_core::BoxedInstallable],
    target: &Path,
    force: bool,
) -> Result<()> {
    let outcome = if !force && manifest::is_up_to_date(installs, target).await {
        InstallOutcome::UpToDate
    } else {
        InstallOutcome::Installed {
            count: installs.len(),
        }
    };

    match outcome {
        InstallOutcome::UpToDate => {
            println!("{} is up to date", target.display());
        }
        InstallOutcome::Installed { count } => {
            println!("Would install {count} tools into {}:", target.display());
            for id in manifest::identities(installs) {
                println!("  {id}");
            }
        }
    }
    Ok(())
}

fn print_path_hint(target: &Path) {
    println!();
    println!(
        "{} is not on PATH. Add the tools to your shell with:",
        paths::bin_dir(target).display()
    );
    println!("  source {}", paths::env_script_path(target).display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["local-setup", "./local"]).unwrap();
        assert_eq!(cli.localdir, PathBuf::from("./local"));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG));
        assert!(!cli.force);
        assert!(!cli.dry_run);
        assert_eq!(cli.platform, None);
    }

    #[test]
    fn test_parse_platform_and_timeouts() {
        let cli = Cli::try_parse_from([
            "local-setup",
            "out",
            "--platform",
            "darwin-arm64",
            "--download-timeout",
            "30",
            "--process-timeout",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.platform, Some(Platform::DarwinAarch64));

        let host = HostContext::from_env(
            Platform::DarwinAarch64,
            [("HOME".to_string(), "/h".to_string())].into(),
        )
        .unwrap();
        let settings = cli.settings(&host);
        assert_eq!(settings.download_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.process_timeout, None);
    }

    #[test]
    fn test_rejects_unknown_platform() {
        assert!(Cli::try_parse_from(["local-setup", "out", "--platform", "windows"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["local-setup", "out", "-q", "-v"]).is_err());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("local");
        let config = Config::parse("[tools]\nyarn = \"1.22.19\"").unwrap();
        let installs = config.resolve(Platform::LinuxX86_64).unwrap();

        dry_run(&installs, &target, false).await.unwrap();
        assert!(!target.exists());
    }
}
