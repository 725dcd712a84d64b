//! Installables that run an external program to do the installing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use localtools_schema::DownloadSpec;
use tracing::info;

use super::Installable;
use crate::io::process;
use crate::ops::{Context, InstallError};

/// A self-extracting shell installer run with `--prefix=<target>/<prefix>`.
#[derive(Debug, Clone)]
pub struct ScriptInstall {
    spec: DownloadSpec,
    prefix: PathBuf,
}

/// Downloads `spec` and runs it with `/bin/bash` into `<target>/<prefix>`.
pub fn script_install(spec: DownloadSpec, prefix: impl Into<PathBuf>) -> ScriptInstall {
    ScriptInstall {
        spec,
        prefix: prefix.into(),
    }
}

impl ScriptInstall {
    fn args(script: &Path, prefix_dir: &Path) -> Vec<OsString> {
        let mut prefix = OsString::from("--prefix=");
        prefix.push(prefix_dir);
        vec![script.as_os_str().to_os_string(), prefix]
    }
}

#[async_trait]
impl Installable for ScriptInstall {
    fn identity(&self) -> &str {
        &self.spec.cache_key
    }

    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        let script = ctx.fetch(&self.spec).await?;
        info!("installing {}", self.spec.cache_key);
        let args = Self::args(&script, &target.join(&self.prefix));
        process::run("/bin/bash", &args, ctx.settings.process_timeout).await?;
        Ok(())
    }
}

/// A deno script installed as `<target>/bin/<name>`. Identified by its URL.
#[derive(Debug, Clone)]
pub struct DenoInstall {
    name: String,
    url: String,
}

/// Runs `deno install` for the script at `url` with `<target>` as root.
pub fn deno_install(name: impl Into<String>, url: impl Into<String>) -> DenoInstall {
    DenoInstall {
        name: name.into(),
        url: url.into(),
    }
}

impl DenoInstall {
    fn args(&self, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "install",
            "--quiet",
            "--allow-read",
            "--allow-write",
            "--allow-run",
            "--unstable",
            "-f",
            "--root",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(target.as_os_str().to_os_string());
        args.push("--name".into());
        args.push(self.name.as_str().into());
        args.push(self.url.as_str().into());
        args
    }
}

#[async_trait]
impl Installable for DenoInstall {
    fn identity(&self) -> &str {
        &self.url
    }

    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        info!("installing {}", self.url);
        process::run("deno", &self.args(target), ctx.settings.process_timeout).await?;
        Ok(())
    }
}
