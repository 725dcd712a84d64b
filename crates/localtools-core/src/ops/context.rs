//! Shared installation context.
//!
//! Groups the state every install step needs (host facts, the download cache,
//! the reporter and the timeouts) so installables take a single argument.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use localtools_schema::DownloadSpec;
use tracing::warn;

use crate::Reporter;
use crate::host::HostContext;
use crate::io::download::{DownloadCache, DownloadError};

/// Environment variable: per-download timeout in seconds.
pub const DOWNLOAD_TIMEOUT_ENV: &str = "LOCALTOOLS_DOWNLOAD_TIMEOUT";

/// Environment variable: per-subprocess timeout in seconds.
pub const PROCESS_TIMEOUT_ENV: &str = "LOCALTOOLS_PROCESS_TIMEOUT";

/// Optional limits on each network fetch and each subprocess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSettings {
    /// Limit on each network fetch; `None` waits indefinitely.
    pub download_timeout: Option<Duration>,
    /// Limit on each installer subprocess; `None` waits indefinitely.
    pub process_timeout: Option<Duration>,
}

impl InstallSettings {
    /// Read timeouts from the host's environment snapshot. Unparseable values
    /// are ignored with a warning.
    pub fn from_host(host: &HostContext) -> Self {
        Self {
            download_timeout: secs_var(host, DOWNLOAD_TIMEOUT_ENV),
            process_timeout: secs_var(host, PROCESS_TIMEOUT_ENV),
        }
    }
}

fn secs_var(host: &HostContext, name: &str) -> Option<Duration> {
    let raw = host.var(name)?.trim();
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            warn!("ignoring {name}={raw:?}: expected a number of seconds");
            None
        }
    }
}

/// Groups common state used during installation operations.
#[derive(Clone)]
pub struct Context {
    /// Host facts captured at startup.
    pub host: Arc<HostContext>,
    /// Shared download cache rooted at the host's cache dir.
    pub cache: DownloadCache,
    /// Progress sink.
    pub reporter: Arc<dyn Reporter>,
    /// Timeouts applied to fetches and subprocesses.
    pub settings: InstallSettings,
}

impl Context {
    /// Build a context whose cache lives under `host.cache_dir()`.
    pub fn new(
        host: HostContext,
        client: reqwest::Client,
        reporter: Arc<dyn Reporter>,
        settings: InstallSettings,
    ) -> Self {
        let cache = DownloadCache::new(host.cache_dir(), client)
            .with_timeout(settings.download_timeout);
        Self {
            host: Arc::new(host),
            cache,
            reporter,
            settings,
        }
    }

    /// Fetch through the shared download cache.
    pub async fn fetch(&self, spec: &DownloadSpec) -> Result<PathBuf, DownloadError> {
        self.cache.fetch(spec, self.reporter.as_ref()).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.host.platform())
            .field("cache", &self.cache.dir())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
