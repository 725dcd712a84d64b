//! Domain-specific errors for installation operations

use localtools_schema::PlatformError;
use thiserror::Error;

use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;
use crate::io::process::InstallerError;

/// Any failure of an install pass.
#[derive(Error, Debug)]
pub enum InstallError {
    /// No variant for the host platform.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Fetching an artifact failed.
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// Unpacking an artifact failed.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// An installer script or post-install command failed.
    #[error(transparent)]
    Installer(#[from] InstallerError),

    /// Filesystem failure outside the above (bin dir, env script, manifest).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `source` raised while installing the installable `identity`.
    #[error("Failed to install {identity}: {source}")]
    Context {
        /// Identity of the failing installable.
        identity: String,
        /// The underlying failure.
        #[source]
        source: Box<InstallError>,
    },
}

impl InstallError {
    /// Attach the identity of the installable that failed.
    pub fn context(self, identity: impl Into<String>) -> Self {
        Self::Context {
            identity: identity.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_identity() {
        let err = InstallError::from(DownloadError::Status {
            url: "https://x/t-v1".into(),
            status: 404,
        })
        .context("t-v1");

        assert_eq!(
            err.to_string(),
            "Failed to install t-v1: Download failed: error fetching https://x/t-v1: HTTP status 404"
        );
        let InstallError::Context { identity, source } = err else {
            panic!("expected identity context");
        };
        assert_eq!(identity, "t-v1");
        assert!(matches!(
            *source,
            InstallError::Download(DownloadError::Status { status: 404, .. })
        ));
    }
}
