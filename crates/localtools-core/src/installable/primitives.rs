//! Download-and-place primitives the catalog is built from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use localtools_schema::{DownloadSpec, TarCompression};
use tracing::info;

use super::Installable;
use crate::io::extract;
use crate::ops::{Context, InstallError};
use crate::paths;

/// A single raw executable copied to `<target>/bin/<name>`.
#[derive(Debug, Clone)]
pub struct BinaryInstall {
    spec: DownloadSpec,
    binary_name: String,
}

/// Downloads a single raw executable as `<target>/bin/<binary_name>`.
pub fn binary_install(spec: DownloadSpec, binary_name: impl Into<String>) -> BinaryInstall {
    BinaryInstall {
        spec,
        binary_name: binary_name.into(),
    }
}

#[async_trait]
impl Installable for BinaryInstall {
    fn identity(&self) -> &str {
        &self.spec.cache_key
    }

    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        let src = ctx.fetch(&self.spec).await?;
        let bin = paths::bin_dir(target);
        tokio::fs::create_dir_all(&bin).await?;

        let dest = bin.join(&self.binary_name);
        // Replace rather than write through an existing symlink.
        match tokio::fs::remove_file(&dest).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        tokio::fs::copy(&src, &dest).await?;
        extract::make_executable(&dest).await?;
        info!("copied binary {}", src.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar(TarCompression),
    Pkg,
}

/// An archive unpacked under the target directory.
#[derive(Debug, Clone)]
pub struct ArchiveInstall {
    spec: DownloadSpec,
    kind: ArchiveKind,
    rel_dir: Option<PathBuf>,
}

impl ArchiveInstall {
    /// Where the archive is unpacked for a given target.
    pub fn destination(&self, target: &Path) -> PathBuf {
        paths::under(target, self.rel_dir.as_deref())
    }
}

/// Downloads a zip whose entries land directly in `<target>/bin`.
pub fn zipped_binary_install(spec: DownloadSpec) -> ArchiveInstall {
    ArchiveInstall {
        spec,
        kind: ArchiveKind::Zip,
        rel_dir: Some(PathBuf::from("bin")),
    }
}

/// Downloads a zip unpacked into `<target>` or `<target>/<rel_dir>`,
/// keeping the archive's own layout.
pub fn zipped_package_install(spec: DownloadSpec, rel_dir: Option<&str>) -> ArchiveInstall {
    ArchiveInstall {
        spec,
        kind: ArchiveKind::Zip,
        rel_dir: rel_dir.map(PathBuf::from),
    }
}

/// Tar analogue of [`zipped_package_install`].
pub fn tar_package_install(
    spec: DownloadSpec,
    compression: TarCompression,
    rel_dir: Option<&str>,
) -> ArchiveInstall {
    ArchiveInstall {
        spec,
        kind: ArchiveKind::Tar(compression),
        rel_dir: rel_dir.map(PathBuf::from),
    }
}

/// macOS installer package relocated into `<target>` or `<target>/<rel_dir>`.
pub fn pkg_package_install(spec: DownloadSpec, rel_dir: Option<&str>) -> ArchiveInstall {
    ArchiveInstall {
        spec,
        kind: ArchiveKind::Pkg,
        rel_dir: rel_dir.map(PathBuf::from),
    }
}

#[async_trait]
impl Installable for ArchiveInstall {
    fn identity(&self) -> &str {
        &self.spec.cache_key
    }

    async fn install(&self, ctx: &Context, target: &Path) -> Result<(), InstallError> {
        let archive = ctx.fetch(&self.spec).await?;
        let dest = self.destination(target);
        ctx.reporter.extracting(&archive, &dest);

        match self.kind {
            ArchiveKind::Zip => extract::unzip(&archive, &dest).await?,
            ArchiveKind::Tar(compression) => extract::untar(&archive, &dest, compression).await?,
            ArchiveKind::Pkg => {
                extract::unpackage(&archive, &dest, ctx.settings.process_timeout).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use mockito::Server;
    use tempfile::TempDir;

    #[test]
    fn test_identity_is_cache_key() {
        let spec = DownloadSpec::new("https://x/t", "t-v1");
        assert_eq!(binary_install(spec.clone(), "t").identity(), "t-v1");
        assert_eq!(zipped_binary_install(spec.clone()).identity(), "t-v1");
        assert_eq!(
            tar_package_install(spec, TarCompression::Gzip, None).identity(),
            "t-v1"
        );
    }

    #[test]
    fn test_destinations() {
        let spec = DownloadSpec::new("https://x/p.zip", "p.zip");
        let target = Path::new("/tmp/proj");
        assert_eq!(
            zipped_binary_install(spec.clone()).destination(target),
            PathBuf::from("/tmp/proj/bin")
        );
        assert_eq!(
            zipped_package_install(spec.clone(), None).destination(target),
            PathBuf::from("/tmp/proj")
        );
        assert_eq!(
            tar_package_install(spec.clone(), TarCompression::Gzip, Some("taskfile"))
                .destination(target),
            PathBuf::from("/tmp/proj/taskfile")
        );
        assert_eq!(
            pkg_package_install(spec, Some("lib")).destination(target),
            PathBuf::from("/tmp/proj/lib")
        );
    }

    #[test]
    fn test_primitives_have_no_environment() {
        let spec = DownloadSpec::new("https://x/p.zip", "p.zip");
        assert!(
            zipped_package_install(spec.clone(), None)
                .environment(Path::new("/p"))
                .is_empty()
        );
        assert!(binary_install(spec, "p").environment(Path::new("/p")).is_empty());
    }

    #[tokio::test]
    async fn test_binary_install_creates_bin_and_sets_mode() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/t-v1")
            .with_body("#!/bin/sh\necho t\n")
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let ctx = testing::context(&tmp.path().join("cache"));
        let target = tmp.path().join("proj");

        let t = binary_install(DownloadSpec::new(format!("{}/t-v1", server.url()), "t-v1"), "t");
        t.install(&ctx, &target).await.unwrap();

        let installed = target.join("bin/t");
        assert_eq!(
            std::fs::read_to_string(&installed).unwrap(),
            "#!/bin/sh\necho t\n"
        );
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_zipped_binary_install_unpacks_into_bin() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/terraform.zip")
            .with_body(testing::zip_bytes(&[("terraform", b"tf", 0o755)]))
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let ctx = testing::context(&tmp.path().join("cache"));
        let target = tmp.path().join("proj");

        zipped_binary_install(DownloadSpec::new(
            format!("{}/terraform.zip", server.url()),
            "terraform_1.5.0_linux_amd64.zip",
        ))
        .install(&ctx, &target)
        .await
        .unwrap();

        assert_eq!(std::fs::read(target.join("bin/terraform")).unwrap(), b"tf");
    }

    #[tokio::test]
    async fn test_tar_package_install_into_rel_dir() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/act.tar.gz")
            .with_body(testing::tar_gz_bytes(&[
                ("act", b"act-binary", 0o755),
                ("README.md", b"readme", 0o644),
            ]))
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let ctx = testing::context(&tmp.path().join("cache"));
        let target = tmp.path().join("proj");

        tar_package_install(
            DownloadSpec::new(format!("{}/act.tar.gz", server.url()), "act_0.2.0.tar.gz"),
            TarCompression::Gzip,
            Some("act"),
        )
        .install(&ctx, &target)
        .await
        .unwrap();

        assert_eq!(std::fs::read(target.join("act/act")).unwrap(), b"act-binary");
        assert!(target.join("act/README.md").is_file());
    }

    #[tokio::test]
    async fn test_download_failure_propagates() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/gone.zip")
            .with_status(404)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let ctx = testing::context(&tmp.path().join("cache"));
        let err = zipped_package_install(
            DownloadSpec::new(format!("{}/gone.zip", server.url()), "gone.zip"),
            None,
        )
        .install(&ctx, &tmp.path().join("proj"))
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            InstallError::Download(crate::io::download::DownloadError::Status { status: 404, .. })
        ));
    }
}
